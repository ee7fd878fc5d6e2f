use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::SubmitError;
use crate::metrics::AttemptRecord;
use crate::store::{RecordStore, StoredAttempt};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// How long shutdown waits for in-flight submissions; outlasts the HTTP timeout
/// so a failing post still gets logged.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(11);

const FLUSH_POLL: Duration = Duration::from_millis(10);

/// Engine-facing submission collaborator. Fire-and-forget: the engine never
/// learns the outcome.
pub trait AttemptSink {
    fn submit_attempt(&self, attempt: &AttemptRecord);

    /// Waits up to `timeout` for submissions still in flight and returns how
    /// many were left unfinished. Called once on shutdown.
    fn flush(&self, _timeout: Duration) -> usize {
        0
    }
}

/// Blocking transport that actually stores an attempt somewhere.
pub trait AttemptClient: Send + Sync + 'static {
    fn post_attempt(&self, attempt: &AttemptRecord) -> Result<StoredAttempt, SubmitError>;
}

/// `POST {base_url}/api/attempts`
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    success: bool,
    attempt: Option<StoredAttempt>,
    #[serde(default, alias = "message")]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "message")]
    error: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Result<Self, SubmitError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/attempts", self.base_url)
    }
}

impl AttemptClient for HttpClient {
    fn post_attempt(&self, attempt: &AttemptRecord) -> Result<StoredAttempt, SubmitError> {
        let resp = self.client.post(self.endpoint()).json(attempt).send()?;
        let status = resp.status();

        if status == StatusCode::BAD_REQUEST {
            let body: ErrorBody = resp.json().unwrap_or_default();
            return Err(SubmitError::Rejected(
                body.error.unwrap_or_else(|| "validation failed".to_string()),
            ));
        }
        if !status.is_success() {
            return Err(SubmitError::Status(status.as_u16()));
        }

        let body: SubmitResponse = resp.json()?;
        match body {
            SubmitResponse {
                success: true,
                attempt: Some(stored),
                ..
            } => Ok(stored),
            SubmitResponse { error, .. } => Err(SubmitError::Rejected(
                error.unwrap_or_else(|| "server did not accept the attempt".to_string()),
            )),
        }
    }
}

/// Appends attempts to the local flat record store.
#[derive(Debug, Clone)]
pub struct LocalClient {
    path: PathBuf,
    // serializes read-modify-write cycles across submission threads
    lock: Arc<Mutex<()>>,
}

impl LocalClient {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Arc::new(Mutex::new(())),
        }
    }
}

impl AttemptClient for LocalClient {
    fn post_attempt(&self, attempt: &AttemptRecord) -> Result<StoredAttempt, SubmitError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut store = RecordStore::open_or_recover(&self.path)?;
        Ok(store.add_attempt(attempt.clone())?)
    }
}

/// Runs each submission on its own thread and logs the outcome. No retries.
pub struct BackgroundSink<C: AttemptClient> {
    client: Arc<C>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<C: AttemptClient> BackgroundSink<C> {
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn spawn(&self, attempt: &AttemptRecord) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let attempt = attempt.clone();
        thread::spawn(move || match client.post_attempt(&attempt) {
            Ok(stored) => info!(
                id = stored.id,
                problem = %stored.attempt.problem_id,
                wpm = stored.attempt.wpm,
                "attempt submitted"
            ),
            Err(e) => warn!(
                error = %e,
                problem = %attempt.problem_id,
                "attempt submission failed"
            ),
        })
    }
}

impl<C: AttemptClient> AttemptSink for BackgroundSink<C> {
    fn submit_attempt(&self, attempt: &AttemptRecord) {
        let handle = self.spawn(attempt);
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    fn flush(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        while pending.iter().any(|h| !h.is_finished()) && Instant::now() < deadline {
            thread::sleep(FLUSH_POLL);
        }

        let (done, running): (Vec<_>, Vec<_>) = pending.drain(..).partition(|h| h.is_finished());
        for handle in done {
            if handle.join().is_err() {
                warn!("attempt submission thread panicked");
            }
        }
        if !running.is_empty() {
            warn!(
                count = running.len(),
                "attempt submissions still running at shutdown, abandoning them"
            );
        }
        running.len()
    }
}

/// Used when auto-submission is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AttemptSink for NullSink {
    fn submit_attempt(&self, attempt: &AttemptRecord) {
        debug!(problem = %attempt.problem_id, "auto-submit disabled, attempt not sent");
    }
}

/// Collects attempts in memory; clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    attempts: Arc<Mutex<Vec<AttemptRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> Vec<AttemptRecord> {
        self.attempts
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.attempts.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttemptSink for MemorySink {
    fn submit_attempt(&self, attempt: &AttemptRecord) {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(attempt.clone());
        }
    }
}
