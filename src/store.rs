//! Flat JSON record store: `{problems, attempts}` in a single file.
//!
//! This is the on-disk format the attempts backend uses. It doubles as the
//! local submission target when no server is configured.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::metrics::AttemptRecord;
use crate::prompt::Problem;

pub const LEADERBOARD_SIZE: usize = 50;

/// Speeds above this are treated as implausible and refused.
pub const MAX_PLAUSIBLE_WPM: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAttempt {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub attempt: AttemptRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordData {
    #[serde(default)]
    pub problems: Vec<Problem>,
    #[serde(default)]
    pub attempts: Vec<StoredAttempt>,
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    data: RecordData,
}

impl RecordStore {
    /// Opens the store at `path`; a missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RecordData::default(),
            Err(e) => return Err(e.into()),
        };
        debug!(
            path = %path.display(),
            problems = data.problems.len(),
            attempts = data.attempts.len(),
            "record store opened"
        );
        Ok(Self { path, data })
    }

    /// Like [`RecordStore::open`], but an unreadable file is moved aside to
    /// `<name>.corrupt` and replaced by an empty store.
    pub fn open_or_recover<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        match Self::open(path) {
            Err(StoreError::Json(e)) => {
                let aside = sidecar(path, "corrupt");
                warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "record store is corrupt, starting a new one"
                );
                fs::rename(path, &aside)?;
                Ok(Self {
                    path: path.to_path_buf(),
                    data: RecordData::default(),
                })
            }
            other => other,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn problems(&self) -> &[Problem] {
        &self.data.problems
    }

    pub fn problem(&self, id: &str) -> StoreResult<&Problem> {
        self.data
            .problems
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::UnknownProblem(id.to_string()))
    }

    pub fn attempts(&self) -> &[StoredAttempt] {
        &self.data.attempts
    }

    pub fn add_problem(&mut self, problem: Problem) -> StoreResult<()> {
        if problem.id.trim().is_empty() {
            return Err(StoreError::Validation("problem id is required".into()));
        }
        self.data.problems.retain(|p| p.id != problem.id);
        self.data.problems.push(problem);
        self.save()
    }

    /// Validates, stamps and persists a finished attempt.
    pub fn add_attempt(&mut self, attempt: AttemptRecord) -> StoreResult<StoredAttempt> {
        validate(&attempt)?;

        let id = self.data.attempts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let stored = StoredAttempt {
            id,
            created_at: Utc::now(),
            attempt,
        };
        self.data.attempts.push(stored.clone());
        self.save()?;
        Ok(stored)
    }

    /// Top attempts for a problem: wpm descending, ties by accuracy descending.
    pub fn leaderboard(&self, problem_id: &str) -> Vec<&StoredAttempt> {
        self.data
            .attempts
            .iter()
            .filter(|a| a.attempt.problem_id == problem_id)
            .sorted_by(|a, b| {
                b.attempt
                    .wpm
                    .cmp(&a.attempt.wpm)
                    .then(b.attempt.accuracy.cmp(&a.attempt.accuracy))
            })
            .take(LEADERBOARD_SIZE)
            .collect()
    }

    fn save(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // write-then-rename so a crash mid-write leaves the old file intact
        let tmp = sidecar(&self.path, "tmp");
        let data = serde_json::to_vec_pretty(&self.data)?;
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

pub fn validate(attempt: &AttemptRecord) -> StoreResult<()> {
    if attempt.user.trim().is_empty() {
        return Err(StoreError::Validation("user is required".into()));
    }
    if attempt.problem_id.trim().is_empty() {
        return Err(StoreError::Validation("problemId is required".into()));
    }
    if attempt.accuracy > 100 {
        return Err(StoreError::Validation(format!(
            "accuracy {} is out of range",
            attempt.accuracy
        )));
    }
    if attempt.wpm > MAX_PLAUSIBLE_WPM {
        return Err(StoreError::Validation(format!(
            "{} wpm exceeds the plausible maximum of {}",
            attempt.wpm, MAX_PLAUSIBLE_WPM
        )));
    }
    Ok(())
}
