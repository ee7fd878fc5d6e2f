//! The typing session engine.
//!
//! Key events flow through the input reducer synchronously; the visual caret
//! move they cause is queued and applied by [`Engine::frame`] on the next
//! paint. Geometry is recomputed only on load, reset and resize.

use std::time::Duration;

use tracing::{debug, info};

use crate::caret::{Caret, CaretMotion, Viewport};
use crate::clock::Clock;
use crate::input::{reduce, KeyInput, Transition};
use crate::layout::{CellRect, GeometryCache};
use crate::metrics::{AttemptRecord, LiveMetrics};
use crate::prompt::{Problem, Prompt};
use crate::session::SessionState;
use crate::submit::AttemptSink;
use crate::time_series::WpmTrace;
use crate::typing_policy::OverflowPolicy;

pub const DEFAULT_CARET_ANIMATION_MS: u64 = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub user: String,
    pub auto_submit: bool,
    pub overflow: OverflowPolicy,
    pub caret_animation_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            user: "anonymous".to_string(),
            auto_submit: true,
            overflow: OverflowPolicy::Ignore,
            caret_animation_ms: DEFAULT_CARET_ANIMATION_MS,
        }
    }
}

type CompletionCallback = Box<dyn FnMut(&AttemptRecord)>;

pub struct Engine {
    prompt: Prompt,
    state: SessionState,
    geometry: GeometryCache,
    caret: Caret,
    viewport: Viewport,
    pending_caret: Option<CaretMotion>,
    trace: WpmTrace,
    attempt: Option<AttemptRecord>,
    settings: EngineSettings,
    clock: Box<dyn Clock>,
    sink: Box<dyn AttemptSink>,
    on_complete: Option<CompletionCallback>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("prompt", &self.prompt)
            .field("state", &self.state)
            .field("viewport", &self.viewport)
            .field("attempt", &self.attempt)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(
        problem: &Problem,
        settings: EngineSettings,
        clock: Box<dyn Clock>,
        sink: Box<dyn AttemptSink>,
    ) -> Self {
        let prompt = Prompt::new(problem);
        let mut engine = Self {
            state: SessionState::new(prompt.len()),
            prompt,
            geometry: GeometryCache::new(),
            caret: Caret::new(settings.caret_animation_ms),
            viewport: Viewport::default(),
            pending_caret: None,
            trace: WpmTrace::new(),
            attempt: None,
            settings,
            clock,
            sink,
            on_complete: None,
        };
        engine.mount();
        engine
    }

    /// Registers a callback that receives the finalized attempt, right after
    /// it is handed to the submission collaborator.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&AttemptRecord) + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Replaces the prompt wholesale and starts a fresh session for it.
    pub fn load_problem(&mut self, problem: &Problem) {
        self.prompt = Prompt::new(problem);
        self.state = SessionState::new(self.prompt.len());
        self.mount();
    }

    /// Sets the prompt area size and recomputes geometry. Idempotent.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.viewport.width = width;
        self.viewport.height = height;
        self.relayout();
    }

    pub fn handle(&mut self, input: KeyInput) -> Transition {
        let now = self.clock.now_ms();
        let transition = reduce(
            &mut self.state,
            &self.prompt,
            &input,
            now,
            self.settings.overflow,
        );

        match transition {
            Transition::Reset => {
                info!(prompt = self.prompt.id(), "session reset");
                self.begin_session();
            }
            Transition::Typed { .. } => {
                self.pending_caret = Some(CaretMotion::Animated);
                let live = LiveMetrics::compute(&self.state, now);
                self.trace.record(live.elapsed_ms, live.wpm);
            }
            Transition::Erased { .. } => {
                self.pending_caret = Some(CaretMotion::Animated);
            }
            Transition::Rejected => debug!("paste rejected"),
            Transition::Overflow | Transition::Ignored => {}
        }

        self.check_completion(now);
        transition
    }

    /// Explicit reset command; same as Escape.
    pub fn reset(&mut self) -> Transition {
        self.handle(KeyInput::Escape)
    }

    /// Applies any queued caret move. Call once per paint.
    pub fn frame(&mut self) {
        if let Some(motion) = self.pending_caret.take() {
            let now = self.clock.now_ms();
            self.place_caret(motion, now);
        }
    }

    pub fn live_metrics(&self) -> LiveMetrics {
        LiveMetrics::compute(&self.state, self.clock.now_ms())
    }

    pub fn caret_position(&self) -> (u16, u16) {
        self.caret.position(self.clock.now_ms())
    }

    pub fn caret_target(&self) -> CellRect {
        self.caret.target()
    }

    pub fn is_animating(&self) -> bool {
        self.pending_caret.is_some() || self.caret.is_animating(self.clock.now_ms())
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn geometry(&self) -> &GeometryCache {
        &self.geometry
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn trace(&self) -> &WpmTrace {
        &self.trace
    }

    pub fn attempt(&self) -> Option<&AttemptRecord> {
        self.attempt.as_ref()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished
    }

    /// Gives in-flight submissions up to `timeout` to finish; returns how many
    /// were still running. Call on shutdown.
    pub fn flush_submissions(&self, timeout: Duration) -> usize {
        self.sink.flush(timeout)
    }

    fn mount(&mut self) {
        info!(
            prompt = self.prompt.id(),
            chars = self.prompt.len(),
            "prompt loaded"
        );
        self.begin_session();
        // an empty prompt is complete the moment it is shown
        let now = self.clock.now_ms();
        self.check_completion(now);
    }

    /// Shared tail of load and reset: drop per-session leftovers, then
    /// rebuild geometry for the current prompt.
    fn begin_session(&mut self) {
        self.trace.clear();
        self.attempt = None;
        self.viewport.scroll_top = 0;
        self.relayout();
    }

    fn relayout(&mut self) {
        self.geometry.rebuild(&self.prompt, self.viewport.width);
        self.pending_caret = None;
        let now = self.clock.now_ms();
        self.place_caret(CaretMotion::Instant, now);
    }

    fn place_caret(&mut self, motion: CaretMotion, now: u64) {
        let target = self.geometry.locate(self.state.position);
        self.caret.place(target, motion, now);
        self.viewport.scroll_into_view(target);
    }

    fn check_completion(&mut self, now: u64) {
        if self.state.finished || self.state.position != self.prompt.len() {
            return;
        }
        self.state.finished = true;

        let record =
            AttemptRecord::finalize(&self.settings.user, self.prompt.id(), &self.state, now);
        info!(
            prompt = %record.problem_id,
            wpm = record.wpm,
            accuracy = record.accuracy,
            duration_ms = record.duration_ms,
            "session complete"
        );

        // zero-length prompts finish with a record but are never submitted
        if self.settings.auto_submit && !self.prompt.is_empty() {
            self.sink.submit_attempt(&record);
        }
        if let Some(callback) = self.on_complete.as_mut() {
            callback(&record);
        }
        self.attempt = Some(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::Verdict;
    use crate::submit::MemorySink;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine_with(text: &str, settings: EngineSettings) -> (Engine, ManualClock, MemorySink) {
        let clock = ManualClock::new(1_000);
        let sink = MemorySink::new();
        let mut engine = Engine::new(
            &Problem::new("p1", "Test", text),
            settings,
            Box::new(clock.clone()),
            Box::new(sink.clone()),
        );
        engine.resize(40, 5);
        (engine, clock, sink)
    }

    fn engine(text: &str) -> (Engine, ManualClock, MemorySink) {
        engine_with(text, EngineSettings::default())
    }

    fn type_str(engine: &mut Engine, s: &str) {
        for c in s.chars() {
            engine.handle(KeyInput::Char(c));
        }
    }

    #[test]
    fn test_scenario_ab_typed_ac() {
        let (mut engine, _clock, sink) = engine("ab");

        engine.handle(KeyInput::Char('a'));
        assert_eq!(engine.state().position, 1);
        assert_eq!(engine.state().verdicts[0], Verdict::Correct('a'));

        engine.handle(KeyInput::Char('c'));
        assert_eq!(engine.state().verdicts[1], Verdict::Incorrect('c'));
        assert!(engine.is_finished());

        let attempt = engine.attempt().unwrap();
        assert_eq!(attempt.raw_text, "ac");
        assert_eq!(attempt.accuracy, 50);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_perfect_round_trip() {
        let text = "fn main() {\n    println!(\"hi\");\n}";
        let (mut engine, _clock, _sink) = engine(text);

        for c in text.chars() {
            let input = if c == '\n' {
                KeyInput::Enter
            } else {
                KeyInput::Char(c)
            };
            engine.handle(input);
        }

        let attempt = engine.attempt().unwrap();
        assert_eq!(attempt.accuracy, 100);
        assert_eq!(attempt.raw_text, text);
    }

    #[test]
    fn test_wpm_over_a_minute() {
        let text = "abcdefghijklmnopqrstuvwxy";
        assert_eq!(text.chars().count(), 25);
        let (mut engine, clock, _sink) = engine(text);

        engine.handle(KeyInput::Char('a'));
        clock.advance(60_000);
        type_str(&mut engine, &text[1..]);

        let attempt = engine.attempt().unwrap();
        assert_eq!(attempt.duration_ms, 60_000);
        assert_eq!(attempt.wpm, 5);
    }

    #[test]
    fn test_empty_prompt_completes_on_load_without_submitting() {
        let completed = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&completed);
        let sink = MemorySink::new();
        let engine = Engine::new(
            &Problem::new("empty", "Empty", ""),
            EngineSettings::default(),
            Box::new(ManualClock::new(0)),
            Box::new(sink.clone()),
        );
        assert!(engine.is_finished());
        let attempt = engine.attempt().unwrap();
        assert_eq!(attempt.duration_ms, 0);
        assert_eq!(attempt.accuracy, 100);
        assert_eq!(attempt.wpm, 0);
        assert!(sink.is_empty());

        let mut engine = engine.on_complete(move |a| seen.borrow_mut().push(a.clone()));
        engine.load_problem(&Problem::new("empty2", "Empty", ""));
        assert_eq!(completed.borrow().len(), 1);
        assert_eq!(completed.borrow()[0].problem_id, "empty2");
    }

    #[test]
    fn test_no_double_submission() {
        let (mut engine, _clock, sink) = engine("a");
        engine.handle(KeyInput::Char('a'));
        assert_eq!(sink.len(), 1);

        engine.handle(KeyInput::Ignored);
        engine.handle(KeyInput::Char('z'));
        engine.handle(KeyInput::Backspace);
        engine.handle(KeyInput::Char('a'));
        assert_eq!(sink.len(), 1);
        assert!(engine.is_finished());
    }

    #[test]
    fn test_auto_submit_disabled() {
        let settings = EngineSettings {
            auto_submit: false,
            ..EngineSettings::default()
        };
        let (mut engine, _clock, sink) = engine_with("a", settings);
        engine.handle(KeyInput::Char('a'));
        assert!(engine.attempt().is_some());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_callback_receives_record() {
        let seen = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&seen);
        let (engine, _clock, _sink) = engine("ok");
        let mut engine = engine.on_complete(move |a| *slot.borrow_mut() = Some(a.clone()));

        type_str(&mut engine, "ok");

        assert_eq!(seen.borrow().as_ref(), engine.attempt());
    }

    #[test]
    fn test_user_is_threaded_into_record() {
        let settings = EngineSettings {
            user: "grace".into(),
            ..EngineSettings::default()
        };
        let (mut engine, _clock, sink) = engine_with("x", settings);
        engine.handle(KeyInput::Char('x'));
        assert_eq!(sink.attempts()[0].user, "grace");
    }

    #[test]
    fn test_reset_twice_equals_once() {
        let (mut engine, _clock, _sink) = engine("hello");
        type_str(&mut engine, "hel");

        engine.reset();
        let once = engine.state().clone();
        engine.reset();

        assert_eq!(engine.state(), &once);
        assert_eq!(once, SessionState::new(5));
        assert_eq!(engine.caret_target(), engine.geometry().locate(0));
    }

    #[test]
    fn test_reset_allows_a_new_submission() {
        let (mut engine, _clock, sink) = engine("a");
        engine.handle(KeyInput::Char('a'));
        engine.handle(KeyInput::Escape);
        assert!(engine.attempt().is_none());
        engine.handle(KeyInput::Char('a'));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_caret_move_is_deferred_to_frame() {
        let (mut engine, clock, _sink) = engine("abc");
        assert_eq!(engine.caret_target(), CellRect::new(0, 0, 1, 1));

        engine.handle(KeyInput::Char('a'));
        assert_eq!(engine.state().position, 1);
        assert_eq!(engine.caret_target(), CellRect::new(0, 0, 1, 1));
        assert!(engine.is_animating());

        engine.frame();
        assert_eq!(engine.caret_target(), CellRect::new(1, 0, 1, 1));
        assert!(engine.is_animating());

        clock.advance(DEFAULT_CARET_ANIMATION_MS);
        assert!(!engine.is_animating());
        assert_eq!(engine.caret_position(), (1, 0));
    }

    #[test]
    fn test_reset_places_caret_instantly() {
        let (mut engine, _clock, _sink) = engine("abc");
        type_str(&mut engine, "ab");
        engine.frame();
        engine.reset();
        assert!(!engine.is_animating());
        assert_eq!(engine.caret_position(), (0, 0));
    }

    #[test]
    fn test_resize_rebuilds_and_scrolls() {
        let (mut engine, _clock, _sink) = engine("aaaa bbbb cccc dddd");
        type_str(&mut engine, "aaaa bbbb cccc d");
        engine.resize(5, 2);
        // one word per row: caret on row 3 needs the viewport at row 2
        assert_eq!(engine.caret_target().y, 3);
        assert_eq!(engine.viewport().scroll_top, 2);
        assert!(!engine.is_animating());
    }

    #[test]
    fn test_load_problem_replaces_session_and_geometry() {
        let (mut engine, _clock, _sink) = engine("first prompt");
        type_str(&mut engine, "first");

        engine.load_problem(&Problem::new("p2", "Second", "xy"));

        assert_eq!(engine.prompt().id(), "p2");
        assert_eq!(engine.state(), &SessionState::new(2));
        assert!(engine.geometry().is_built_for(engine.prompt()));
        assert!(engine.trace().points().is_empty());
    }

    #[test]
    fn test_live_metrics_do_not_complete() {
        let (mut engine, clock, sink) = engine("abcdef");
        type_str(&mut engine, "abc");
        clock.advance(1_000);
        let live = engine.live_metrics();
        assert_eq!(live.typed, 3);
        assert_eq!(live.accuracy, 100);
        assert!(!engine.is_finished());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_trace_records_typed_keys() {
        let (mut engine, clock, _sink) = engine("abc");
        engine.handle(KeyInput::Char('a'));
        clock.advance(500);
        engine.handle(KeyInput::Char('b'));
        assert_eq!(engine.trace().points().len(), 1);
    }

    #[test]
    fn test_paste_is_rejected() {
        let (mut engine, _clock, sink) = engine("ab");
        let t = engine.handle(KeyInput::Paste("ab".into()));
        assert_eq!(t, Transition::Rejected);
        assert_eq!(engine.state().position, 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_flush_lets_background_submission_land() {
        use crate::store::RecordStore;
        use crate::submit::{BackgroundSink, LocalClient};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let clock = ManualClock::new(0);
        let mut engine = Engine::new(
            &Problem::new("p1", "Test", "ok"),
            EngineSettings::default(),
            Box::new(clock.clone()),
            Box::new(BackgroundSink::new(LocalClient::new(path.clone()))),
        );
        engine.handle(KeyInput::Char('o'));
        clock.advance(300);
        engine.handle(KeyInput::Char('k'));
        assert!(engine.is_finished());

        assert_eq!(engine.flush_submissions(Duration::from_secs(5)), 0);
        let store = RecordStore::open(&path).unwrap();
        assert_eq!(store.attempts().len(), 1);
        assert_eq!(store.attempts()[0].attempt.raw_text, "ok");
    }
}
