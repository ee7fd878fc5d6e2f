use serde::{Deserialize, Serialize};

use crate::session::{SessionState, Verdict};

/// Characters per "word" in the words-per-minute formula.
pub const CHARS_PER_WORD: f64 = 5.0;

/// `round((typed / 5) / (elapsed_ms / 60000))`, or 0 when either input is zero.
pub fn words_per_minute(typed_chars: usize, elapsed_ms: u64) -> u32 {
    if typed_chars == 0 || elapsed_ms == 0 {
        return 0;
    }
    let minutes = elapsed_ms as f64 / 60_000.0;
    ((typed_chars as f64 / CHARS_PER_WORD) / minutes).round() as u32
}

/// Percentage of typed positions that are correct; 100 before anything is typed.
pub fn accuracy(verdicts: &[Verdict]) -> u32 {
    let typed = verdicts.iter().filter(|v| v.is_typed()).count();
    if typed == 0 {
        return 100;
    }
    let correct = verdicts.iter().filter(|v| v.is_correct()).count();
    (100.0 * correct as f64 / typed as f64).round() as u32
}

/// In-progress numbers for display; computing them has no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiveMetrics {
    pub wpm: u32,
    pub accuracy: u32,
    pub elapsed_ms: u64,
    pub typed: usize,
}

impl LiveMetrics {
    pub fn compute(state: &SessionState, now_ms: u64) -> Self {
        let elapsed_ms = state
            .started_at
            .map(|start| now_ms.saturating_sub(start))
            .unwrap_or(0);
        let typed = state.typed_count();
        Self {
            wpm: words_per_minute(typed, elapsed_ms),
            accuracy: accuracy(&state.verdicts),
            elapsed_ms,
            typed,
        }
    }
}

/// The finalized outcome of one completed session. Field names match the
/// attempts API body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub user: String,
    pub problem_id: String,
    pub wpm: u32,
    pub accuracy: u32,
    pub raw_text: String,
    pub duration_ms: u64,
}

impl AttemptRecord {
    pub fn finalize(user: &str, problem_id: &str, state: &SessionState, end_ms: u64) -> Self {
        let duration_ms = state
            .started_at
            .map(|start| end_ms.saturating_sub(start))
            .unwrap_or(0);
        let raw_text = state.raw_text();
        Self {
            user: user.to_string(),
            problem_id: problem_id.to_string(),
            wpm: words_per_minute(raw_text.chars().count(), duration_ms),
            accuracy: accuracy(&state.verdicts),
            raw_text,
            duration_ms,
        }
    }
}
