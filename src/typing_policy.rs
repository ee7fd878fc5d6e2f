use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::prompt::Prompt;
use crate::session::{SessionState, Verdict};

/// What to do with keystrokes that arrive once the caret sits past the last character.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OverflowPolicy {
    #[default]
    Ignore,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(Verdict),
    Overflow,
}

/// Writes one character at the caret. Never extends the verdict array.
pub fn write_char(
    state: &mut SessionState,
    prompt: &Prompt,
    c: char,
    overflow: OverflowPolicy,
) -> WriteOutcome {
    let Some(expected) = prompt.char_at(state.position) else {
        if overflow == OverflowPolicy::Count {
            state.overflow_count += 1;
        }
        return WriteOutcome::Overflow;
    };

    let verdict = if c == expected {
        Verdict::Correct(c)
    } else {
        Verdict::Incorrect(c)
    };
    state.verdicts[state.position] = verdict;
    state.position += 1;
    WriteOutcome::Written(verdict)
}

/// Steps the caret back one position, clearing what was typed there.
pub fn erase_char(state: &mut SessionState) -> Option<usize> {
    if state.position == 0 {
        return None;
    }
    state.position -= 1;
    state.verdicts[state.position] = Verdict::Untyped;
    Some(state.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Problem;

    fn prompt(text: &str) -> Prompt {
        Prompt::new(&Problem::new("t", "t", text))
    }

    #[test]
    fn test_write_correct_and_incorrect() {
        let p = prompt("ab");
        let mut state = SessionState::new(p.len());

        assert_eq!(
            write_char(&mut state, &p, 'a', OverflowPolicy::Ignore),
            WriteOutcome::Written(Verdict::Correct('a'))
        );
        assert_eq!(
            write_char(&mut state, &p, 'x', OverflowPolicy::Ignore),
            WriteOutcome::Written(Verdict::Incorrect('x'))
        );
        assert_eq!(state.position, 2);
        assert_eq!(state.raw_text(), "ax");
    }

    #[test]
    fn test_overflow_ignored_by_default() {
        let p = prompt("a");
        let mut state = SessionState::new(p.len());
        write_char(&mut state, &p, 'a', OverflowPolicy::Ignore);

        let outcome = write_char(&mut state, &p, 'b', OverflowPolicy::Ignore);

        assert_eq!(outcome, WriteOutcome::Overflow);
        assert_eq!(state.position, 1);
        assert_eq!(state.verdicts.len(), 1);
        assert_eq!(state.overflow_count, 0);
    }

    #[test]
    fn test_overflow_counted_when_asked() {
        let p = prompt("");
        let mut state = SessionState::new(0);

        write_char(&mut state, &p, 'z', OverflowPolicy::Count);
        write_char(&mut state, &p, 'z', OverflowPolicy::Count);

        assert_eq!(state.overflow_count, 2);
        assert_eq!(state.position, 0);
        assert!(state.is_consistent());
    }

    #[test]
    fn test_erase_char() {
        let p = prompt("ab");
        let mut state = SessionState::new(p.len());
        assert_eq!(erase_char(&mut state), None);

        write_char(&mut state, &p, 'a', OverflowPolicy::Ignore);
        assert_eq!(erase_char(&mut state), Some(0));
        assert_eq!(state, SessionState::new(2));
    }

    #[test]
    fn test_overflow_policy_display() {
        assert_eq!(OverflowPolicy::Ignore.to_string(), "ignore");
        assert_eq!(OverflowPolicy::Count.to_string(), "count");
    }
}
