use std::ops::Range;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::prompt::Prompt;
use crate::session::SessionState;
use crate::typing_policy::{erase_char, write_char, OverflowPolicy, WriteOutcome};

/// Number of spaces a Tab keystroke types.
pub const TAB_SPACES: usize = 4;

/// One logical input event, already classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Paste(String),
    Ignored,
}

impl KeyInput {
    pub fn from_key_event(key: KeyEvent) -> Self {
        if key.kind != KeyEventKind::Press {
            return KeyInput::Ignored;
        }
        match key.code {
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                KeyInput::Char(c)
            }
            KeyCode::Enter => KeyInput::Enter,
            KeyCode::Tab => KeyInput::Tab,
            KeyCode::Backspace => KeyInput::Backspace,
            KeyCode::Esc => KeyInput::Escape,
            _ => KeyInput::Ignored,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Positions `from..to` received verdicts.
    Typed { from: usize, to: usize },
    /// The verdict at `at` was cleared.
    Erased { at: usize },
    Reset,
    Overflow,
    Rejected,
    Ignored,
}

impl Transition {
    /// Positions whose rendering changed.
    pub fn changed(&self, prompt_len: usize) -> Range<usize> {
        match *self {
            Transition::Typed { from, to } => from..to,
            Transition::Erased { at } => at..at + 1,
            Transition::Reset => 0..prompt_len,
            Transition::Overflow | Transition::Rejected | Transition::Ignored => 0..0,
        }
    }

    pub fn moved_caret(&self) -> bool {
        matches!(self, Transition::Typed { .. } | Transition::Erased { .. })
    }
}

/// The input reducer: applies one logical event to the session state.
///
/// Runs synchronously and never fails; unrecognized input leaves the state untouched.
pub fn reduce(
    state: &mut SessionState,
    prompt: &Prompt,
    input: &KeyInput,
    now_ms: u64,
    overflow: OverflowPolicy,
) -> Transition {
    let transition = match input {
        KeyInput::Char(c) => type_chars(state, prompt, &[*c], overflow),
        KeyInput::Enter => type_chars(state, prompt, &['\n'], overflow),
        KeyInput::Tab => type_chars(state, prompt, &[' '; TAB_SPACES], overflow),
        KeyInput::Backspace => match erase_char(state) {
            Some(at) => Transition::Erased { at },
            None => Transition::Ignored,
        },
        KeyInput::Escape => {
            state.reset();
            Transition::Reset
        }
        KeyInput::Paste(_) => Transition::Rejected,
        KeyInput::Ignored => Transition::Ignored,
    };

    if transition.moved_caret() && state.started_at.is_none() {
        state.started_at = Some(now_ms);
    }

    debug_assert!(state.is_consistent());
    transition
}

fn type_chars(
    state: &mut SessionState,
    prompt: &Prompt,
    chars: &[char],
    overflow: OverflowPolicy,
) -> Transition {
    let from = state.position;
    for &c in chars {
        if write_char(state, prompt, c, overflow) == WriteOutcome::Overflow {
            break;
        }
    }
    if state.position == from {
        Transition::Overflow
    } else {
        Transition::Typed {
            from,
            to: state.position,
        }
    }
}
