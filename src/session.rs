/// Correctness of one prompt position, with the character actually typed there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Untyped,
    Correct(char),
    Incorrect(char),
}

impl Verdict {
    pub fn is_typed(&self) -> bool {
        !matches!(self, Verdict::Untyped)
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct(_))
    }

    pub fn typed_char(&self) -> Option<char> {
        match self {
            Verdict::Untyped => None,
            Verdict::Correct(c) | Verdict::Incorrect(c) => Some(*c),
        }
    }
}

/// Typing state for the prompt currently on screen.
///
/// `position` always equals the number of typed verdicts; every transition in
/// [`crate::input::reduce`] keeps the two in lockstep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub position: usize,
    pub verdicts: Vec<Verdict>,
    /// Milliseconds on the engine clock of the first accepted keystroke.
    pub started_at: Option<u64>,
    pub finished: bool,
    /// Keystrokes received at the end of the prompt, only counted under
    /// [`crate::typing_policy::OverflowPolicy::Count`].
    pub overflow_count: usize,
}

impl SessionState {
    pub fn new(prompt_len: usize) -> Self {
        Self {
            position: 0,
            verdicts: vec![Verdict::Untyped; prompt_len],
            started_at: None,
            finished: false,
            overflow_count: 0,
        }
    }

    pub fn reset(&mut self) {
        self.position = 0;
        self.verdicts.iter_mut().for_each(|v| *v = Verdict::Untyped);
        self.started_at = None;
        self.finished = false;
        self.overflow_count = 0;
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn typed_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_typed()).count()
    }

    pub fn correct_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_correct()).count()
    }

    /// The typed characters in position order.
    pub fn raw_text(&self) -> String {
        self.verdicts.iter().filter_map(Verdict::typed_char).collect()
    }

    pub fn is_consistent(&self) -> bool {
        self.position == self.typed_count()
    }
}
