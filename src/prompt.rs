use serde::{Deserialize, Serialize};

/// A problem as supplied by a problem source: the engine treats `text` as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub text: String,
}

impl Problem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
        }
    }
}

/// The immutable target character sequence for the current problem.
///
/// Every space, tab and newline is kept as an ordinary member of the
/// sequence. Replacing the problem means building a new `Prompt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    id: String,
    title: String,
    chars: Vec<char>,
}

impl Prompt {
    pub fn new(problem: &Problem) -> Self {
        Self {
            id: problem.id.clone(),
            title: problem.title.clone(),
            chars: problem.text.chars().collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}
