//! Geometry cache for prompt glyphs.
//!
//! The full text flow runs only from [`GeometryCache::rebuild`]: on mount, on
//! prompt replacement, on reset and on resize. Per-keystroke caret placement
//! goes through [`GeometryCache::locate`], which only reads the cache.

use tracing::debug;
use unicode_width::UnicodeWidthChar;

use crate::prompt::Prompt;

/// Columns occupied by a literal tab character in the prompt.
pub const TAB_COLUMNS: u16 = 4;

/// A rectangle in prompt-local cell coordinates (row 0 is the first wrapped line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl CellRect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }
}

/// Where the caret goes when there is nothing to measure.
pub const FALLBACK_ORIGIN: CellRect = CellRect::new(0, 0, 1, 1);

pub fn glyph_width(c: char) -> u16 {
    match c {
        '\t' => TAB_COLUMNS,
        '\n' => 1,
        c => c.width().unwrap_or(1).max(1) as u16,
    }
}

/// Lays out `chars` into lines of at most `width` columns.
///
/// Words wrap greedily; a word longer than a full line hard-breaks. A newline
/// occupies one cell at the end of its line and starts the next one.
pub fn flow(chars: &[char], width: u16) -> Vec<CellRect> {
    let mut rects = Vec::with_capacity(chars.len());
    let (mut x, mut y) = (0u16, 0u16);

    for (idx, &c) in chars.iter().enumerate() {
        let w = glyph_width(c);

        let word_start = !c.is_whitespace() && (idx == 0 || chars[idx - 1].is_whitespace());
        if word_start && x > 0 {
            let word: u16 = chars[idx..]
                .iter()
                .take_while(|c| !c.is_whitespace())
                .map(|&c| glyph_width(c))
                .fold(0u16, |acc, w| acc.saturating_add(w));
            if word <= width && x.saturating_add(word) > width {
                x = 0;
                y = y.saturating_add(1);
            }
        }

        if x > 0 && x.saturating_add(w) > width {
            x = 0;
            y = y.saturating_add(1);
        }

        rects.push(CellRect::new(x, y, w, 1));
        x = x.saturating_add(w);

        if c == '\n' {
            x = 0;
            y = y.saturating_add(1);
        }
    }

    rects
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometryCache {
    prompt_id: Option<String>,
    width: u16,
    rects: Vec<CellRect>,
    end: Option<CellRect>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes every rectangle for `prompt` flowed into `width` columns.
    ///
    /// Always a full recompute. Safe to call repeatedly; a zero width leaves
    /// the cache empty so lookups fall back to the origin.
    pub fn rebuild(&mut self, prompt: &Prompt, width: u16) {
        self.prompt_id = Some(prompt.id().to_string());
        self.width = width;

        if width == 0 {
            self.rects.clear();
            self.end = None;
            debug!(prompt = prompt.id(), "geometry rebuild skipped: zero width");
            return;
        }

        self.rects = flow(prompt.chars(), width);
        self.end = self
            .rects
            .last()
            .map(|last| CellRect::new(last.x.saturating_add(last.width), last.y, 1, last.height));

        debug!(
            prompt = prompt.id(),
            width,
            glyphs = self.rects.len(),
            rows = self.rows(),
            "geometry rebuilt"
        );
    }

    /// Rectangle of the character at `position`, or the synthesized end
    /// rectangle past the last character, or the fallback origin.
    pub fn locate(&self, position: usize) -> CellRect {
        match self.rects.get(position) {
            Some(rect) => *rect,
            None => self.end.unwrap_or(FALLBACK_ORIGIN),
        }
    }

    pub fn rect(&self, position: usize) -> Option<CellRect> {
        self.rects.get(position).copied()
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// Number of wrapped lines, including the end rectangle's row.
    pub fn rows(&self) -> u16 {
        self.end.map(|end| end.bottom()).unwrap_or(0)
    }

    pub fn is_built_for(&self, prompt: &Prompt) -> bool {
        self.prompt_id.as_deref() == Some(prompt.id()) && self.rects.len() == prompt.len()
    }
}
