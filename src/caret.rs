use crate::layout::CellRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretMotion {
    /// Snap to the target; used after any geometry rebuild.
    Instant,
    /// Slide to the target over the caret animation duration.
    Animated,
}

/// Visual caret. Its position is derived from the cached geometry only.
#[derive(Debug, Clone, PartialEq)]
pub struct Caret {
    from: (f32, f32),
    target: CellRect,
    started_ms: u64,
    /// Length of the current motion; zero once settled or after an instant move.
    motion_ms: u64,
    duration_ms: u64,
}

impl Caret {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            from: (0.0, 0.0),
            target: CellRect::default(),
            started_ms: 0,
            motion_ms: 0,
            duration_ms,
        }
    }

    pub fn place(&mut self, target: CellRect, motion: CaretMotion, now_ms: u64) {
        self.from = match motion {
            CaretMotion::Instant => (target.x as f32, target.y as f32),
            CaretMotion::Animated => self.exact_position(now_ms),
        };
        self.target = target;
        self.started_ms = now_ms;
        self.motion_ms = match motion {
            CaretMotion::Instant => 0,
            CaretMotion::Animated => self.duration_ms,
        };
    }

    pub fn target(&self) -> CellRect {
        self.target
    }

    pub fn is_animating(&self, now_ms: u64) -> bool {
        self.progress(now_ms) < 1.0
    }

    /// Cell the caret occupies at `now_ms`.
    pub fn position(&self, now_ms: u64) -> (u16, u16) {
        let (x, y) = self.exact_position(now_ms);
        (x.round().max(0.0) as u16, y.round().max(0.0) as u16)
    }

    fn progress(&self, now_ms: u64) -> f32 {
        if self.motion_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.started_ms);
        (elapsed as f32 / self.motion_ms as f32).min(1.0)
    }

    fn exact_position(&self, now_ms: u64) -> (f32, f32) {
        let t = self.progress(now_ms);
        // ease-out cubic
        let eased = 1.0 - (1.0 - t).powi(3);
        let (tx, ty) = (self.target.x as f32, self.target.y as f32);
        (
            self.from.0 + (tx - self.from.0) * eased,
            self.from.1 + (ty - self.from.1) * eased,
        )
    }
}

/// Scrollable window over the wrapped prompt rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
    pub scroll_top: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            scroll_top: 0,
        }
    }

    /// Scrolls the least amount that makes `rect` fully visible.
    pub fn scroll_into_view(&mut self, rect: CellRect) {
        if self.height == 0 {
            return;
        }
        if rect.y < self.scroll_top {
            self.scroll_top = rect.y;
        } else if rect.bottom() > self.scroll_top.saturating_add(self.height) {
            self.scroll_top = rect.bottom().saturating_sub(self.height);
        }
    }

    pub fn contains_row(&self, row: u16) -> bool {
        row >= self.scroll_top && row < self.scroll_top.saturating_add(self.height)
    }
}
