#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<(f64, f64)> for TimeSeriesPoint {
    fn from(v: (f64, f64)) -> Self {
        TimeSeriesPoint { t: v.0, wpm: v.1 }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// Live wpm sampled after each accepted keystroke, for the results chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WpmTrace {
    points: Vec<TimeSeriesPoint>,
}

impl WpmTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples with no elapsed time are dropped; wpm is undefined there.
    pub fn record(&mut self, elapsed_ms: u64, wpm: u32) {
        if elapsed_ms == 0 {
            return;
        }
        self.points
            .push(TimeSeriesPoint::new(elapsed_ms as f64 / 1000.0, wpm as f64));
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn as_tuples(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|&p| p.into()).collect()
    }
}
