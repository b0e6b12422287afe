/// How the current viewport's annotations are represented on screen.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// Density bins / clusters; used when zoomed out.
    Aggregated,
    /// Exact per-feature geometry; used when zoomed in.
    Individual,
}

/// Default mode cutover on the zoom scale where 1 = fit-to-screen.
pub const DEFAULT_MODE_THRESHOLD: f64 = 7.0;

/// Maps continuous zoom to a discrete rendering mode.
///
/// The cutover is hard (no hysteresis band); rapid oscillation around the
/// threshold is expected input, and callers keep re-fetch idempotent for
/// identical bounds+zoom keys.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomPolicy {
    pub threshold: f64,
}

impl ZoomPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Pure function of the zoom value alone.
    pub fn select_mode(&self, zoom: f64) -> RenderMode {
        if zoom <= self.threshold {
            RenderMode::Aggregated
        } else {
            RenderMode::Individual
        }
    }
}

impl Default for ZoomPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MODE_THRESHOLD,
        }
    }
}
