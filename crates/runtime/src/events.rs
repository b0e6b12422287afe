/// Raw lifecycle events as emitted by the deep-zoom viewer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// Image metadata loaded; viewport becomes defined.
    Open,
    Pan,
    Zoom,
    AnimationStart,
    /// Per-tick animation update.
    Animation,
    AnimationFinish,
}

/// Normalized viewport-change signal.
///
/// All pan/zoom/animation noise collapses into one `Moving` edge and one
/// `Settled` edge: the renderer consumes `Moving` (busy state), the fetch
/// layer consumes `Settled`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewportSignal {
    Moving,
    Settled,
}

/// Replaces per-event handler wiring with a single dispatcher.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    moving: bool,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a raw viewer event into at most one signal.
    ///
    /// Consecutive movement events between two settles produce a single
    /// `Moving` edge.
    pub fn normalize(&mut self, event: ViewerEvent) -> Option<ViewportSignal> {
        match event {
            ViewerEvent::Open => {
                self.moving = false;
                Some(ViewportSignal::Settled)
            }
            ViewerEvent::Pan
            | ViewerEvent::Zoom
            | ViewerEvent::AnimationStart
            | ViewerEvent::Animation => {
                if self.moving {
                    return None;
                }
                self.moving = true;
                Some(ViewportSignal::Moving)
            }
            ViewerEvent::AnimationFinish => {
                self.moving = false;
                Some(ViewportSignal::Settled)
            }
        }
    }
}
