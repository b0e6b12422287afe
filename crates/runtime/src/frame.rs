/// Coalesces redundant render requests into one draw per frame.
///
/// A pending flag, not a queue: any number of triggers within the same
/// frame (toggle + zoom tick + fetch completion) collapse into a single
/// render at the next frame boundary.
#[derive(Debug, Default)]
pub struct FrameCoalescer {
    pending: bool,
}

impl FrameCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a render on the next frame. Returns true if this call
    /// scheduled it (false if one was already pending).
    pub fn request(&mut self) -> bool {
        let newly = !self.pending;
        self.pending = true;
        newly
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending flag at a frame boundary. Returns true exactly
    /// once per scheduled render.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}
