//! Redraw coalescing: any number of render requests between two animation
//! frames collapse into one scheduled frame.

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;

/// Single-flight frame scheduler.
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    pending: bool,
    frames: u64,
}

impl RedrawScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a frame. Returns `true` only when the caller must actually
    /// schedule one; `false` means a frame is already on its way.
    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    /// Called from the frame callback. Returns `true` if a frame was pending.
    pub fn begin_frame(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.frames += 1;
        true
    }

    /// Drop a pending request whose frame could not be scheduled.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Frames started since creation.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
