//! Progress reporting for chunked operations

/// Operation a progress report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Normal read
    Reading,
    /// Page program
    Writing,
    /// Sector/block erase
    Erasing,
    /// Read-back compare
    Verifying,
    /// Bitstream upload
    Loading,
}

impl Phase {
    /// Human-readable name
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Reading => "Reading",
            Phase::Writing => "Writing",
            Phase::Erasing => "Erasing",
            Phase::Verifying => "Verifying",
            Phase::Loading => "Loading",
        }
    }
}

/// Callback for progress reporting
pub trait Progress {
    /// Called when an operation over `total_bytes` starts
    fn begin(&mut self, phase: Phase, total_bytes: u32);

    /// Called after each chunk with the bytes completed so far
    fn advance(&mut self, done_bytes: u32);

    /// Called when the operation completed
    fn end(&mut self);
}

/// A no-op progress reporter
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn begin(&mut self, _phase: Phase, _total_bytes: u32) {}
    fn advance(&mut self, _done_bytes: u32) {}
    fn end(&mut self) {}
}
