//! Kernel-native progress reporting
//!
//! Kernel readers/writers report progress as a named step plus a position in
//! `[0, 1]`, and poll `user_break` to find out whether they should stop.

/// Progress callbacks invoked by a kernel during long operations
pub trait ProgressIndicator {
    /// Report the current step and its position in `[0, 1]`
    fn show(&mut self, step: &str, position: f64);

    /// Whether the user asked to stop the operation
    fn user_break(&self) -> bool;
}

/// A progress indicator that ignores everything and never breaks
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressIndicator for NoProgress {
    fn show(&mut self, _step: &str, _position: f64) {}

    fn user_break(&self) -> bool {
        false
    }
}
