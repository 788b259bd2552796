//! Progress reporting and cooperative cancellation for import/export

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use parking_lot::Mutex;

use cv_cad::ProgressIndicator;

/// Receiver of progress and source of cancellation requests
///
/// Readers and writers call this from worker threads, hence `Send + Sync`.
pub trait ProgressSink: Send + Sync {
    /// Name of the current step
    fn set_step(&self, label: &str);

    /// Progress of the current operation, in percent (0..=100)
    fn set_value(&self, percent: u8);

    /// Whether the operation should stop as soon as possible
    fn is_abort_requested(&self) -> bool;
}

/// A progress sink that ignores everything and never aborts
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn set_step(&self, _label: &str) {}

    fn set_value(&self, _percent: u8) {}

    fn is_abort_requested(&self) -> bool {
        false
    }
}

/// Shareable progress state, written by a worker and read by the UI thread
#[derive(Debug, Default)]
pub struct ProgressTracker {
    step: Mutex<String>,
    value: AtomicU8,
    abort: AtomicBool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the running operation to stop
    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::Release);
    }

    pub fn step(&self) -> String {
        self.step.lock().clone()
    }

    pub fn value(&self) -> u8 {
        self.value.load(Ordering::Acquire)
    }
}

impl ProgressSink for ProgressTracker {
    fn set_step(&self, label: &str) {
        *self.step.lock() = label.to_string();
    }

    fn set_value(&self, percent: u8) {
        self.value.store(percent.min(100), Ordering::Release);
    }

    fn is_abort_requested(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }
}

/// Forwards kernel-native progress callbacks to a `ProgressSink`
///
/// Kernel positions in `[0, 1]` become percents; the last step name is only
/// forwarded when it changes.
pub struct KernelProgressAdapter<'a> {
    sink: &'a dyn ProgressSink,
    last_step: String,
    last_value: Option<u8>,
}

impl<'a> KernelProgressAdapter<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            last_step: String::new(),
            last_value: None,
        }
    }
}

impl ProgressIndicator for KernelProgressAdapter<'_> {
    fn show(&mut self, step: &str, position: f64) {
        if step != self.last_step {
            self.last_step = step.to_string();
            self.sink.set_step(step);
        }

        let percent = (position.clamp(0.0, 1.0) * 100.0).round() as u8;
        if self.last_value != Some(percent) {
            self.last_value = Some(percent);
            self.sink.set_value(percent);
        }
    }

    fn user_break(&self) -> bool {
        self.sink.is_abort_requested()
    }
}

/// Tracker that requests an abort as soon as any progress is reported
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct AbortOnProgress {
    pub(crate) tracker: ProgressTracker,
}

#[cfg(test)]
impl AbortOnProgress {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl ProgressSink for AbortOnProgress {
    fn set_step(&self, label: &str) {
        self.tracker.set_step(label);
    }

    fn set_value(&self, percent: u8) {
        self.tracker.set_value(percent);
        self.tracker.request_abort();
    }

    fn is_abort_requested(&self) -> bool {
        self.tracker.is_abort_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        steps: Mutex<Vec<String>>,
        values: Mutex<Vec<u8>>,
        abort: AtomicBool,
    }

    impl ProgressSink for Recorder {
        fn set_step(&self, label: &str) {
            self.steps.lock().push(label.to_string());
        }

        fn set_value(&self, percent: u8) {
            self.values.lock().push(percent);
        }

        fn is_abort_requested(&self) -> bool {
            self.abort.load(Ordering::Acquire)
        }
    }

    #[test]
    fn test_adapter_maps_positions_to_percent() {
        let recorder = Recorder::default();
        let mut adapter = KernelProgressAdapter::new(&recorder);
        adapter.show("Transfer", 0.0);
        adapter.show("Transfer", 0.004);
        adapter.show("Transfer", 0.5);
        adapter.show("Mesh", 1.7);

        assert_eq!(*recorder.steps.lock(), vec!["Transfer", "Mesh"]);
        assert_eq!(*recorder.values.lock(), vec![0, 50, 100]);
    }

    #[test]
    fn test_adapter_user_break() {
        let recorder = Recorder::default();
        let adapter = KernelProgressAdapter::new(&recorder);
        assert!(!adapter.user_break());
        recorder.abort.store(true, Ordering::Release);
        assert!(adapter.user_break());
    }

    #[test]
    fn test_tracker() {
        let tracker = ProgressTracker::new();
        tracker.set_step("Reading");
        tracker.set_value(250);
        assert_eq!(tracker.step(), "Reading");
        assert_eq!(tracker.value(), 100);
        assert!(!tracker.is_abort_requested());
        tracker.request_abort();
        assert!(tracker.is_abort_requested());
    }
}
