//! Execution envelope shared by every filter.
//!
//! A [`FilterTask`] owns an input buffer and one [`Filter`], runs it on the
//! calling thread (or a dedicated worker via [`FilterTask::spawn`]), and
//! reports percent-complete through a [`ProgressSink`]. Cancellation is
//! cooperative: filters call [`Progress::check`] at the top of every row.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, trace};

use crate::buffer::PixelBuffer;
use crate::error::{FilterError, FilterResult};

// =============================================================================
// Cancellation
// =============================================================================

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Progress reporting
// =============================================================================

/// Receiver of progress notifications.
pub trait ProgressSink: Send {
    /// Called with a multiple of 5 each time a new threshold is crossed.
    fn progress(&mut self, percent: u8);

    /// Called once when a run ends.
    fn finished(&mut self, _success: bool) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(u8) + Send,
{
    fn progress(&mut self, percent: u8) {
        self(percent)
    }
}

/// Sink that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn progress(&mut self, _percent: u8) {}
}

/// Per-run progress and cancellation handle passed into [`Filter::apply`].
pub struct Progress<'a> {
    cancel: CancelToken,
    sink: Option<&'a mut dyn ProgressSink>,
    counter: Option<Arc<AtomicU8>>,
    last: u8,
}

impl<'a> Progress<'a> {
    /// Progress reporting into `sink`, cancelled through `cancel`.
    pub fn new(cancel: CancelToken, sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            cancel,
            sink: Some(sink),
            counter: None,
            last: 0,
        }
    }

    /// Progress that nobody observes and that can never be cancelled.
    pub fn unobserved() -> Progress<'static> {
        Progress {
            cancel: CancelToken::new(),
            sink: None,
            counter: None,
            last: 0,
        }
    }

    /// Progress without a sink that still honors `cancel`.
    pub fn with_cancel(cancel: CancelToken) -> Progress<'static> {
        Progress {
            cancel,
            sink: None,
            counter: None,
            last: 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail with [`FilterError::Cancelled`] once cancellation was requested.
    #[inline]
    pub fn check(&self) -> FilterResult<()> {
        if self.cancel.is_cancelled() {
            Err(FilterError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Record that `done` of `total` units are finished.
    ///
    /// Emits the completed percentage rounded to the nearest multiple of 5,
    /// at most once per value.
    pub fn update(&mut self, done: u64, total: u64) {
        if total == 0 {
            return;
        }
        let (done, total) = (done.min(total) as u128, total as u128);
        let step = ((done * 40 + total) / (2 * total) * 5) as u8;
        if step <= self.last {
            return;
        }
        self.last = step;
        if let Some(counter) = &self.counter {
            counter.store(step, Ordering::Relaxed);
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.progress(step);
        }
    }

    /// Last emitted percentage.
    pub fn percent(&self) -> u8 {
        self.last
    }
}

// =============================================================================
// Filters and tasks
// =============================================================================

/// A buffer-to-buffer operation that reports progress and honors cancellation.
pub trait Filter: Send + Sync {
    /// Short name used in logs and worker thread names.
    fn name(&self) -> &'static str;

    /// Produce a new buffer from `src`. `src` is never modified.
    fn apply(&self, src: &PixelBuffer, progress: &mut Progress<'_>) -> FilterResult<PixelBuffer>;
}

/// Result of one [`FilterTask::run`].
#[derive(Debug)]
pub enum FilterOutcome {
    Completed(PixelBuffer),
    /// Cancelled before completion; no buffer is exposed.
    Cancelled,
    Failed(FilterError),
}

impl FilterOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FilterOutcome::Completed(_))
    }

    /// Convert into a `Result`, mapping cancellation to [`FilterError::Cancelled`].
    pub fn into_result(self) -> FilterResult<PixelBuffer> {
        match self {
            FilterOutcome::Completed(buffer) => Ok(buffer),
            FilterOutcome::Cancelled => Err(FilterError::Cancelled),
            FilterOutcome::Failed(err) => Err(err),
        }
    }
}

/// Handle for observing or cancelling a task from another thread.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    cancel: CancelToken,
    percent: Arc<AtomicU8>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn progress(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }
}

/// One filter invocation over one input buffer.
pub struct FilterTask {
    input: PixelBuffer,
    filter: Box<dyn Filter>,
    sink: Box<dyn ProgressSink>,
    cancel: CancelToken,
    percent: Arc<AtomicU8>,
}

impl FilterTask {
    pub fn new(input: PixelBuffer, filter: impl Filter + 'static) -> Self {
        Self {
            input,
            filter: Box::new(filter),
            sink: Box::new(NoopSink),
            cancel: CancelToken::new(),
            percent: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Route progress notifications to `sink`.
    pub fn with_sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Share an existing cancellation flag.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn handle(&self) -> TaskHandle {
        TaskHandle {
            cancel: self.cancel.clone(),
            percent: Arc::clone(&self.percent),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Last reported percentage.
    pub fn progress(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }

    /// Run the filter on the calling thread.
    pub fn run(&mut self) -> FilterOutcome {
        self.percent.store(0, Ordering::Relaxed);
        debug!(
            filter = self.filter.name(),
            width = self.input.width(),
            height = self.input.height(),
            "filter task started"
        );

        let outcome = if self.cancel.is_cancelled() {
            FilterOutcome::Cancelled
        } else {
            let sink: &mut dyn ProgressSink = self.sink.as_mut();
            let mut progress = Progress {
                cancel: self.cancel.clone(),
                sink: Some(sink),
                counter: Some(Arc::clone(&self.percent)),
                last: 0,
            };
            match self.filter.apply(&self.input, &mut progress) {
                // A cancel that lands after the last row check still wins.
                Ok(_) if self.cancel.is_cancelled() => FilterOutcome::Cancelled,
                Ok(output) => FilterOutcome::Completed(output),
                Err(FilterError::Cancelled) => FilterOutcome::Cancelled,
                Err(err) => FilterOutcome::Failed(err),
            }
        };

        let success = outcome.is_success();
        trace!(filter = self.filter.name(), success, "filter task finished");
        self.sink.finished(success);
        outcome
    }

    /// Run the filter on a dedicated worker thread.
    pub fn spawn(mut self) -> FilterResult<JoinHandle<FilterOutcome>> {
        let handle = std::thread::Builder::new()
            .name(format!("pixfx-{}", self.filter.name()))
            .spawn(move || self.run())?;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BitDepth, Pixel};
    use std::sync::Mutex;

    /// Copies rows one at a time, optionally cancelling itself at a row.
    struct RowCopy {
        cancel_at: Option<(u32, CancelToken)>,
    }

    impl Filter for RowCopy {
        fn name(&self) -> &'static str {
            "row-copy"
        }

        fn apply(&self, src: &PixelBuffer, progress: &mut Progress<'_>) -> FilterResult<PixelBuffer> {
            let mut out = src.blank_like();
            for y in 0..src.height() {
                progress.check()?;
                if let Some((row, token)) = &self.cancel_at {
                    if *row == y {
                        token.cancel();
                    }
                }
                out.row_mut(y).copy_from_slice(src.row(y));
                progress.update(y as u64 + 1, src.height() as u64);
            }
            Ok(out)
        }
    }

    fn input(height: u32) -> PixelBuffer {
        PixelBuffer::filled(4, height, BitDepth::Eight, true, Pixel::new(1, 2, 3, 255))
    }

    #[test]
    fn test_run_completes() {
        let src = input(8);
        let mut task = FilterTask::new(src.clone(), RowCopy { cancel_at: None });
        let outcome = task.run();
        assert!(outcome.is_success());
        assert_eq!(outcome.into_result().unwrap(), src);
        assert_eq!(task.progress(), 100);
    }

    #[test]
    fn test_progress_in_steps_of_five() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let mut task = FilterTask::new(input(40), RowCopy { cancel_at: None })
            .with_sink(move |p: u8| sink_seen.lock().unwrap().push(p));
        assert!(task.run().is_success());

        let seen = seen.lock().unwrap();
        let expected: Vec<u8> = (1..=20).map(|i| i * 5).collect();
        assert_eq!(*seen, expected);
    }

    #[test]
    fn test_cancel_before_run() {
        let mut task = FilterTask::new(input(4), RowCopy { cancel_at: None });
        task.cancel();
        let outcome = task.run();
        assert!(matches!(outcome, FilterOutcome::Cancelled));
        assert!(matches!(outcome.into_result(), Err(FilterError::Cancelled)));
    }

    #[test]
    fn test_cancel_mid_run() {
        let token = CancelToken::new();
        let filter = RowCopy {
            cancel_at: Some((2, token.clone())),
        };
        let mut task = FilterTask::new(input(10), filter).with_cancel_token(token);
        let outcome = task.run();
        assert!(!outcome.is_success());
        assert!(matches!(outcome, FilterOutcome::Cancelled));
        assert!(task.progress() < 100);
    }

    #[test]
    fn test_cancel_on_last_row_still_cancels() {
        let token = CancelToken::new();
        let filter = RowCopy {
            cancel_at: Some((3, token.clone())),
        };
        let mut task = FilterTask::new(input(4), filter).with_cancel_token(token);
        assert!(matches!(task.run(), FilterOutcome::Cancelled));
    }

    struct FinishedRecorder(Arc<Mutex<Vec<bool>>>);

    impl ProgressSink for FinishedRecorder {
        fn progress(&mut self, _percent: u8) {}

        fn finished(&mut self, success: bool) {
            self.0.lock().unwrap().push(success);
        }
    }

    #[test]
    fn test_finished_fires_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut task = FilterTask::new(input(3), RowCopy { cancel_at: None })
            .with_sink(FinishedRecorder(Arc::clone(&calls)));
        task.run();
        assert_eq!(*calls.lock().unwrap(), vec![true]);

        task.cancel();
        task.run();
        assert_eq!(*calls.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_spawn_on_worker_thread() {
        let src = input(6);
        let task = FilterTask::new(src.clone(), RowCopy { cancel_at: None });
        let handle = task.handle();
        let outcome = task.spawn().unwrap().join().unwrap();
        assert_eq!(outcome.into_result().unwrap(), src);
        assert_eq!(handle.progress(), 100);
    }

    #[test]
    fn test_progress_rounds_to_nearest_step() {
        let mut progress = Progress::unobserved();
        progress.update(2, 100);
        assert_eq!(progress.percent(), 0);
        progress.update(3, 100);
        assert_eq!(progress.percent(), 5);
        progress.update(97, 100);
        assert_eq!(progress.percent(), 95);
        progress.update(99, 100);
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_rerun_resets_progress() {
        let mut task = FilterTask::new(input(5), RowCopy { cancel_at: None });
        assert!(task.run().is_success());
        assert_eq!(task.progress(), 100);

        task.cancel();
        assert!(matches!(task.run(), FilterOutcome::Cancelled));
        assert_eq!(task.progress(), 0);
    }

    #[test]
    fn test_unobserved_progress_never_cancels() {
        let mut progress = Progress::unobserved();
        progress.update(1, 2);
        assert_eq!(progress.percent(), 50);
        assert!(progress.check().is_ok());
        progress.update(0, 0);
        assert_eq!(progress.percent(), 50);
    }
}
