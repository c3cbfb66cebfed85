//! Parallel batch measurement with cooperative cancellation.
//!
//! Each instrument is an independent task: its own chip, its own curves, and
//! exclusive `&mut` access to exactly one record. Tasks are handed to a pool of
//! scoped worker threads through a channel, so no record is ever shared and no
//! locking is needed. The only shared state is the completed counter.
//!
//! Cancellation is checked between instruments only. A measurement that has
//! started always finishes and writes its result.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::chip::ChipFactory;
use crate::engine::Measurer;
use crate::patch::Instrument;

/// Shared flag requesting that a batch stop starting new instruments.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can drive another batch.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Progress snapshot reported after each finished instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Position, in iteration order, of the instrument that just finished.
    pub index: usize,
    /// Instruments finished so far.
    pub completed: usize,
    /// Instruments in the batch.
    pub total: usize,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Instruments measured and written back.
    pub completed: usize,
    /// Instruments in the batch.
    pub total: usize,
    /// At least one instrument was skipped because of cancellation.
    pub cancelled: bool,
}

impl BatchReport {
    /// True when every instrument was measured.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.completed == self.total
    }
}

/// Worker count matching the machine's available parallelism.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Applies a [`Measurer`] across many instruments.
#[derive(Debug)]
pub struct BatchRunner<F> {
    measurer: Measurer<F>,
    workers: usize,
    cancel: CancelToken,
}

impl<F: ChipFactory> BatchRunner<F> {
    /// Create a runner using all available cores.
    pub fn new(measurer: Measurer<F>) -> Self {
        Self {
            measurer,
            workers: default_workers(),
            cancel: CancelToken::new(),
        }
    }

    /// Use `workers` threads (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Observe an externally owned cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this runner's batches.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Worker thread count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Underlying single-instrument measurer.
    pub fn measurer(&self) -> &Measurer<F> {
        &self.measurer
    }

    /// Measure one instrument on the calling thread.
    ///
    /// Returns `false` without touching the instrument if cancellation was
    /// already requested.
    pub fn measure_one(&self, instrument: &mut Instrument) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.measurer.measure(instrument);
        true
    }

    /// Measure every instrument. Returns `true` only if none was skipped.
    pub fn measure_batch<'a, I>(&self, instruments: I) -> bool
    where
        I: IntoIterator<Item = &'a mut Instrument>,
    {
        self.run(instruments, |_| {}).is_complete()
    }

    /// Measure every instrument, calling `on_progress` after each one.
    ///
    /// `on_progress` runs on worker threads; `completed` values are unique and
    /// each one is reported exactly once, though not necessarily in order.
    pub fn run<'a, I, P>(&self, instruments: I, on_progress: P) -> BatchReport
    where
        I: IntoIterator<Item = &'a mut Instrument>,
        P: Fn(BatchProgress) + Sync,
    {
        let tasks: Vec<&'a mut Instrument> = instruments.into_iter().collect();
        let total = tasks.len();
        if total == 0 {
            return BatchReport {
                completed: 0,
                total: 0,
                cancelled: false,
            };
        }

        let workers = self.workers.min(total);
        tracing::info!(total, workers, "measuring batch");

        let (tx, rx) = crossbeam_channel::unbounded();
        for task in tasks.into_iter().enumerate() {
            // `rx` is alive until the scope below ends, so sending cannot fail.
            let _ = tx.send(task);
        }
        drop(tx);

        let completed = AtomicUsize::new(0);
        let skipped = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for worker in 0..workers {
                let rx = rx.clone();
                let completed = &completed;
                let skipped = &skipped;
                let on_progress = &on_progress;
                scope.spawn(move || {
                    for (index, instrument) in rx.iter() {
                        if self.cancel.is_cancelled() {
                            skipped.store(true, Ordering::Relaxed);
                            break;
                        }
                        self.measurer.measure(instrument);
                        let done = completed.fetch_add(1, Ordering::AcqRel) + 1;
                        tracing::debug!(worker, index, done, total, "instrument measured");
                        on_progress(BatchProgress {
                            index,
                            completed: done,
                            total,
                        });
                    }
                });
            }
        });

        let report = BatchReport {
            completed: completed.into_inner(),
            total,
            cancelled: skipped.into_inner(),
        };
        tracing::info!(
            completed = report.completed,
            total,
            cancelled = report.cancelled,
            "batch finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::RegisterLog;
    use crate::config::MeasureConfig;

    fn runner() -> BatchRunner<fn() -> RegisterLog> {
        let config = MeasureConfig {
            sample_rate: 1000,
            slices_per_second: 100,
            max_key_on_secs: 0.05,
            min_key_on_secs: 0.0,
            max_key_off_secs: 0.05,
            ..Default::default()
        };
        BatchRunner::new(Measurer::new(RegisterLog::new as fn() -> RegisterLog, config))
    }

    #[test]
    fn empty_batch_is_complete() {
        let runner = runner();
        let mut none: Vec<Instrument> = Vec::new();
        assert!(runner.measure_batch(&mut none));
    }

    #[test]
    fn every_instrument_is_written() {
        let runner = runner().with_workers(3);
        let mut bank = vec![
            Instrument {
                key_on_ms: 7,
                key_off_ms: 7,
                ..Default::default()
            };
            10
        ];
        let report = runner.run(&mut bank, |_| {});
        assert!(report.is_complete());
        assert_eq!(report.completed, 10);
        assert!(bank.iter().all(|i| i.key_on_ms == 0 && i.key_off_ms == 0));
    }

    #[test]
    fn progress_reports_each_count_once() {
        let runner = runner().with_workers(4);
        let mut bank = vec![Instrument::default(); 9];
        let seen = std::sync::Mutex::new(Vec::new());
        runner.run(&mut bank, |p| {
            assert_eq!(p.total, 9);
            seen.lock().unwrap().push((p.completed, p.index));
        });
        let seen = seen.into_inner().unwrap();
        let mut counts: Vec<usize> = seen.iter().map(|&(c, _)| c).collect();
        let mut indices: Vec<usize> = seen.iter().map(|&(_, i)| i).collect();
        counts.sort_unstable();
        indices.sort_unstable();
        assert_eq!(counts, (1..=9).collect::<Vec<_>>());
        assert_eq!(indices, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn cancelled_before_start_skips_everything() {
        let runner = runner();
        runner.cancel_token().cancel();
        let mut bank = vec![
            Instrument {
                key_on_ms: 5,
                ..Default::default()
            };
            4
        ];
        let report = runner.run(&mut bank, |_| {});
        assert!(report.cancelled);
        assert_eq!(report.completed, 0);
        assert!(bank.iter().all(|i| i.key_on_ms == 5));

        let mut single = Instrument {
            key_on_ms: 5,
            ..Default::default()
        };
        assert!(!runner.measure_one(&mut single));
        assert_eq!(single.key_on_ms, 5);
    }

    #[test]
    fn cancel_token_reset() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn workers_never_zero() {
        assert_eq!(runner().with_workers(0).workers(), 1);
        assert!(default_workers() >= 1);
    }
}
