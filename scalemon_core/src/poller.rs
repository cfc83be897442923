//! Background telemetry polling with overlap suppression.
//!
//! A ticker thread fires every `interval`; a single worker thread owns the
//! `TelemetrySource` and performs the fetches. At most one fetch is ever
//! outstanding: a tick that finds one in flight is dropped, not queued.
//! Frames are stamped after the fetch completes, by the one worker, so
//! timestamps are non-decreasing and can go straight into a `SampleBuffer`.
//!
//! Each `Poller` owns exactly two threads, shut down and joined on drop.
use crate::error::CoreError;
use crate::source_error::map_source_error;
use crossbeam_channel as xch;
use scalemon_traits::clock::Clock;
use scalemon_traits::{Telemetry, TelemetrySource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Frames buffered for the consumer before the worker starts dropping them.
const OUTPUT_CAPACITY: usize = 256;
/// Longest single sleep of the ticker, bounding shutdown latency.
const SHUTDOWN_SLICE: Duration = Duration::from_millis(20);

/// Single-slot, non-blocking guard for "one operation at a time".
#[derive(Debug, Clone, Default)]
pub struct OverlapGuard {
    busy: Arc<AtomicBool>,
}

/// Proof that the guarded slot is held; releases it on drop.
#[derive(Debug)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

impl OverlapGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, or `None` if an operation is already in flight.
    pub fn try_begin(&self) -> Option<InFlight> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// A telemetry reading stamped with milliseconds since the poller's epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolledFrame {
    pub time_ms: u64,
    pub telemetry: Telemetry,
}

pub type PollResult = Result<PolledFrame, CoreError>;

#[derive(Debug, Default)]
struct Counters {
    completed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    dropped: AtomicU64,
}

pub struct Poller {
    rx: xch::Receiver<PollResult>,
    counters: Arc<Counters>,
    epoch: Instant,
    shutdown: Arc<AtomicBool>,
    ticker: Option<JoinHandle<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn spawn<S, C>(mut source: S, interval: Duration, timeout: Duration, clock: C) -> Self
    where
        S: TelemetrySource + Send + 'static,
        C: Clock + Clone + Send + Sync + 'static,
    {
        let (req_tx, req_rx) = xch::bounded::<InFlight>(1);
        let (out_tx, rx) = xch::bounded::<PollResult>(OUTPUT_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(Counters::default());
        let guard = OverlapGuard::new();
        let epoch = clock.now();

        let worker = {
            let shutdown = Arc::clone(&shutdown);
            let counters = Arc::clone(&counters);
            let clock = clock.clone();
            std::thread::spawn(move || {
                // Ends when the ticker exits and drops its sender
                while let Ok(ticket) = req_rx.recv() {
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    let result = match source.fetch(timeout) {
                        Ok(telemetry) => {
                            counters.completed.fetch_add(1, Ordering::Relaxed);
                            Ok(PolledFrame {
                                time_ms: clock.ms_since(epoch),
                                telemetry,
                            })
                        }
                        Err(e) => {
                            counters.failed.fetch_add(1, Ordering::Relaxed);
                            let mapped = map_source_error(e.as_ref());
                            tracing::warn!(error = %mapped, "telemetry fetch failed");
                            Err(mapped)
                        }
                    };
                    match out_tx.try_send(result) {
                        Ok(()) => {}
                        Err(xch::TrySendError::Full(_)) => {
                            counters.dropped.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!("poller output full; frame dropped");
                        }
                        Err(xch::TrySendError::Disconnected(_)) => {
                            tracing::debug!("poller consumer disconnected, exiting worker");
                            break;
                        }
                    }
                    drop(ticket);
                }
                tracing::trace!("poller worker exiting cleanly");
            })
        };

        let ticker = {
            let shutdown = Arc::clone(&shutdown);
            let counters = Arc::clone(&counters);
            std::thread::spawn(move || {
                loop {
                    if shutdown.load(Ordering::Relaxed) {
                        tracing::debug!("poller ticker received shutdown signal");
                        break;
                    }
                    match guard.try_begin() {
                        Some(ticket) => {
                            if req_tx.send(ticket).is_err() {
                                break;
                            }
                        }
                        None => {
                            let n = counters.skipped.fetch_add(1, Ordering::Relaxed) + 1;
                            tracing::debug!(skipped = n, "poll in flight; tick dropped");
                        }
                    }
                    sleep_unless_shutdown(&clock, interval, &shutdown);
                }
                tracing::trace!("poller ticker exiting cleanly");
            })
        };

        Self {
            rx,
            counters,
            epoch,
            shutdown,
            ticker: Some(ticker),
            worker: Some(worker),
        }
    }

    pub fn try_recv(&self) -> Option<PollResult> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<PollResult> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Everything received so far, oldest first.
    pub fn drain(&self) -> Vec<PollResult> {
        self.rx.try_iter().collect()
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    pub fn completed_fetches(&self) -> u64 {
        self.counters.completed.load(Ordering::Relaxed)
    }

    pub fn failed_fetches(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Ticks dropped because a fetch was still in flight.
    pub fn skipped_ticks(&self) -> u64 {
        self.counters.skipped.load(Ordering::Relaxed)
    }

    /// Results discarded because the consumer fell behind.
    pub fn dropped_frames(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }
}

fn sleep_unless_shutdown<C: Clock>(clock: &C, total: Duration, shutdown: &AtomicBool) {
    let mut remaining = total;
    while !remaining.is_zero() && !shutdown.load(Ordering::Relaxed) {
        let step = remaining.min(SHUTDOWN_SLICE);
        clock.sleep(step);
        remaining = remaining.saturating_sub(step);
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The ticker wakes within one slice; the worker finishes its current
        // fetch (bounded by the source timeout) and then sees the closed
        // request channel.
        for (name, handle) in [("ticker", self.ticker.take()), ("worker", self.worker.take())] {
            if let Some(handle) = handle
                && let Err(e) = handle.join()
            {
                tracing::warn!(thread = name, ?e, "poller thread panicked during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_admits_one_holder_at_a_time() {
        let guard = OverlapGuard::new();
        let first = guard.try_begin();
        assert!(first.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_begin().is_none());
        drop(first);
        assert!(!guard.is_busy());
        assert!(guard.try_begin().is_some());
    }

    #[test]
    fn clones_share_the_slot() {
        let a = OverlapGuard::new();
        let b = a.clone();
        let _held = a.try_begin();
        assert!(b.try_begin().is_none());
    }
}
