//! Queue-backed handler decorator
//!
//! [`AsyncHandler`] wraps any [`Handler`] with a `crossbeam-channel` queue and
//! one dedicated worker thread, so the wrapped handler's I/O never runs on the
//! caller's thread. The overflow strategy picks the send primitive:
//!
//! - `Block`: blocking `send`
//! - `Drop`: `try_send`, discarding the record when the queue is full
//! - `Raise`: `try_send`, returning [`LoggerError::QueueFull`] when full
//!
//! The worker survives every error and panic of the wrapped handler, and on
//! shutdown drains whatever is still queued before exiting.

use crate::core::error::{LoggerError, Result};
use crate::core::handler::{panic_message, Handler};
use crate::core::metrics::QueueMetrics;
use crate::core::overflow_policy::OverflowStrategy;
use crate::core::record::Record;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long `close` waits for the worker before giving up on it (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Worker wake-up interval on an empty queue
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sleep between liveness checks while joining or draining
const JOIN_POLL: Duration = Duration::from_millis(10);

/// State shared between the handler and its worker
struct Shared {
    inner: Arc<dyn Handler>,
    stop: AtomicBool,
    /// Records enqueued but not yet offered to `inner`
    pending: AtomicUsize,
    metrics: Arc<QueueMetrics>,
}

pub struct AsyncHandler {
    shared: Arc<Shared>,
    /// `None` once closed; `emit` after that is a silent no-op
    sender: RwLock<Option<Sender<Arc<Record>>>>,
    capacity: usize,
    strategy: OverflowStrategy,
    worker: Mutex<Option<JoinHandle<()>>>,
    shutdown_timeout: Duration,
}

impl AsyncHandler {
    /// Start a worker for `inner`; `capacity` 0 means unbounded
    pub fn new(
        inner: Arc<dyn Handler>,
        capacity: usize,
        strategy: OverflowStrategy,
    ) -> Result<Self> {
        let (sender, receiver) = if capacity == 0 {
            unbounded()
        } else {
            bounded(capacity)
        };

        let shared = Arc::new(Shared {
            inner,
            stop: AtomicBool::new(false),
            pending: AtomicUsize::new(0),
            metrics: Arc::new(QueueMetrics::new()),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(format!("sinklog-{}", shared.inner.kind()))
            .spawn(move || run_worker(&worker_shared, &receiver))
            .map_err(|e| {
                LoggerError::io_operation("starting async worker", "thread spawn failed", e)
            })?;

        Ok(Self {
            shared,
            sender: RwLock::new(Some(sender)),
            capacity,
            strategy,
            worker: Mutex::new(Some(worker)),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn metrics(&self) -> Arc<QueueMetrics> {
        Arc::clone(&self.shared.metrics)
    }

    pub fn strategy(&self) -> OverflowStrategy {
        self.strategy
    }

    /// Records queued but not yet handed to the wrapped handler
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    pub fn is_worker_alive(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait until the queue is empty; `false` on timeout
    fn wait_for_drain(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        while self.pending() > 0 {
            if start.elapsed() >= timeout || !self.is_worker_alive() {
                return false;
            }
            thread::sleep(JOIN_POLL);
        }
        true
    }

    fn enqueue(&self, sender: &Sender<Arc<Record>>, record: Arc<Record>) -> Result<()> {
        let shared = &self.shared;
        shared.pending.fetch_add(1, Ordering::AcqRel);

        let outcome = match self.strategy {
            OverflowStrategy::Block => {
                if sender.is_full() {
                    shared.metrics.record_queue_full();
                }
                sender.send(record).map_err(|_| LoggerError::ChannelSendError)
            }
            OverflowStrategy::Drop => match sender.try_send(record) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    shared.pending.fetch_sub(1, Ordering::AcqRel);
                    shared.metrics.record_queue_full();
                    shared.metrics.record_dropped();
                    return Ok(());
                }
                Err(TrySendError::Disconnected(_)) => Err(LoggerError::ChannelSendError),
            },
            OverflowStrategy::Raise => match sender.try_send(record) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    shared.metrics.record_queue_full();
                    Err(LoggerError::queue_full(sender.len(), self.capacity))
                }
                Err(TrySendError::Disconnected(_)) => Err(LoggerError::ChannelSendError),
            },
        };

        match outcome {
            Ok(()) => {
                shared.metrics.record_enqueued();
                Ok(())
            }
            Err(e) => {
                shared.pending.fetch_sub(1, Ordering::AcqRel);
                Err(e)
            }
        }
    }

    /// Poll `handle` until it finishes or `timeout` passes
    fn join_worker(handle: JoinHandle<()>, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!(
                        "[LOGGER ERROR] Async worker thread panicked during shutdown: {}",
                        panic_message(&*e)
                    );
                    return false;
                }
                return true;
            }
            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Async worker did not finish within {:?}. \
                     Some records may be lost.",
                    timeout
                );
                return false;
            }
            thread::sleep(JOIN_POLL);
        }
    }
}

fn run_worker(shared: &Shared, receiver: &Receiver<Arc<Record>>) {
    loop {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(record) => deliver_one(shared, &record),
            Err(RecvTimeoutError::Timeout) => {
                if shared.stop.load(Ordering::Acquire) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Stop requested: everything still queued is delivered before exiting
    while let Ok(record) = receiver.try_recv() {
        deliver_one(shared, &record);
    }
}

fn deliver_one(shared: &Shared, record: &Arc<Record>) {
    let inner = &shared.inner;
    match catch_unwind(AssertUnwindSafe(|| inner.deliver(record))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            shared.metrics.record_worker_error();
            eprintln!(
                "[LOGGER ERROR] Async worker: {} handler failed: {}",
                inner.kind(),
                e
            );
        }
        Err(panic_info) => {
            shared.metrics.record_worker_error();
            eprintln!(
                "[LOGGER CRITICAL] Async worker: {} handler panicked: {}. Worker continues.",
                inner.kind(),
                panic_message(&*panic_info)
            );
        }
    }
    shared.metrics.record_processed();
    shared.pending.fetch_sub(1, Ordering::AcqRel);
}

impl Handler for AsyncHandler {
    fn kind(&self) -> &'static str {
        "async"
    }

    /// Filtering happens here, before a record takes queue space
    fn should_emit(&self, record: &Record) -> bool {
        self.shared.inner.should_emit(record)
    }

    fn deliver(&self, record: &Arc<Record>) -> Result<()> {
        let gate = self.sender.read();
        match gate.as_ref() {
            Some(sender) => self.enqueue(sender, Arc::clone(record)),
            None => Ok(()),
        }
    }

    /// Wait (bounded) for the queue to drain, then flush the wrapped handler
    fn flush(&self) -> Result<()> {
        if !self.wait_for_drain(self.shutdown_timeout) {
            eprintln!(
                "[LOGGER WARNING] Async queue not drained within {:?}; flushing anyway",
                self.shutdown_timeout
            );
        }
        self.shared.inner.flush()
    }

    /// Stop accepting, drain, join the worker, close the wrapped handler
    fn close(&self) -> Result<()> {
        let Some(sender) = self.sender.write().take() else {
            return Ok(());
        };

        self.wait_for_drain(self.shutdown_timeout);
        self.shared.stop.store(true, Ordering::Release);
        drop(sender);

        if let Some(handle) = self.worker.lock().take() {
            Self::join_worker(handle, self.shutdown_timeout);
        }

        let dropped = self.shared.metrics.dropped();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Async {} handler closed with {} dropped records (drop rate: {:.2}%)",
                self.shared.inner.kind(),
                dropped,
                self.shared.metrics.drop_rate()
            );
        }

        self.shared.inner.close()
    }
}

impl Drop for AsyncHandler {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            eprintln!("[LOGGER ERROR] Failed to close async handler: {}", e);
        }
    }
}
