//! Cancellable countdown.
//!
//! [`start_countdown`] runs on its own tokio task and reports each step
//! through callbacks. Once [`CancelHandle::cancel`] returns, neither
//! callback will be invoked again. The controller additionally tags every
//! callback with its attempt number, so a tick racing a cancellation is
//! dropped there as well.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Stops a running countdown. Dropping the handle does not cancel it.
#[derive(Debug)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The countdown ran to completion or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Count down from `from` once per `period`.
///
/// After each period `on_tick(remaining)` fires with the new value while it
/// is at least 1; the period after `on_tick(1)` fires `on_complete` instead.
/// `from` must be at least 1, so the whole countdown lasts `from * period`.
///
/// Must be called from within a tokio runtime.
pub fn start_countdown<T, C>(from: u32, period: Duration, mut on_tick: T, on_complete: C) -> CancelHandle
where
    T: FnMut(u32) + Send + 'static,
    C: FnOnce() + Send + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();

    let task = tokio::spawn(async move {
        let mut remaining = from.max(1);
        loop {
            tokio::time::sleep(period).await;
            if flag.load(Ordering::SeqCst) {
                return;
            }
            if remaining > 1 {
                remaining -= 1;
                on_tick(remaining);
            } else {
                on_complete();
                return;
            }
        }
    });

    CancelHandle { cancelled, task }
}
