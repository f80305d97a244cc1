//! Trailing-quiescence activity monitor
//!
//! Observes a document's change-notification source and fires one coalesced
//! "settled" callback once no change has arrived for the configured
//! interval. A burst of edits collapses to a single firing after the last
//! edit; continuous activity defers the firing indefinitely. Disposing the
//! monitor cancels any pending firing for good.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Quiet interval after the last change before a settle fires.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Watches one change source for quiescence.
///
/// The monitor owns a background task holding the subscription; dropping or
/// disposing the monitor tears the task down. One monitor serves exactly one
/// binding and is never rearmed across bindings.
#[derive(Debug)]
pub struct ActivityMonitor {
    cancel: CancellationToken,
}

impl ActivityMonitor {
    /// Start watching `changes`. `on_settled` runs on the monitor's task
    /// each time the source stays quiet for `timeout` after at least one
    /// observed change.
    pub fn new<F, Fut>(
        mut changes: broadcast::Receiver<()>,
        timeout: Duration,
        mut on_settled: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let watch = cancel.clone();
        tokio::spawn(async move {
            let timer = sleep(timeout);
            tokio::pin!(timer);
            let mut armed = false;
            loop {
                tokio::select! {
                    biased;
                    _ = watch.cancelled() => break,
                    received = changes.recv() => match received {
                        // A lagged receiver still proves activity happened.
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            armed = true;
                            timer.as_mut().reset(Instant::now() + timeout);
                        }
                        // Source gone: end silently, no trailing settle.
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = timer.as_mut(), if armed => {
                        armed = false;
                        on_settled().await;
                    }
                }
            }
        });
        Self { cancel }
    }

    /// Stop observing and cancel any pending settle. Idempotent.
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for ActivityMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_monitor(
        changes: broadcast::Receiver<()>,
        timeout: Duration,
    ) -> (ActivityMonitor, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&fired);
        let monitor = ActivityMonitor::new(changes, timeout, move || {
            let counted = Arc::clone(&counted);
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
            }
        });
        (monitor, fired)
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_once_after_quiet_interval() {
        let (tx, rx) = broadcast::channel(16);
        let (_monitor, fired) = counting_monitor(rx, DEFAULT_SETTLE_TIMEOUT);

        tx.send(()).unwrap();
        sleep(Duration::from_millis(950)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // No further activity, no further firings.
        sleep(Duration::from_millis(3000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_to_single_settle() {
        let (tx, rx) = broadcast::channel(16);
        let (_monitor, fired) = counting_monitor(rx, DEFAULT_SETTLE_TIMEOUT);

        // Five changes 100ms apart; the timer keeps resetting.
        for _ in 0..5 {
            tx.send(()).unwrap();
            sleep(Duration::from_millis(100)).await;
        }
        sleep(Duration::from_millis(850)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // A later lone change settles independently.
        tx.send(()).unwrap();
        sleep(Duration::from_millis(1100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuous_activity_defers_indefinitely() {
        let (tx, rx) = broadcast::channel(16);
        let (_monitor, fired) = counting_monitor(rx, DEFAULT_SETTLE_TIMEOUT);

        for _ in 0..5 {
            tx.send(()).unwrap();
            sleep(Duration::from_millis(900)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(1200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_cancels_pending_settle() {
        let (tx, rx) = broadcast::channel(16);
        let (monitor, fired) = counting_monitor(rx, DEFAULT_SETTLE_TIMEOUT);

        tx.send(()).unwrap();
        sleep(Duration::from_millis(500)).await;
        monitor.dispose();
        assert!(monitor.is_disposed());

        sleep(Duration::from_millis(3000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // Disposing again is harmless.
        monitor.dispose();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_settle() {
        let (tx, rx) = broadcast::channel(16);
        let (monitor, fired) = counting_monitor(rx, DEFAULT_SETTLE_TIMEOUT);

        tx.send(()).unwrap();
        sleep(Duration::from_millis(500)).await;
        drop(monitor);

        sleep(Duration::from_millis(3000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_source_ends_without_trailing_settle() {
        let (tx, rx) = broadcast::channel(16);
        let (_monitor, fired) = counting_monitor(rx, DEFAULT_SETTLE_TIMEOUT);

        tx.send(()).unwrap();
        drop(tx);
        sleep(Duration::from_millis(2000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lagged_receiver_counts_as_activity() {
        let (tx, rx) = broadcast::channel(2);
        let (_monitor, fired) = counting_monitor(rx, DEFAULT_SETTLE_TIMEOUT);

        // Overflow the channel before the monitor task first polls.
        for _ in 0..5 {
            tx.send(()).unwrap();
        }
        sleep(Duration::from_millis(1100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
