//! Cancelable timer tasks.
//!
//! The delayed-retry and periodic-refresh behaviors are the same
//! primitive parameterized by one-shot vs. repeating. Cancellation is
//! scoped: dropping into [`TimerHandle::stop`] (or cancelling the
//! parent token) releases the timer without firing again.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// One-shot after a delay, or repeating at a fixed period.
#[derive(Debug, Clone, Copy)]
pub enum Schedule {
    Once(Duration),
    Every(Duration),
}

/// Handle to a spawned timer task.
pub struct TimerHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TimerHandle {
    /// Cancel the timer and wait for the task to exit. A tick already
    /// in progress runs to completion; no further tick fires.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }

    /// Cancel without waiting.
    pub fn abort(&self) {
        self.cancel.cancel();
    }
}

/// Spawn a timer driving `tick` per the schedule.
///
/// `Every` timers never fire before one full period has elapsed (the
/// immediate first tick is consumed) and delay rather than burst after
/// a slow tick. `Once` timers fire no earlier than their delay.
pub fn spawn<F, Fut>(schedule: Schedule, parent: &CancellationToken, mut tick: F) -> TimerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let cancel = parent.child_token();
    let task_cancel = cancel.clone();

    let handle = tokio::spawn(async move {
        match schedule {
            Schedule::Once(delay) => {
                tokio::select! {
                    biased;
                    () = task_cancel.cancelled() => {}
                    () = tokio::time::sleep(delay) => tick().await,
                }
            }
            Schedule::Every(period) => {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                interval.tick().await; // consume the immediate first tick
                loop {
                    tokio::select! {
                        biased;
                        () = task_cancel.cancelled() => break,
                        _ = interval.tick() => tick().await,
                    }
                }
            }
        }
    });

    TimerHandle { cancel, handle }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() -> std::future::Ready<()>) {
        let count = Arc::new(AtomicUsize::new(0));
        let tick_count = Arc::clone(&count);
        let tick = move || {
            tick_count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        };
        (count, tick)
    }

    #[tokio::test(start_paused = true)]
    async fn once_fires_no_earlier_than_delay() {
        let (count, tick) = counter();
        let root = CancellationToken::new();
        let timer = spawn(Schedule::Once(Duration::from_secs(5)), &root, tick);

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        timer.stop().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn every_skips_immediate_tick_and_repeats() {
        let (count, tick) = counter();
        let root = CancellationToken::new();
        let timer = spawn(Schedule::Every(Duration::from_secs(15)), &root, tick);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0, "no immediate tick");

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        timer.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_pending_once() {
        let (count, tick) = counter();
        let root = CancellationToken::new();
        let timer = spawn(Schedule::Once(Duration::from_secs(60)), &root, tick);

        tokio::time::sleep(Duration::from_secs(1)).await;
        timer.stop().await;

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn parent_token_cancels_child_timer() {
        let (count, tick) = counter();
        let root = CancellationToken::new();
        let timer = spawn(Schedule::Every(Duration::from_secs(5)), &root, tick);

        root.cancel();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        timer.stop().await;
    }
}
