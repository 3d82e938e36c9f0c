//! Periodic reminder scan tied to a session.
//!
//! [`ReminderScheduler::start`] spawns a Tokio task that calls the supplied
//! closure immediately and then once per period. The closure returns
//! [`ControlFlow::Break`] to stop the schedule on its own (for example when the
//! session it belongs to is gone). Otherwise the owner stops it with
//! [`ReminderScheduler::cancel`]; dropping the handle aborts the task.

use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

const MIN_PERIOD: Duration = Duration::from_secs(1);

pub struct ReminderScheduler {
    handle: Option<JoinHandle<()>>,
    cancel: Option<oneshot::Sender<()>>,
}

impl ReminderScheduler {
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut cancel_rx => {
                        info!("reminder scheduler cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        debug!("reminder tick");
                        if tick().is_break() {
                            info!("reminder scheduler stopped itself");
                            break;
                        }
                    }
                }
            }
        });
        info!(period_secs = period.as_secs(), "reminder scheduler started");
        ReminderScheduler {
            handle: Some(handle),
            cancel: Some(cancel_tx),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop the schedule and wait for the task to exit.
    pub async fn cancel(mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Wait until the closure stops the schedule.
    pub async fn finished(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() -> ControlFlow<()> + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_immediately_then_every_period() {
        let (count, tick) = counter();
        let scheduler = ReminderScheduler::start(Duration::from_secs(30), tick);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        scheduler.cancel().await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn closure_can_stop_the_schedule() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let scheduler = ReminderScheduler::start(Duration::from_secs(30), move || {
            if c.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        scheduler.finished().await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_aborts() {
        let (count, tick) = counter();
        let scheduler = ReminderScheduler::start(Duration::from_secs(30), tick);
        tokio::time::sleep(Duration::from_millis(1)).await;
        drop(scheduler);
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_is_clamped() {
        let (count, tick) = counter();
        let scheduler = ReminderScheduler::start(Duration::ZERO, tick);
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!scheduler.is_finished());
        scheduler.cancel().await;
    }
}
