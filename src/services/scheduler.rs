//! One-shot wall-clock timer scheduler.
//!
//! Timers are never cancelled when the state they depend on changes; every
//! fired callback re-reads its record and re-validates the identity it
//! captured at schedule time before committing anything, so a stale timer is
//! a safe no-op. That keeps the scheduler a fire-and-forget primitive with no
//! cancellation registry.

use std::time::Duration;

use futures::future::BoxFuture;
use time::OffsetDateTime;
use tracing::debug;

/// Schedules a callback for an absolute wall-clock instant.
///
/// Injected into the application state so orchestrators never reach for an
/// ambient global scheduler.
pub trait Scheduler: Send + Sync {
    /// Run `task` once `when` has passed. An instant already in the past runs
    /// the task immediately.
    fn schedule_at(&self, when: OffsetDateTime, task: BoxFuture<'static, ()>);
}

/// Scheduler backed by `tokio::time::sleep` on the ambient runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule_at(&self, when: OffsetDateTime, task: BoxFuture<'static, ()>) {
        let delay = when - OffsetDateTime::now_utc();
        let delay = Duration::try_from(delay).unwrap_or(Duration::ZERO);
        debug!(delay_ms = delay.as_millis() as u64, "scheduling one-shot timer");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test(start_paused = true)]
    async fn fires_after_the_deadline() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();

        let scheduler = TokioScheduler;
        scheduler.schedule_at(
            OffsetDateTime::now_utc() + time::Duration::seconds(90),
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn past_deadline_fires_immediately() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();

        let scheduler = TokioScheduler;
        scheduler.schedule_at(
            OffsetDateTime::now_utc() - time::Duration::seconds(5),
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
            }),
        );

        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(fired.load(Ordering::SeqCst));
    }
}
