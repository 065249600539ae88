//! Periodic refresh for list views

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A running refresh loop. Dropping the handle stops it.
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Run `refresh` now and then once every `interval`.
    /// A slow refresh delays the next one rather than stacking calls.
    pub fn spawn<F, Fut>(interval: Duration, mut refresh: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                refresh().await;
            }
        });

        tracing::debug!(interval_secs = interval.as_secs(), "Started refresh loop");
        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!("Stopped refresh loop");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting() -> (Arc<AtomicUsize>, impl FnMut() -> std::future::Ready<()> + Send + 'static) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        (calls, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_on_interval() {
        let (calls, refresh) = counting();
        let handle = PollHandle::spawn(Duration::from_secs(30), refresh);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(calls.load(Ordering::SeqCst) >= 3);
        assert!(handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_refresh() {
        let (calls, refresh) = counting();
        let handle = PollHandle::spawn(Duration::from_secs(30), refresh);
        tokio::time::sleep(Duration::from_secs(31)).await;
        drop(handle);

        let seen = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(calls.load(Ordering::SeqCst), seen);
    }
}
