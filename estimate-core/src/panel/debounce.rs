use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Trailing-edge debounce timer.
///
/// Arming replaces any timer that has not fired yet. Once the delay has
/// elapsed the action runs on its own task, so re-arming or cancelling
/// afterwards never interrupts it.
#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    handle: Option<JoinHandle<()>>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            handle: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn arm<F>(
        &mut self,
        action: F,
    ) where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(action);
        }));
    }

    /// Returns `true` if a timer was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    fn counter_action(hits: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let hits = Arc::clone(hits);
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut timer = DebounceTimer::new(DELAY);

        timer.arm(counter_action(&hits));
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_restarts_the_delay() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut timer = DebounceTimer::new(DELAY);

        for _ in 0..5 {
            timer.arm(counter_action(&hits));
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        tokio::time::sleep(DELAY).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_stop_a_pending_timer() {
        let hits = Arc::new(AtomicUsize::new(0));

        let mut timer = DebounceTimer::new(DELAY);
        timer.arm(counter_action(&hits));
        assert!(timer.is_armed());
        assert!(timer.cancel());
        assert!(!timer.cancel());

        let mut dropped = DebounceTimer::new(DELAY);
        dropped.arm(counter_action(&hits));
        drop(dropped);

        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
