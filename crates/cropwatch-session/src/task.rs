use std::future::Future;

use tokio::task::JoinHandle;

/// Owned handle to a spawned task that aborts the task when dropped.
///
/// Replacing an `Option<TaskGuard>` field releases the previous task before
/// the new one is stored.
#[derive(Debug)]
pub struct TaskGuard {
    handle: JoinHandle<()>,
}

impl TaskGuard {
    /// Spawn `future` on the current tokio runtime
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self { handle: tokio::spawn(future) }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_task() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let guard = TaskGuard::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(guard);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_when_kept() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let guard = TaskGuard::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(guard.is_finished());
    }
}
