//! Named background tasks with explicit shutdown.

pub mod comment_simulator;
pub mod daily_reset;
pub mod view_simulator;

use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use comment_simulator::CommentSimulator;
pub use daily_reset::DailyReset;
pub use view_simulator::ViewSimulator;

/// Cancellation side handed to a running task
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once shutdown was requested or the owning handle is gone
    pub async fn cancelled(&mut self) {
        while !*self.receiver.borrow() {
            if self.receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

/// A spawned task plus the means to stop it
pub struct BackgroundTask {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(ShutdownSignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, receiver) = watch::channel(false);
        let handle = tokio::spawn(body(ShutdownSignal { receiver }));
        debug!("Started background task '{}'", name);

        Self {
            name,
            shutdown,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the task and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!("Background task '{}' ended abnormally: {}", self.name, e);
        } else {
            debug!("Background task '{}' stopped", self.name);
        }
    }
}

/// The set of tasks started for one `Stores` instance
#[derive(Default)]
pub struct BackgroundTasks {
    tasks: Vec<BackgroundTask>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: BackgroundTask) {
        self.tasks.push(task);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub async fn shutdown(self) {
        let count = self.tasks.len();
        for task in self.tasks {
            task.shutdown().await;
        }
        if count > 0 {
            info!("Stopped {} background tasks", count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_loop() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&ticks);

        let task = BackgroundTask::spawn("counter", move |mut shutdown| async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        seen.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(task.name(), "counter");
        task.shutdown().await;

        let after_shutdown = ticks.load(Ordering::SeqCst);
        assert!(after_shutdown >= 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_shutdown);
    }

    #[tokio::test]
    async fn test_background_tasks_collection() {
        let mut tasks = BackgroundTasks::new();
        assert!(tasks.is_empty());

        tasks.push(BackgroundTask::spawn("idle", |mut shutdown| async move {
            shutdown.cancelled().await;
        }));
        assert_eq!(tasks.names(), vec!["idle"]);

        tasks.shutdown().await;
    }
}
