use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

use crate::background::BackgroundTask;
use crate::clock::{duration_until_next_midnight, SharedClock};
use crate::store::ViewStore;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Empties the "seen today" set at local midnight, then every 24 hours
#[derive(Clone)]
pub struct DailyReset {
    views: ViewStore,
    clock: SharedClock,
}

impl DailyReset {
    pub fn new(views: ViewStore, clock: SharedClock) -> Self {
        Self { views, clock }
    }

    pub fn spawn(self) -> BackgroundTask {
        BackgroundTask::spawn("daily-reset", move |mut shutdown| async move {
            let first = duration_until_next_midnight(self.clock.now());
            info!("Daily view reset scheduled in {}s", first.as_secs());

            let mut ticker = interval_at(Instant::now() + first, DAY);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.views.reset_daily();
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_reset_fires_at_midnight_then_daily() {
        let clock = ManualClock::at(2024, 3, 5, 23, 59);
        let views = ViewStore::new(Arc::new(MemoryStorage::default()), Arc::new(clock.clone()));
        views.increment_views("1");
        assert_eq!(views.viewed_today_count(), 1);

        let task = DailyReset::new(views.clone(), Arc::new(clock.clone())).spawn();

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(views.viewed_today_count(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(views.viewed_today_count(), 0);

        views.increment_views("2");
        tokio::time::sleep(DAY).await;
        assert_eq!(views.viewed_today_count(), 0);

        task.shutdown().await;
    }
}
