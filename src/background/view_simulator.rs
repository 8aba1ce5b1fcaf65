use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::background::BackgroundTask;
use crate::config::SimulationConfig;
use crate::store::ViewStore;

/// Adds a trickle of fake traffic so counters move during a demo.
/// The numbers it produces are not real visits.
#[derive(Clone)]
pub struct ViewSimulator {
    views: ViewStore,
    interval: Duration,
    probability: f64,
}

impl ViewSimulator {
    pub fn new(views: ViewStore, config: &SimulationConfig) -> Self {
        Self {
            views,
            interval: config.view_interval(),
            probability: config.view_probability,
        }
    }

    /// One firing: pick an article with counters and, with the configured
    /// probability, add one to three views to it.
    pub fn tick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(String, u64)> {
        let ids = self.views.article_ids();
        let article_id = ids.choose(rng)?.clone();

        if !rng.gen_bool(self.probability) {
            return None;
        }

        let extra = rng.gen_range(1..=3);
        self.views.add_synthetic_views(&article_id, extra)?;
        debug!("Simulated {} views on article {}", extra, article_id);
        Some((article_id, extra))
    }

    pub fn spawn(self) -> BackgroundTask {
        BackgroundTask::spawn("view-simulator", move |mut shutdown| async move {
            let mut rng = StdRng::from_entropy();
            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.tick(&mut rng);
                    }
                }
            }
        })
    }
}
