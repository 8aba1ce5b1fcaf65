use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::SharedClock;
use crate::error::Result;
use crate::models::{ArticleViews, DailyViews, GlobalViewStats, MostViewed, DAILY_HISTORY_DAYS};
use crate::storage::{keys, SharedStorage};
use crate::store::collection::{Collection, Snapshot};
use crate::store::observer::Subscription;

/// Seed for the demo counters, so a fresh install always shows the same numbers
const SEED_RNG: u64 = 0xCA7A_2024;
const SEED_ARTICLE_COUNT: u32 = 10;

fn view_key(article_id: &str, date: NaiveDate) -> String {
    format!("{}_{}", article_id, date)
}

fn key_date(key: &str) -> Option<NaiveDate> {
    let (_, date) = key.rsplit_once('_')?;
    date.parse().ok()
}

/// Realistic-looking counters for articles "1" to "10" with a full month of history
pub fn seed_views(now: DateTime<Local>) -> Vec<ArticleViews> {
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let today = now.date_naive();
    let now_utc = now.with_timezone(&Utc);

    (1..=SEED_ARTICLE_COUNT)
        .map(|n| {
            let article_id = n.to_string();
            let base_views: u64 = rng.gen_range(200..1000);

            let days = DAILY_HISTORY_DAYS as i64;
            let daily_views = (0..days)
                .rev()
                .map(|days_ago| DailyViews {
                    date: today - Duration::days(days_ago),
                    // More recent days get more traffic
                    count: rng.gen_range(0..(days - days_ago) as u64) + 1,
                })
                .collect();

            ArticleViews {
                id: format!("view_{}", article_id),
                article_id,
                views_count: base_views,
                last_viewed: now_utc,
                unique_views: base_views * 7 / 10,
                daily_views,
            }
        })
        .collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewsExport<'a> {
    views: &'a [ArticleViews],
    global_stats: GlobalViewStats,
    export_date: DateTime<Utc>,
}

/// Page-view counters per article.
///
/// Every visit bumps the total. A visit only counts as unique the first time
/// a given article is seen on a given calendar day; the set of
/// "article_date" keys seen so far is persisted separately and emptied at
/// local midnight.
#[derive(Clone)]
pub struct ViewStore {
    views: Collection<ArticleViews>,
    viewed_today: Arc<RwLock<BTreeSet<String>>>,
    viewed_snapshot: Snapshot<BTreeSet<String>>,
    clock: SharedClock,
}

impl ViewStore {
    pub fn new(storage: SharedStorage, clock: SharedClock) -> Self {
        let now = clock.now();
        let views = Collection::load_or_seed(Arc::clone(&storage), keys::ARTICLE_VIEWS, || {
            seed_views(now)
        });

        let viewed_snapshot: Snapshot<BTreeSet<String>> =
            Snapshot::new(storage, keys::TODAY_VIEWED);
        let mut viewed_today = match viewed_snapshot.load() {
            Ok(Some(saved)) => saved,
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("Could not load '{}' ({}), starting empty", keys::TODAY_VIEWED, e);
                BTreeSet::new()
            }
        };

        // Keys from earlier days can no longer match; drop them if the
        // midnight reset was missed while nothing was running.
        let today = now.date_naive();
        let before = viewed_today.len();
        viewed_today.retain(|key| key_date(key) == Some(today));
        if viewed_today.len() != before {
            debug!("Dropped {} stale day-view keys", before - viewed_today.len());
            viewed_snapshot.save_or_log(&viewed_today);
        }

        Self {
            views,
            viewed_today: Arc::new(RwLock::new(viewed_today)),
            viewed_snapshot,
            clock,
        }
    }

    pub fn all(&self) -> Vec<ArticleViews> {
        self.views.all()
    }

    pub fn get(&self, article_id: &str) -> Option<ArticleViews> {
        self.views
            .read(|views| views.iter().find(|v| v.article_id == article_id).cloned())
    }

    pub fn article_ids(&self) -> Vec<String> {
        self.views
            .read(|views| views.iter().map(|v| v.article_id.clone()).collect())
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.views.subscribe(listener)
    }

    /// Record one visit of `article_id` and return its new total
    pub fn increment_views(&self, article_id: &str) -> u64 {
        let now = self.clock.now();
        let today = now.date_naive();
        let now_utc = now.with_timezone(&Utc);
        let key = view_key(article_id, today);

        let total = self.views.commit(|views| {
            let index = match views.iter().position(|v| v.article_id == article_id) {
                Some(index) => index,
                None => {
                    views.push(ArticleViews::new(article_id, now_utc));
                    views.len() - 1
                }
            };

            let record = &mut views[index];
            record.views_count += 1;
            record.last_viewed = now_utc;

            let mut viewed_today = self.viewed_today.write();
            let before = viewed_today.len();
            // Keys from earlier days can linger when the process outlives midnight
            viewed_today.retain(|k| key_date(k) == Some(today));
            let pruned = viewed_today.len() != before;
            let first_today = viewed_today.insert(key);
            if first_today {
                record.unique_views += 1;
            }
            if first_today || pruned {
                self.viewed_snapshot.save_or_log(&viewed_today);
            }

            record.record_daily(today, 1);
            Some(record.views_count)
        });

        total.unwrap_or_default()
    }

    /// Add synthetic traffic to an existing article. Unique views are untouched.
    pub fn add_synthetic_views(&self, article_id: &str, count: u64) -> Option<u64> {
        let today = self.clock.today();
        self.views.commit(|views| {
            let record = views.iter_mut().find(|v| v.article_id == article_id)?;
            record.views_count += count;
            record.record_daily(today, count);
            Some(record.views_count)
        })
    }

    /// Total views, 0 for an article never seen
    pub fn views_for(&self, article_id: &str) -> u64 {
        self.get(article_id).map(|v| v.views_count).unwrap_or(0)
    }

    pub fn unique_views_for(&self, article_id: &str) -> u64 {
        self.get(article_id).map(|v| v.unique_views).unwrap_or(0)
    }

    pub fn history(&self, article_id: &str) -> Vec<DailyViews> {
        self.get(article_id).map(|v| v.daily_views).unwrap_or_default()
    }

    pub fn viewed_today_count(&self) -> usize {
        self.viewed_today.read().len()
    }

    pub fn global_stats(&self) -> GlobalViewStats {
        let today = self.clock.today();
        self.views.read(|views| {
            let total_views: u64 = views.iter().map(|v| v.views_count).sum();
            let total_unique_views = views.iter().map(|v| v.unique_views).sum();
            let today_views = views.iter().map(|v| v.views_on(today)).sum();
            let articles_with_views = views.len();

            let average_views_per_article = if articles_with_views > 0 {
                (total_views as f64 / articles_with_views as f64).round() as u64
            } else {
                0
            };

            GlobalViewStats {
                total_views,
                total_unique_views,
                articles_with_views,
                today_views,
                average_views_per_article,
            }
        })
    }

    /// Articles with the most views first
    pub fn most_viewed(&self, limit: usize) -> Vec<MostViewed> {
        let mut ranked: Vec<MostViewed> = self.views.read(|views| {
            views
                .iter()
                .map(|v| MostViewed {
                    article_id: v.article_id.clone(),
                    views: v.views_count,
                })
                .collect()
        });
        ranked.sort_by(|a, b| b.views.cmp(&a.views));
        ranked.truncate(limit);
        ranked
    }

    pub fn export_json(&self) -> Result<String> {
        let views = self.views.all();
        let export = ViewsExport {
            views: &views,
            global_stats: self.global_stats(),
            export_date: self.clock.now().with_timezone(&Utc),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Forget which articles were seen today. Returns how many keys were cleared.
    pub fn reset_daily(&self) -> usize {
        let mut viewed_today = self.viewed_today.write();
        let cleared = viewed_today.len();
        viewed_today.clear();
        if let Err(e) = self.viewed_snapshot.clear() {
            warn!("Failed to clear '{}': {}", keys::TODAY_VIEWED, e);
        }
        info!("Daily view reset, {} keys cleared", cleared);
        cleared
    }

    /// Throw away all counters and regenerate the demo data
    pub fn reset_all(&self) {
        let now = self.clock.now();
        self.views.commit(|views| {
            let mut viewed_today = self.viewed_today.write();
            viewed_today.clear();
            if let Err(e) = self.viewed_snapshot.clear() {
                warn!("Failed to clear '{}': {}", keys::TODAY_VIEWED, e);
            }
            *views = seed_views(now);
            Some(())
        });
        info!("All view counters reset");
    }
}
