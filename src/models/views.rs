use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Number of days of per-day history kept for each article
pub const DAILY_HISTORY_DAYS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyViews {
    pub date: NaiveDate,
    pub count: u64,
}

/// View counters for one article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleViews {
    pub id: String,
    pub article_id: String,
    pub views_count: u64,
    pub last_viewed: DateTime<Utc>,
    pub unique_views: u64,
    pub daily_views: Vec<DailyViews>,
}

impl ArticleViews {
    pub fn new(article_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("view_{}", article_id),
            article_id: article_id.to_string(),
            views_count: 0,
            last_viewed: now,
            unique_views: 0,
            daily_views: Vec::new(),
        }
    }

    /// Add `count` to the history entry for `date`, keeping only the most recent days
    pub fn record_daily(&mut self, date: NaiveDate, count: u64) {
        match self.daily_views.iter_mut().find(|dv| dv.date == date) {
            Some(entry) => entry.count += count,
            None => {
                self.daily_views.push(DailyViews { date, count });
                if self.daily_views.len() > DAILY_HISTORY_DAYS {
                    let excess = self.daily_views.len() - DAILY_HISTORY_DAYS;
                    self.daily_views.drain(..excess);
                }
            }
        }
    }

    pub fn views_on(&self, date: NaiveDate) -> u64 {
        self.daily_views
            .iter()
            .find(|dv| dv.date == date)
            .map(|dv| dv.count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalViewStats {
    pub total_views: u64,
    pub total_unique_views: u64,
    pub articles_with_views: usize,
    pub today_views: u64,
    pub average_views_per_article: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MostViewed {
    pub article_id: String,
    pub views: u64,
}
