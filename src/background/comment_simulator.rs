use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::background::BackgroundTask;
use crate::config::SimulationConfig;
use crate::models::{Comment, NewComment};
use crate::store::{ArticleStore, CommentStore};

const AUTHORS: &[&str] = &[
    "Aïcha",
    "Mamadou",
    "Nadège",
    "Koffi",
    "Sandrine",
    "Ibrahim",
    "Mireille",
    "Yannick",
];

const MESSAGES: &[&str] = &[
    "Merci pour cet article, très instructif !",
    "J'ai testé la recette ce week-end, toute la famille a adoré.",
    "Est-ce qu'on peut remplacer l'huile de palme par autre chose ?",
    "Très bons conseils, surtout pour les petits budgets.",
    "Ma grand-mère faisait exactement comme ça, quelle nostalgie.",
    "Pourriez-vous faire un article sur le petit-déjeuner ?",
    "Clair et bien expliqué, je partage avec mes amies.",
    "Je ne savais pas que c'était aussi riche en fer, merci !",
];

/// Posts an occasional canned comment on a random article
#[derive(Clone)]
pub struct CommentSimulator {
    articles: ArticleStore,
    comments: CommentStore,
    min_delay: Duration,
    max_delay: Duration,
    probability: f64,
    max_per_article: usize,
}

impl CommentSimulator {
    pub fn new(articles: ArticleStore, comments: CommentStore, config: &SimulationConfig) -> Self {
        let (min_delay, max_delay) = config.comment_delay_range();
        Self {
            articles,
            comments,
            min_delay,
            max_delay,
            probability: config.comment_probability,
            max_per_article: config.max_comments_per_article,
        }
    }

    /// One firing. Articles that already reached the per-article cap are skipped.
    pub fn tick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Comment> {
        if !rng.gen_bool(self.probability) {
            return None;
        }

        let open: Vec<String> = self
            .articles
            .all()
            .into_iter()
            .map(|article| article.id)
            .filter(|id| self.comments.count_for(id) < self.max_per_article)
            .collect();

        let article_id = open.choose(rng)?.clone();
        let author = AUTHORS.choose(rng)?;
        let message = MESSAGES.choose(rng)?;

        match self
            .comments
            .add(NewComment::new(article_id, *author, *message))
        {
            Ok(comment) => {
                debug!("Simulated comment {} on article {}", comment.id, comment.article_id);
                Some(comment)
            }
            Err(e) => {
                warn!("Simulated comment rejected: {}", e);
                None
            }
        }
    }

    /// Delay before the next firing, uniformly within the configured range
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_delay >= self.max_delay {
            return self.min_delay;
        }
        rng.gen_range(self.min_delay..=self.max_delay)
    }

    pub fn spawn(self) -> BackgroundTask {
        BackgroundTask::spawn("comment-simulator", move |mut shutdown| async move {
            let mut rng = StdRng::from_entropy();

            loop {
                let delay = self.next_delay(&mut rng);
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {
                        self.tick(&mut rng);
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

    fn simulator(probability: f64, max_per_article: usize) -> (CommentStore, CommentSimulator) {
        let storage = Arc::new(MemoryStorage::default());
        let articles = ArticleStore::new(storage.clone());
        let comments = CommentStore::new(storage, Arc::new(ManualClock::at(2024, 3, 5, 10, 0)));
        let config = SimulationConfig {
            comment_probability: probability,
            max_comments_per_article: max_per_article,
            ..Default::default()
        };
        let simulator = CommentSimulator::new(articles, comments.clone(), &config);
        (comments, simulator)
    }

    #[test]
    fn test_tick_adds_comment_from_pool() {
        let (comments, simulator) = simulator(1.0, 15);
        let before = comments.len();
        let mut rng = StdRng::seed_from_u64(3);

        let comment = simulator.tick(&mut rng).unwrap();
        assert_eq!(comments.len(), before + 1);
        assert!(AUTHORS.contains(&comment.author_name.as_str()));
        assert!(MESSAGES.contains(&comment.content.as_str()));
        assert!(comments.by_article(&comment.article_id).iter().any(|c| c.id == comment.id));
    }

    #[test]
    fn test_tick_respects_probability() {
        let (comments, simulator) = simulator(0.0, 15);
        let before = comments.len();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..20 {
            assert!(simulator.tick(&mut rng).is_none());
        }
        assert_eq!(comments.len(), before);
    }

    #[test]
    fn test_tick_stops_at_article_cap() {
        let (comments, simulator) = simulator(1.0, 3);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            simulator.tick(&mut rng);
        }

        // 6 bundled articles, each capped at 3
        assert_eq!(comments.len(), 18);
        assert!(simulator.tick(&mut rng).is_none());
        for id in ["1", "2", "3", "4", "5", "6"] {
            assert_eq!(comments.count_for(id), 3);
        }
    }

    #[test]
    fn test_next_delay_within_range() {
        let (_comments, simulator) = simulator(1.0, 15);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let delay = simulator.next_delay(&mut rng);
            assert!(delay >= Duration::from_secs(120) && delay <= Duration::from_secs(300));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_simulator_posts_after_delay() {
        let (comments, simulator) = simulator(1.0, 15);
        let before = comments.len();
        let task = simulator.spawn();

        tokio::time::sleep(Duration::from_secs(119)).await;
        assert_eq!(comments.len(), before);

        tokio::time::sleep(Duration::from_secs(182)).await;
        assert!(comments.len() > before);

        task.shutdown().await;
    }
}
