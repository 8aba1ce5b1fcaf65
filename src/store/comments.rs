use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::error::Result;
use crate::models::{Comment, NewComment};
use crate::storage::{keys, SharedStorage};
use crate::store::collection::Collection;
use crate::store::observer::Subscription;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentStats {
    pub total: usize,
    pub by_article: BTreeMap<String, usize>,
}

fn seed_comments(now: DateTime<Utc>) -> Vec<Comment> {
    let seed = |id: &str, article_id: &str, author: &str, content: &str, days_ago: i64| Comment {
        id: id.to_string(),
        article_id: article_id.to_string(),
        author_name: author.to_string(),
        content: content.to_string(),
        created_at: now - Duration::days(days_ago),
    };

    vec![
        seed(
            "1",
            "1",
            "Aminata Diallo",
            "Merci beaucoup pour cet article très instructif ! \
             J'ai appris beaucoup de choses sur la nutrition africaine.",
            2,
        ),
        seed(
            "2",
            "1",
            "Kofi Asante",
            "Excellente approche ! \
             C'est exactement ce dont nous avons besoin pour valoriser nos produits locaux.",
            5,
        ),
        seed(
            "3",
            "2",
            "Fatou Mensah",
            "Cette recette de calalou allégé est parfaite ! \
             Ma famille a adoré et c'est beaucoup plus digeste.",
            3,
        ),
        seed(
            "4",
            "3",
            "Ibrahim Touré",
            "Très utile pour gérer le budget familial. \
             Les conseils sont pratiques et réalistes.",
            1,
        ),
    ]
}

/// Visitor comments, newest first
#[derive(Clone)]
pub struct CommentStore {
    comments: Collection<Comment>,
    clock: SharedClock,
}

impl CommentStore {
    pub fn new(storage: SharedStorage, clock: SharedClock) -> Self {
        let now = clock.now().with_timezone(&Utc);
        Self {
            comments: Collection::load_or_seed(storage, keys::COMMENTS, || seed_comments(now)),
            clock,
        }
    }

    pub fn all(&self) -> Vec<Comment> {
        self.comments.all()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.comments.subscribe(listener)
    }

    /// Comments on one article, newest first
    pub fn by_article(&self, article_id: &str) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self.comments.read(|comments| {
            comments
                .iter()
                .filter(|c| c.article_id == article_id)
                .cloned()
                .collect()
        });
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        comments
    }

    pub fn count_for(&self, article_id: &str) -> usize {
        self.comments
            .read(|comments| comments.iter().filter(|c| c.article_id == article_id).count())
    }

    pub fn add(&self, new_comment: NewComment) -> Result<Comment> {
        new_comment.validate()?;

        let comment = new_comment.into_comment(
            Uuid::new_v4().to_string(),
            self.clock.now().with_timezone(&Utc),
        );
        let stored = comment.clone();
        self.comments.commit(move |comments| {
            comments.insert(0, stored);
            Some(())
        });

        info!("Added comment {} on article {}", comment.id, comment.article_id);
        Ok(comment)
    }

    pub fn delete(&self, id: &str) -> bool {
        let deleted = self
            .comments
            .commit(|comments| {
                let index = comments.iter().position(|c| c.id == id)?;
                Some(comments.remove(index))
            })
            .is_some();

        if deleted {
            info!("Deleted comment {}", id);
        }
        deleted
    }

    pub fn stats(&self) -> CommentStats {
        self.comments.read(|comments| {
            let mut by_article = BTreeMap::new();
            for comment in comments {
                *by_article.entry(comment.article_id.clone()).or_insert(0) += 1;
            }
            CommentStats {
                total: comments.len(),
                by_article,
            }
        })
    }

    pub fn export_json(&self) -> Result<String> {
        let comments = self.comments.all();
        Ok(serde_json::to_string_pretty(&comments)?)
    }
}
