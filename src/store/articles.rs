use tracing::{error, info};

use crate::error::Result;
use crate::models::{Article, Category};
use crate::storage::{keys, SharedStorage};
use crate::store::collection::Collection;
use crate::store::observer::Subscription;

/// Articles shipped with the site, used the first time the store is opened
const BUNDLED_ARTICLES: &str = include_str!("../../data/articles.json");

/// Page size of the public article listing
pub const ARTICLES_PER_PAGE: usize = 6;

pub fn bundled_articles() -> Vec<Article> {
    match serde_json::from_str(BUNDLED_ARTICLES) {
        Ok(articles) => articles,
        Err(e) => {
            error!("Bundled article dataset is unreadable: {}", e);
            Vec::new()
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped to the valid range
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = (total_items + per_page - 1) / per_page;
    let page = page.clamp(1, total_pages.max(1));

    let start = (page - 1) * per_page;
    let items = items.iter().skip(start).take(per_page).cloned().collect();

    Page {
        items,
        page,
        total_pages,
        total_items,
    }
}

/// Article list, newest first
#[derive(Clone)]
pub struct ArticleStore {
    articles: Collection<Article>,
}

impl ArticleStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            articles: Collection::load_or_seed(storage, keys::ARTICLES, bundled_articles),
        }
    }

    pub fn all(&self) -> Vec<Article> {
        self.articles.all()
    }

    pub fn get(&self, id: &str) -> Option<Article> {
        self.articles
            .read(|articles| articles.iter().find(|a| a.id == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.articles.subscribe(listener)
    }

    /// Add an article at the front of the list.
    ///
    /// Ids are not checked for uniqueness; a reused id shadows the older
    /// article in `get`, `update` and `delete`.
    pub fn add(&self, article: Article) -> Result<()> {
        article.validate()?;
        let article = article.normalized();
        let id = article.id.clone();

        self.articles.commit(move |articles| {
            articles.insert(0, article);
            Some(())
        });

        info!("Added article {}", id);
        Ok(())
    }

    /// Replace the article with the same id. Returns false when no such article exists.
    pub fn update(&self, article: Article) -> Result<bool> {
        article.validate()?;
        let article = article.normalized();
        let id = article.id.clone();

        let updated = self
            .articles
            .commit(move |articles| {
                let slot = articles.iter_mut().find(|a| a.id == article.id)?;
                *slot = article;
                Some(())
            })
            .is_some();

        if updated {
            info!("Updated article {}", id);
        }
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> bool {
        let deleted = self
            .articles
            .commit(|articles| {
                let index = articles.iter().position(|a| a.id == id)?;
                Some(articles.remove(index))
            })
            .is_some();

        if deleted {
            info!("Deleted article {}", id);
        }
        deleted
    }

    /// Filter by free-text query and optional category, keeping list order
    pub fn search(&self, query: &str, category: Option<Category>) -> Vec<Article> {
        self.articles.read(|articles| {
            articles
                .iter()
                .filter(|a| a.matches(query))
                .filter(|a| category.map_or(true, |c| a.category == c))
                .cloned()
                .collect()
        })
    }
}
