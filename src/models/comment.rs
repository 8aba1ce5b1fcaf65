use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub article_id: String,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A visitor submission, before the store assigns an id and timestamp
#[derive(Debug, Clone)]
pub struct NewComment {
    pub article_id: String,
    pub author_name: String,
    pub content: String,
}

impl NewComment {
    pub fn new(
        article_id: impl Into<String>,
        author_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            article_id: article_id.into(),
            author_name: author_name.into(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.article_id.trim().is_empty() {
            return Err(Error::Validation("comment needs an article id".to_string()));
        }
        if self.author_name.trim().is_empty() {
            return Err(Error::Validation("comment author is required".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(Error::Validation("comment content is required".to_string()));
        }
        Ok(())
    }

    pub fn into_comment(self, id: String, created_at: DateTime<Utc>) -> Comment {
        Comment {
            id,
            article_id: self.article_id.trim().to_string(),
            author_name: self.author_name.trim().to_string(),
            content: self.content.trim().to_string(),
            created_at,
        }
    }
}
