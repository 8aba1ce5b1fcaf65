use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Editorial category of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Nutrition,
    Recette,
    #[serde(rename = "Santé")]
    Sante,
    Budget,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Nutrition,
        Category::Recette,
        Category::Sante,
        Category::Budget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Nutrition => "Nutrition",
            Category::Recette => "Recette",
            Category::Sante => "Santé",
            Category::Budget => "Budget",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "nutrition" => Ok(Category::Nutrition),
            "recette" => Ok(Category::Recette),
            "santé" | "sante" => Ok(Category::Sante),
            "budget" => Ok(Category::Budget),
            other => Err(Error::Invalid(format!("Unknown category '{}'", other))),
        }
    }
}

/// A blog article. Field names on disk follow the site's original French schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    #[serde(rename = "titre")]
    pub title: String,
    pub description: String,
    #[serde(rename = "contenu_markdown")]
    pub content_markdown: String,
    #[serde(rename = "categorie")]
    pub category: Category,
    #[serde(rename = "date_publication")]
    pub published_on: NaiveDate,
    #[serde(rename = "auteur")]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "temps_lecture")]
    pub reading_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Article {
    /// Check the fields the admin editor requires before saving
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("article id is required".to_string()));
        }

        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.author.trim().is_empty() {
            missing.push("author");
        }
        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "required fields are empty: {}",
                missing.join(", ")
            )));
        }

        if let Some(image_url) = self.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
            url::Url::parse(image_url)
                .map_err(|e| Error::InvalidUrl(format!("{}: {}", image_url, e)))?;
        }

        Ok(())
    }

    /// Blank image URLs coming from the editor are stored as absent
    pub fn normalized(mut self) -> Self {
        if self
            .image_url
            .as_deref()
            .map(|u| u.trim().is_empty())
            .unwrap_or(false)
        {
            self.image_url = None;
        }
        self
    }

    /// Case-insensitive match on title, description or any tag
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self
                .tags
                .iter()
                .flatten()
                .any(|tag| tag.to_lowercase().contains(&query))
    }

    /// Render the markdown body to HTML for the detail page
    pub fn render_html(&self) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let parser = Parser::new_ext(&self.content_markdown, options);
        let mut output = String::with_capacity(self.content_markdown.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}
