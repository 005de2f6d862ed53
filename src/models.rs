//! Data models shared across the pipeline.
//!
//! - [`Article`]: a candidate story extracted from a source's front page
//! - [`SentArticleRecord`]: a row of the sent-articles table
//! - [`SourceDescriptor`]: one entry of the source roster
//! - [`ParserKind`]: which extractor handles a source's markup

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::source_label;

/// A story extracted from a news site's front page.
///
/// Built by the extractor, filtered by the orchestrator and read-only after
/// classification. `url` is always absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Headline text.
    pub title: String,
    /// Canonical absolute URL of the story.
    pub url: String,
    /// Excerpt, bounded in length and suffixed with `...` when cut.
    pub description: String,
    /// Human-readable site label, e.g. `"Techpoint Africa"`.
    pub source: String,
    /// Publication date as found on the page, or the run date.
    pub date: String,
}

impl Article {
    /// Text the launch classifier looks at: title and description.
    pub fn classification_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// A delivered article as persisted in the dedup store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SentArticleRecord {
    pub url: String,
    pub title: String,
    pub sent_date: NaiveDate,
    pub source: String,
}

/// Markup handler for a source.
///
/// Only the generic front-page extractor exists today; per-site variants
/// would be added here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    #[default]
    Generic,
}

/// A news site in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Unique identifier, e.g. `techpoint_africa`.
    pub name: String,
    /// Front page URL, also the base for resolving relative links.
    pub base_url: String,
    #[serde(default)]
    pub parser: ParserKind,
    /// Display label; derived from `name` when absent.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SourceDescriptor {
    pub fn new(name: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            parser: ParserKind::Generic,
            label: None,
            enabled: true,
        }
    }

    /// The label written into [`Article::source`].
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| source_label(&self.name))
    }

    /// Scheme and host of `base_url`, the root that `/path` links resolve against.
    pub fn origin(&self) -> Result<Url, url::ParseError> {
        let base = Url::parse(&self.base_url)?;
        let mut origin = base.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);
        Ok(origin)
    }
}
