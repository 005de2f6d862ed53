//! Article extraction from fetched front pages.
//!
//! Each roster entry names a [`ParserKind`]; [`extract`] dispatches on it.
//!
//! | Parser | Module | Used by |
//! |--------|--------|---------|
//! | Generic | [`generic`] | every built-in source (WordPress-style front pages) |
//!
//! Extractors never fail outright. They return whatever they collected plus,
//! when the page could not be walked, the [`ExtractionFault`] saying why.

use chrono::NaiveDate;

use crate::config::ExtractSettings;
use crate::error::ExtractionFault;
use crate::fetcher::Page;
use crate::models::{Article, ParserKind, SourceDescriptor};

pub mod generic;

/// Articles found on one page, and the fault that prevented extraction, if any.
#[derive(Debug)]
pub struct Extraction {
    pub articles: Vec<Article>,
    pub fault: Option<ExtractionFault>,
}

/// Extract candidate articles from `page` using the source's parser.
pub fn extract(
    page: &Page,
    source: &SourceDescriptor,
    limits: &ExtractSettings,
    run_date: NaiveDate,
) -> Extraction {
    match source.parser {
        ParserKind::Generic => generic::extract(page, source, limits, run_date),
    }
}
