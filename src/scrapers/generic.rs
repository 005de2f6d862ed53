//! Front-page extractor for WordPress-style news sites.
//!
//! Works without knowing the site's markup. Each field is found through an
//! ordered chain of CSS selectors, most specific or most common first, and
//! the first non-empty match wins:
//!
//! 1. **Containers**: the first selector that matches anything supplies the
//!    article blocks, capped at [`ExtractSettings::max_blocks`].
//! 2. **Title**: headings and title classes inside the block. Blocks without
//!    one are skipped.
//! 3. **URL**: a link under the title element, else any link in the block.
//!    `/path` links resolve against the source's scheme and host. Blocks
//!    without a usable link are skipped.
//! 4. **Description**: content/excerpt classes, then the first paragraph,
//!    bounded by [`ExtractSettings::description_limit`].
//! 5. **Date**: a `datetime` attribute is preferred over the visible text;
//!    the run date is used when nothing is found.
//!
//! A link that cannot be parsed skips its block like a missing link does.
//! Only a `base_url` that is itself unusable is an [`ExtractionFault`]; no
//! link on such a page can be resolved.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use super::Extraction;
use crate::config::ExtractSettings;
use crate::error::ExtractionFault;
use crate::fetcher::Page;
use crate::models::{Article, SourceDescriptor};
use crate::utils::{normalize_whitespace, truncate_chars};

fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter()
        .map(|s| Selector::parse(s).expect("static selector parses"))
        .collect()
}

static CONTAINER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        "article",
        ".post",
        ".entry",
        ".content-item",
        ".post-item",
        ".article-item",
        ".blog-post",
        "[class*=\"post\"]",
        "[class*=\"article\"]",
    ])
});

static TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        "h1",
        "h2",
        "h3",
        ".entry-title",
        ".post-title",
        ".article-title",
        ".title",
    ])
});

static DESCRIPTION_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        ".entry-content",
        ".post-content",
        ".excerpt",
        ".summary",
        ".description",
        "p",
    ])
});

static DATE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&["time", ".date", ".post-date", ".entry-date", "[datetime]"])
});

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector parses"));

/// Visible text of an element with whitespace collapsed.
///
/// Text nodes are concatenated as-is: they carry their own spacing, so
/// `Fin<b>tech</b>` reads `Fintech`.
fn element_text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

/// First element under `scope` matched by the earliest selector in `chain`
/// whose text is non-empty.
fn first_text<'a>(scope: ElementRef<'a>, chain: &[Selector]) -> Option<(ElementRef<'a>, String)> {
    chain.iter().find_map(|sel| {
        scope.select(sel).find_map(|el| {
            let text = element_text(el);
            (!text.is_empty()).then_some((el, text))
        })
    })
}

/// Pick the article containers: all matches of the first selector that
/// matches anything, up to `max`.
fn find_blocks<'a>(document: &'a Html, max: usize) -> Vec<ElementRef<'a>> {
    CONTAINER_SELECTORS
        .iter()
        .map(|sel| document.select(sel).take(max).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

/// Link for a block: the title itself when it is an anchor, a link under the
/// title, then any link in the block.
fn find_href<'a>(title: ElementRef<'a>, block: ElementRef<'a>) -> Option<&'a str> {
    if title.value().name() == "a" {
        if let Some(href) = title.value().attr("href") {
            return Some(href);
        }
    }
    title
        .select(&LINK_SELECTOR)
        .next()
        .or_else(|| block.select(&LINK_SELECTOR).next())
        .and_then(|a| a.value().attr("href"))
}

/// Turn an href into an absolute http(s) URL.
///
/// `Ok(None)` means the link is not an article link (empty, in-page anchor,
/// `mailto:`, `javascript:` ...). `Err` means the href is malformed; the
/// caller skips the block either way.
fn resolve_href(href: &str, origin: &Url, base: &Url) -> Result<Option<String>, url::ParseError> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return Ok(None);
    }
    let resolved = if href.starts_with('/') {
        origin.join(href)?
    } else {
        match Url::parse(href) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => base.join(href)?,
            Err(e) => return Err(e),
        }
    };
    match resolved.scheme() {
        "http" | "https" => Ok(Some(resolved.to_string())),
        _ => Ok(None),
    }
}

fn find_date(block: ElementRef<'_>) -> Option<String> {
    DATE_SELECTORS.iter().find_map(|sel| {
        block.select(sel).find_map(|el| {
            let machine = el
                .value()
                .attr("datetime")
                .map(str::trim)
                .filter(|s| !s.is_empty());
            match machine {
                Some(value) => Some(value.to_string()),
                None => Some(element_text(el)).filter(|s| !s.is_empty()),
            }
        })
    })
}

struct BlockContext<'s> {
    origin: Url,
    base: Url,
    label: String,
    limits: &'s ExtractSettings,
    run_date: NaiveDate,
}

fn extract_block(index: usize, block: ElementRef<'_>, ctx: &BlockContext<'_>) -> Option<Article> {
    let Some((title_el, title)) = first_text(block, &TITLE_SELECTORS) else {
        debug!(block = index, "No title; skipping block");
        return None;
    };

    let Some(href) = find_href(title_el, block) else {
        debug!(block = index, %title, "No link; skipping block");
        return None;
    };
    let url = match resolve_href(href, &ctx.origin, &ctx.base) {
        Ok(Some(url)) => url,
        Ok(None) => {
            debug!(block = index, href, "Unusable link; skipping block");
            return None;
        }
        Err(e) => {
            debug!(block = index, href, error = %e, "Malformed link; skipping block");
            return None;
        }
    };

    let description = first_text(block, &DESCRIPTION_SELECTORS)
        .map(|(_, text)| truncate_chars(&text, ctx.limits.description_limit))
        .unwrap_or_default();

    let date = find_date(block).unwrap_or_else(|| ctx.run_date.format("%Y-%m-%d").to_string());

    Some(Article {
        title,
        url,
        description,
        source: ctx.label.clone(),
        date,
    })
}

/// Extract candidate articles from a front page.
///
/// # Arguments
///
/// * `page` - The fetched front page
/// * `source` - Roster entry; its `base_url` resolves relative links and its
///   label is stamped on every article
/// * `limits` - Block cap and description length bound
/// * `run_date` - Date given to articles whose block shows none
///
/// # Returns
///
/// Every article found, in page order. The fault is set only when the
/// source's `base_url` cannot be parsed, in which case no articles are
/// returned. A page without recognizable article blocks yields an empty,
/// fault-free [`Extraction`].
///
/// # Examples
///
/// ```ignore
/// let page = fetcher.fetch(&source.base_url).await?;
/// let found = extract(&page, &source, &settings.extract, Local::now().date_naive());
/// let launches = found.articles.into_iter().filter(|a| is_launch_signal(&a.title));
/// ```
#[instrument(level = "debug", skip_all, fields(source = %source.name, url = %page.url))]
pub fn extract(
    page: &Page,
    source: &SourceDescriptor,
    limits: &ExtractSettings,
    run_date: NaiveDate,
) -> Extraction {
    let parsed = source
        .origin()
        .and_then(|origin| Url::parse(&source.base_url).map(|base| (origin, base)));
    let (origin, base) = match parsed {
        Ok(pair) => pair,
        Err(e) => {
            return Extraction {
                articles: Vec::new(),
                fault: Some(ExtractionFault::BaseUrl {
                    base: source.base_url.clone(),
                    source: e,
                }),
            };
        }
    };
    let ctx = BlockContext {
        origin,
        base,
        label: source.display_label(),
        limits,
        run_date,
    };

    let document = Html::parse_document(&page.body);
    let blocks = find_blocks(&document, limits.max_blocks);
    debug!(blocks = blocks.len(), "Candidate article blocks");

    let articles = blocks
        .into_iter()
        .enumerate()
        .filter_map(|(index, block)| extract_block(index, block, &ctx))
        .collect::<Vec<_>>();
    Extraction {
        articles,
        fault: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::TRUNCATION_MARKER;

    fn page(body: &str) -> Page {
        Page {
            url: "https://example.test".to_string(),
            body: body.to_string(),
        }
    }

    fn source() -> SourceDescriptor {
        SourceDescriptor::new("example_news", "https://example.test")
    }

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    fn run(body: &str) -> Extraction {
        extract(&page(body), &source(), &ExtractSettings::default(), run_date())
    }

    #[test]
    fn test_no_containers_is_empty_not_error() {
        let result = run("<html><body><div>Nothing to see</div></body></html>");
        assert!(result.articles.is_empty());
        assert!(result.fault.is_none());
    }

    #[test]
    fn test_relative_url_resolution() {
        let result = run(r#"
            <article>
              <h2><a href="/posts/42">Acme launches its new app</a></h2>
              <p>In Lagos.</p>
            </article>
        "#);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.articles[0].url, "https://example.test/posts/42");
    }

    #[test]
    fn test_leading_slash_resolves_against_host_not_base_path() {
        let source = SourceDescriptor::new("x", "https://example.test/africa/");
        let result = extract(
            &page(r#"<article><h2><a href="/posts/7">T</a></h2></article>"#),
            &source,
            &ExtractSettings::default(),
            run_date(),
        );
        assert_eq!(result.articles[0].url, "https://example.test/posts/7");
    }

    #[test]
    fn test_full_article_fields() {
        let result = run(r#"
            <article class="post">
              <h2 class="entry-title"><a href="https://example.test/a">  Paystack unveils
                  checkout </a></h2>
              <time datetime="2025-05-01T09:00:00+01:00">May 1</time>
              <div class="excerpt">A new way to pay.</div>
            </article>
        "#);
        let article = &result.articles[0];
        assert_eq!(article.title, "Paystack unveils checkout");
        assert_eq!(article.url, "https://example.test/a");
        assert_eq!(article.description, "A new way to pay.");
        assert_eq!(article.source, "Example News");
        assert_eq!(article.date, "2025-05-01T09:00:00+01:00");
    }

    #[test]
    fn test_date_text_when_no_attribute() {
        let result = run(r#"
            <article><h2><a href="/a">T</a></h2><span class="date">May 2, 2025</span></article>
        "#);
        assert_eq!(result.articles[0].date, "May 2, 2025");
    }

    #[test]
    fn test_date_defaults_to_run_date() {
        let result = run(r#"<article><h2><a href="/a">T</a></h2></article>"#);
        assert_eq!(result.articles[0].date, "2025-05-06");
    }

    #[test]
    fn test_block_without_title_is_skipped() {
        let result = run(r#"
            <article><a href="/a">no heading here</a></article>
            <article><h3><a href="/b">Has a title</a></h3></article>
        "#);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.articles[0].title, "Has a title");
    }

    #[test]
    fn test_block_without_link_is_skipped() {
        let result = run(r#"
            <article><h2>Orphan headline</h2><p>text</p></article>
            <article><h2>Linked</h2><a href="/b">more</a></article>
        "#);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.articles[0].url, "https://example.test/b");
    }

    #[test]
    fn test_title_link_preferred_over_block_link() {
        let result = run(r#"
            <article>
              <a href="/category/fintech">Fintech</a>
              <h2><a href="/story">Story</a></h2>
            </article>
        "#);
        assert_eq!(result.articles[0].url, "https://example.test/story");
    }

    #[test]
    fn test_non_http_links_are_skipped() {
        let result = run(r##"
            <article><h2><a href="javascript:void(0)">A</a></h2></article>
            <article><h2><a href="mailto:desk@example.test">B</a></h2></article>
            <article><h2><a href="#top">C</a></h2></article>
        "##);
        assert!(result.articles.is_empty());
        assert!(result.fault.is_none());
    }

    #[test]
    fn test_container_fallback_to_class_selector() {
        let result = run(r#"
            <div class="post-item"><h3><a href="/x">Only post items</a></h3></div>
        "#);
        assert_eq!(result.articles.len(), 1);
    }

    #[test]
    fn test_first_matching_container_selector_wins() {
        let result = run(r#"
            <article><h2><a href="/from-article">A</a></h2></article>
            <div class="post"><h2><a href="/from-post">B</a></h2></div>
        "#);
        assert_eq!(result.articles.len(), 1);
        assert_eq!(result.articles[0].url, "https://example.test/from-article");
    }

    #[test]
    fn test_block_cap() {
        let body = (0..20)
            .map(|i| format!(r#"<article><h2><a href="/p/{i}">Post {i}</a></h2></article>"#))
            .collect::<String>();
        let result = run(&body);
        assert_eq!(result.articles.len(), 15);
        assert_eq!(result.articles[14].url, "https://example.test/p/14");
    }

    #[test]
    fn test_description_truncated_with_marker() {
        let long = "word ".repeat(100);
        let result = run(&format!(
            r#"<article><h2><a href="/a">T</a></h2><p>{long}</p></article>"#
        ));
        let description = &result.articles[0].description;
        assert!(description.ends_with(TRUNCATION_MARKER));
        assert!(description.chars().count() <= 300 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_short_description_verbatim() {
        let result = run(r#"<article><h2><a href="/a">T</a></h2><p>Short.</p></article>"#);
        assert_eq!(result.articles[0].description, "Short.");
    }

    #[test]
    fn test_malformed_links_skip_only_their_block() {
        let result = run(r#"
            <article><h2><a href="/first">Acme launches A</a></h2></article>
            <article><h2><a href="http://">Empty host</a></h2></article>
            <article><h2><a href="/third">Acme launches C</a></h2></article>
            <article><h2><a href="//[oops/x">Bad host</a></h2></article>
            <article><h2><a href="http://exa mple.com/x">Space in host</a></h2></article>
            <article><h2><a href="/sixth">Acme launches F</a></h2></article>
        "#);
        let titles = result.articles.iter().map(|a| a.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Acme launches A", "Acme launches C", "Acme launches F"]);
        assert_eq!(result.articles[1].url, "https://example.test/third");
        assert!(result.fault.is_none());
    }

    #[test]
    fn test_inline_markup_keeps_words_whole() {
        let result = run(r#"
            <article>
              <h2><a href="/p">Fin<b>tech</b> firm Paystack</a>, now live</h2>
              <p>It <em>launch</em>es today, un<b>veil</b>ing a
                 new <i>card</i>.</p>
            </article>
        "#);
        let article = &result.articles[0];
        assert_eq!(article.title, "Fintech firm Paystack, now live");
        assert_eq!(article.description, "It launches today, unveiling a new card.");
        assert!(crate::classifier::is_launch_signal(&article.classification_text()));
    }

    #[test]
    fn test_unusable_base_url_is_a_fault() {
        let source = SourceDescriptor::new("bad", "not a url");
        let result = extract(
            &page("<article><h2><a href='/a'>T</a></h2></article>"),
            &source,
            &ExtractSettings::default(),
            run_date(),
        );
        assert!(result.articles.is_empty());
        assert!(matches!(result.fault, Some(ExtractionFault::BaseUrl { .. })));
    }

    #[test]
    fn test_path_relative_link_resolves_against_base() {
        let source = SourceDescriptor::new("x", "https://example.test/news/");
        let result = extract(
            &page(r#"<article><h2><a href="story-1">T</a></h2></article>"#),
            &source,
            &ExtractSettings::default(),
            run_date(),
        );
        assert_eq!(result.articles[0].url, "https://example.test/news/story-1");
    }
}
