//! Source roster orchestration.
//!
//! For every source, in roster order: fetch the front page, extract candidate
//! articles, keep those carrying a launch signal, and drop any whose URL is
//! already in the [`DedupStore`]. A source that fails to fetch, or whose
//! markup trips the extractor, is logged and the run moves on; only a store
//! failure aborts the run.
//!
//! Up to [`PipelineSettings::concurrency`] sources are scanned at once.
//! Results are reassembled in roster order.

use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt, TryStreamExt};
use itertools::Itertools;
use rand::{Rng, rng};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::classifier::{is_launch_signal, matched_signal};
use crate::config::{ExtractSettings, PipelineSettings};
use crate::digest::Digest;
use crate::error::{DedupError, PipelineError, RunError};
use crate::fetcher::{Fetch, PageFetcher};
use crate::models::{Article, SourceDescriptor};
use crate::outputs::DigestSink;
use crate::scrapers::{self, Extraction};
use crate::store::DedupStore;
use crate::utils::truncate_for_log;

/// What happened to one source during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Found {
        /// Articles the extractor produced.
        extracted: usize,
        /// Of those, how many carried a launch signal.
        launches: usize,
        /// Of those, how many were not delivered before.
        new: usize,
    },
    Failed {
        reason: String,
    },
    Skipped,
}

#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: String,
    pub status: SourceStatus,
}

/// New, qualifying articles from a run plus a per-source account.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub articles: Vec<Article>,
    pub reports: Vec<SourceReport>,
}

impl RunOutcome {
    pub fn failed_sources(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.status, SourceStatus::Failed { .. }))
            .count()
    }
}

#[derive(Debug)]
pub struct Pipeline<F = PageFetcher> {
    fetcher: F,
    store: DedupStore,
    sources: Vec<SourceDescriptor>,
    extract: ExtractSettings,
    settings: PipelineSettings,
}

impl<F: Fetch> Pipeline<F> {
    /// Assemble a pipeline over a fixed roster.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Downloads source front pages
    /// * `store` - Dedup store consulted per article and written after delivery
    /// * `sources` - Roster, scanned in order
    /// * `extract` - Block cap and description limit
    /// * `settings` - Concurrency, pacing and empty-digest behaviour
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let pipeline = Pipeline::new(
    ///     PageFetcher::new(&settings.fetch)?,
    ///     DedupStore::open(&settings.database_path).await?,
    ///     settings.sources.clone(),
    ///     settings.extract.clone(),
    ///     settings.pipeline.clone(),
    /// );
    /// let outcome = pipeline.run(Local::now().date_naive()).await?;
    /// ```
    pub fn new(
        fetcher: F,
        store: DedupStore,
        sources: Vec<SourceDescriptor>,
        extract: ExtractSettings,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            store,
            sources,
            extract,
            settings,
        }
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    async fn pace(&self) {
        let pacing = self.settings.pacing();
        if pacing.is_zero() {
            return;
        }
        let jitter_ms: u64 = rng().random_range(0..=250);
        sleep(pacing + Duration::from_millis(jitter_ms)).await;
    }

    /// Fetch, extract, classify and dedup one source.
    ///
    /// Sleeps for the pacing interval afterwards when `pace_after` is set,
    /// which the run leaves off for the final roster entry.
    #[instrument(level = "info", skip_all, fields(source = %source.name))]
    async fn scan_source(
        &self,
        source: &SourceDescriptor,
        run_date: NaiveDate,
        pace_after: bool,
    ) -> Result<(SourceReport, Vec<Article>), DedupError> {
        let report = |status| SourceReport {
            source: source.name.clone(),
            status,
        };

        if !source.enabled {
            info!("Source disabled; skipped");
            return Ok((report(SourceStatus::Skipped), Vec::new()));
        }

        info!(url = %source.base_url, "Scraping source");
        let page = match self.fetcher.fetch(&source.base_url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "Failed to fetch source");
                if pace_after {
                    self.pace().await;
                }
                return Ok((
                    report(SourceStatus::Failed {
                        reason: e.to_string(),
                    }),
                    Vec::new(),
                ));
            }
        };

        let Extraction { articles, fault } =
            scrapers::extract(&page, source, &self.extract, run_date);
        if let Some(fault) = fault {
            error!(error = %fault, "Extraction failed");
        }
        let extracted = articles.len();

        let launches = articles
            .into_iter()
            .filter(|article| is_launch_signal(&article.classification_text()))
            .inspect(|article| {
                debug!(
                    title = %truncate_for_log(&article.title, 80),
                    signal = ?matched_signal(&article.classification_text()),
                    "Launch signal"
                )
            })
            .unique_by(|article| article.url.clone())
            .collect::<Vec<_>>();
        let launch_count = launches.len();

        let mut fresh = Vec::with_capacity(launch_count);
        for article in launches {
            if self.store.seen(&article.url).await? {
                debug!(url = %article.url, "Already delivered");
            } else {
                fresh.push(article);
            }
        }

        info!(
            extracted,
            launches = launch_count,
            found = fresh.len(),
            "Found {} new articles",
            fresh.len()
        );
        if pace_after {
            self.pace().await;
        }

        Ok((
            report(SourceStatus::Found {
                extracted,
                launches: launch_count,
                new: fresh.len(),
            }),
            fresh,
        ))
    }

    /// Scan every source and return the newly qualified articles.
    ///
    /// Does not touch the store beyond membership checks, so repeated runs
    /// without an intervening delivery return the same articles.
    #[instrument(level = "info", skip_all, fields(%run_date))]
    pub async fn run(&self, run_date: NaiveDate) -> Result<RunOutcome, PipelineError> {
        let t0 = Instant::now();
        let last = self.sources.len().saturating_sub(1);
        let scans = self
            .sources
            .iter()
            .enumerate()
            .map(|(i, source)| self.scan_source(source, run_date, i < last))
            .collect::<Vec<_>>();
        let scanned = stream::iter(scans)
            .buffered(self.settings.concurrency.max(1))
            .try_collect::<Vec<_>>()
            .await?;

        let mut outcome = RunOutcome::default();
        for (report, articles) in scanned {
            debug!(source = %report.source, status = ?report.status, "Source outcome");
            outcome.reports.push(report);
            outcome.articles.extend(articles);
        }

        info!(
            sources = self.sources.len(),
            failed = outcome.failed_sources(),
            new_articles = outcome.articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Scan complete"
        );
        Ok(outcome)
    }

    /// Scan, deliver the digest through `sink`, and record what was delivered.
    ///
    /// Returns the number of new articles. Nothing is recorded unless
    /// delivery succeeds.
    #[instrument(level = "info", skip_all)]
    pub async fn run_once<S: DigestSink>(&self, sink: &S) -> Result<usize, RunError> {
        info!("Starting scrape and send");
        let run_date = Local::now().date_naive();
        let outcome = self.run(run_date).await?;
        let found = outcome.articles.len();

        if found == 0 && !self.settings.send_empty_digest {
            info!("No new articles; digest not sent");
            return Ok(0);
        }

        let digest = Digest::new(run_date, outcome.articles);
        if let Err(source) = sink.deliver(&digest).await {
            error!(error = %source, found, "Digest delivery failed; nothing recorded");
            return Err(RunError::Delivery { found, source });
        }

        for article in &digest.articles {
            self.store
                .record_sent(&article.url, &article.title, run_date, &article.source)
                .await
                .map_err(PipelineError::from)?;
        }

        info!(found, "Digest completed. Found {} new articles.", found);
        Ok(found)
    }
}
