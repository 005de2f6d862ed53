//! Long-lived state shared by the scheduler task and the HTTP endpoints.

use chrono::{DateTime, Local, NaiveTime};
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::config::Settings;
use crate::error::RunError;
use crate::fetcher::{Fetch, PageFetcher};
use crate::outputs::email::SmtpSink;
use crate::outputs::json::JsonFileSink;
use crate::outputs::{Delivery, DigestSink};
use crate::pipeline::Pipeline;
use crate::scheduler::next_run;
use crate::store::DedupStore;

#[derive(Debug)]
pub struct AppContext<F = PageFetcher, S = Delivery> {
    pub pipeline: Pipeline<F>,
    pub sink: S,
    pub schedule_at: NaiveTime,
    /// Where the rolling log file lives.
    pub log_dir: PathBuf,
}

impl AppContext {
    /// Open the store, build the HTTP client and pick the digest sink.
    ///
    /// # Arguments
    ///
    /// * `settings` - Loaded settings with command-line overrides applied
    /// * `output_dir` - When set, digests are written to disk and SMTP
    ///   settings are not consulted
    /// * `log_dir` - Directory of the rolling log file
    ///
    /// # Returns
    ///
    /// The context, or the first store, HTTP client, sink or schedule error.
    #[instrument(level = "info", skip(settings))]
    pub async fn build(
        settings: &Settings,
        output_dir: Option<&str>,
        log_dir: &str,
    ) -> Result<Self, Box<dyn Error>> {
        let store = DedupStore::open(&settings.database_path).await?;
        let fetcher = PageFetcher::new(&settings.fetch)?;
        let sink = match output_dir {
            Some(dir) => Delivery::Files(JsonFileSink::new(dir)),
            None => Delivery::Email(SmtpSink::new(&settings.smtp)?),
        };
        info!(?sink, "Digest sink ready");

        Ok(Self {
            pipeline: Pipeline::new(
                fetcher,
                store,
                settings.sources.clone(),
                settings.extract,
                settings.pipeline.clone(),
            ),
            sink,
            schedule_at: settings.schedule_time()?,
            log_dir: PathBuf::from(log_dir),
        })
    }
}

impl<F: Fetch, S: DigestSink> AppContext<F, S> {
    pub async fn run_once(&self) -> Result<usize, RunError> {
        self.pipeline.run_once(&self.sink).await
    }

    pub fn next_run(&self) -> DateTime<Local> {
        next_run(Local::now(), self.schedule_at)
    }
}
