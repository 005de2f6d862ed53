//! Runtime settings loaded from an optional YAML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration that scans the built-in roster of African tech-news
//! sites.
//!
//! ```yaml
//! database_path: ./sent_articles.db
//! schedule_at: "09:00"
//! fetch:
//!   timeout_secs: 15
//! pipeline:
//!   concurrency: 4
//! sources:
//!   - name: techcabal
//!     base_url: https://techcabal.com
//! ```

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::models::SourceDescriptor;

/// Browser-like client identity; several roster sites reject unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_path: String,
    /// Local wall-clock time of the daily run, `HH:MM`.
    pub schedule_at: String,
    pub fetch: FetchSettings,
    pub extract: ExtractSettings,
    pub pipeline: PipelineSettings,
    pub smtp: SmtpSettings,
    pub sources: Vec<SourceDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Upper bound on article containers examined per page.
    pub max_blocks: usize,
    /// Description length bound, in characters.
    pub description_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Politeness delay after each source, in milliseconds.
    pub pacing_ms: u64,
    /// Number of sources fetched at once.
    pub concurrency: usize,
    /// Mail a "nothing new" digest when a run finds no launches.
    pub send_empty_digest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub sender: Option<String>,
    pub password: Option<String>,
    pub recipients: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: "sent_articles.db".to_string(),
            schedule_at: "09:00".to_string(),
            fetch: FetchSettings::default(),
            extract: ExtractSettings::default(),
            pipeline: PipelineSettings::default(),
            smtp: SmtpSettings::default(),
            sources: default_sources(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            max_blocks: 15,
            description_limit: 300,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            pacing_ms: 1000,
            concurrency: 1,
            send_empty_digest: true,
        }
    }
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            server: "smtp.gmail.com".to_string(),
            port: 587,
            sender: None,
            password: None,
            recipients: Vec::new(),
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PipelineSettings {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(Path::new(path)).map_err(|source| {
                    ConfigError::Read {
                        path: path.to_string(),
                        source,
                    }
                })?;
                Self::from_yaml(&raw)?
            }
            None => Self::default(),
        };
        settings.validate()?;
        info!(
            sources = settings.sources.len(),
            database = %settings.database_path,
            schedule_at = %settings.schedule_at,
            "Loaded settings"
        );
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Check roster invariants and parse-ability of the schedule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::DuplicateSource(source.name.clone()));
            }
            let valid = Url::parse(&source.base_url)
                .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
                .unwrap_or(false);
            if !valid {
                return Err(ConfigError::InvalidBaseUrl {
                    name: source.name.clone(),
                    base_url: source.base_url.clone(),
                });
            }
        }
        if self.pipeline.concurrency == 0 {
            return Err(ConfigError::Concurrency);
        }
        self.schedule_time()?;
        Ok(())
    }

    /// Command-line and environment values win over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(database) = &cli.database {
            self.database_path = database.clone();
        }
        if let Some(sender) = &cli.sender_email {
            self.smtp.sender = Some(sender.clone());
        }
        if let Some(password) = &cli.sender_password {
            self.smtp.password = Some(password.clone());
        }
        if !cli.recipients.is_empty() {
            self.smtp.recipients = cli.recipients.clone();
        }
    }

    pub fn schedule_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.schedule_at, "%H:%M")
            .map_err(|_| ConfigError::Schedule(self.schedule_at.clone()))
    }
}

/// The built-in roster. Every site is a WordPress-style front page handled by
/// the generic extractor.
pub fn default_sources() -> Vec<SourceDescriptor> {
    [
        ("techcabal", "https://techcabal.com"),
        ("techpoint_africa", "https://techpoint.africa"),
        ("benjamindada", "https://www.benjamindada.com"),
        ("disrupt_africa", "https://disrupt-africa.com"),
        ("technext", "https://technext24.com"),
        ("techtrendske", "https://techtrendske.co.ke"),
        ("digest_africa", "https://digestafrica.com"),
        ("tech_moran", "https://techmoran.com"),
        ("innovation_village", "https://innovation-village.com"),
        ("startup_nigeria", "https://startupnigeria.org"),
        ("the_flip_africa", "https://theflip.africa"),
        ("tech_safari", "https://www.techsafari.africa"),
        ("ventureburn", "https://ventureburn.com"),
        ("wamda", "https://www.wamda.com"),
        ("startupbrics", "https://startupbrics.com"),
        ("tech_in_africa", "https://techinafrica.com"),
        ("baobab_insights", "https://baobabinsights.com"),
        ("weetracker", "https://weetracker.com"),
        ("techbuild_africa", "https://techbuild.africa"),
        ("founders_africa", "https://foundersafrica.com"),
        ("techeconomy", "https://techeconomy.ng"),
        ("techgh24", "https://techgh24.com"),
        ("technova_ghana", "https://technovagh.com"),
        ("african_business", "https://african.business"),
        ("iafrikan", "https://www.iafrikan.com"),
        ("zikoko_tech", "https://www.zikoko.com"),
    ]
    .into_iter()
    .map(|(name, url)| SourceDescriptor::new(name, url))
    .collect()
}
