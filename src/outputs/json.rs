//! File output for digests.
//!
//! Writes `{output_dir}/{date}/digest.json` and `digest.html`. Used for dry
//! runs and for deployments that publish the files elsewhere.

use tokio::fs;
use tracing::{error, info, instrument};

use super::DigestSink;
use crate::digest::Digest;
use crate::error::DeliveryError;

#[derive(Debug, Clone)]
pub struct JsonFileSink {
    output_dir: String,
}

impl JsonFileSink {
    pub fn new(output_dir: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl DigestSink for JsonFileSink {
    #[instrument(level = "info", skip_all, fields(output_dir = %self.output_dir))]
    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        let json = serde_json::to_string_pretty(digest)?;

        let full_dir = format!(
            "{}/{}",
            self.output_dir.trim_end_matches('/'),
            digest.date.format("%Y-%m-%d")
        );
        info!(%full_dir, "Ensuring digest directory exists");
        if let Err(e) = fs::create_dir_all(&full_dir).await {
            error!(%full_dir, error = %e, "Failed to create digest dir");
            return Err(e.into());
        }

        let json_path = format!("{full_dir}/digest.json");
        fs::write(&json_path, json).await?;
        let html_path = format!("{full_dir}/digest.html");
        fs::write(&html_path, digest.to_html()).await?;
        info!(json = %json_path, html = %html_path, articles = digest.articles.len(), "Wrote digest files");

        Ok(())
    }
}
