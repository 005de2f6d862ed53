//! Digest delivery.
//!
//! A [`DigestSink`] takes a rendered [`Digest`] to its readers. The run
//! records articles as sent only after `deliver` returns `Ok`.
//!
//! # Sinks
//!
//! - [`email::SmtpSink`]: mails the digest to the configured recipients
//! - [`json::JsonFileSink`]: writes JSON and HTML files, for dry runs
//!
//! # File Output Structure
//!
//! ```text
//! output_dir/
//! └── 2025-05-06/
//!     ├── digest.json
//!     └── digest.html
//! ```

use std::future::Future;

use crate::digest::Digest;
use crate::error::DeliveryError;

pub mod email;
pub mod json;

pub trait DigestSink: Send + Sync {
    fn deliver(&self, digest: &Digest) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// The sink chosen at startup.
#[derive(Debug)]
pub enum Delivery {
    Email(email::SmtpSink),
    Files(json::JsonFileSink),
}

impl DigestSink for Delivery {
    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        match self {
            Delivery::Email(sink) => sink.deliver(digest).await,
            Delivery::Files(sink) => sink.deliver(digest).await,
        }
    }
}
