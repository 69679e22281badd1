//! Provider abstraction for lottery draw sources.
//!
//! This module defines the [`ResultSource`] trait, which serves as a unified interface
//! for fetching draw results from a lottery operator's API.
//!
//! Each concrete source (such as [`lottery_rest::LotteryRestSource`]) implements
//! [`ResultSource`] to handle vendor-specific endpoints, authentication and throttling.
//!
//! The trait is designed for async usage and supports dynamic dispatch (`dyn ResultSource`)
//! so the backfill engine can be driven by a test double or by a live API.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use draw_ingestor::models::{
//!     date_range::DateRange,
//!     draw::{DrawId, DrawMap, DrawResult},
//!     statistics::OfficialStatistics,
//! };
//! use draw_ingestor::providers::{ProviderError, ResultSource};
//!
//! struct FixedSource;
//!
//! #[async_trait]
//! impl ResultSource for FixedSource {
//!     async fn fetch_by_date_range(&self, _range: DateRange) -> Result<DrawMap, ProviderError> {
//!         Ok(DrawMap::new())
//!     }
//!     async fn fetch_by_id(&self, id: DrawId) -> Result<DrawResult, ProviderError> {
//!         Ok(DrawResult::new(id, vec![1, 2, 3, 4, 5, 6], vec![]))
//!     }
//!     async fn fetch_active_draw(&self) -> Result<DrawResult, ProviderError> {
//!         self.fetch_by_id(1).await
//!     }
//!     async fn fetch_official_statistics(&self) -> Result<OfficialStatistics, ProviderError> {
//!         Ok(OfficialStatistics::default())
//!     }
//! }
//! ```

pub mod lottery_rest;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{
    date_range::DateRange,
    draw::{DrawId, DrawMap, DrawResult},
    statistics::OfficialStatistics,
};

/// Trait for fetching draw results from a lottery operator.
///
/// Every method fails independently; a failure for one id says nothing about
/// any other id.
#[async_trait]
pub trait ResultSource: Send + Sync {
    /// Fetches every draw held within the inclusive date window.
    async fn fetch_by_date_range(&self, range: DateRange) -> Result<DrawMap, ProviderError>;

    /// Fetches a single draw by id.
    async fn fetch_by_id(&self, id: DrawId) -> Result<DrawResult, ProviderError>;

    /// Fetches the currently active (latest) draw. Its id is the upper bound of
    /// the full id range.
    async fn fetch_active_draw(&self) -> Result<DrawResult, ProviderError>;

    /// Fetches the operator's published number statistics.
    async fn fetch_official_statistics(&self) -> Result<OfficialStatistics, ProviderError>;
}

/// Errors that can occur during the creation of a source instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// A configured environment variable is missing.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid base URL {base_url:?}: {message}"))]
    InvalidBaseUrl {
        base_url: String,
        message: String,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `ResultSource` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout, undecodable body).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The API answered with a non-success status.
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this source.
    #[snafu(display("Invalid parameters for source: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// The API answered with a different draw than the one requested.
    #[snafu(display("Requested draw {requested} but the API returned draw {returned}"))]
    UnexpectedDraw {
        requested: DrawId,
        returned: DrawId,
        backtrace: Backtrace,
    },

    /// An error during source configuration or initialization.
    #[snafu(display("Source initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}
