//! Unified error handling for the weekly-report crate
//!
//! This module provides a unified error type that consolidates the
//! domain-specific errors into a single `Error` enum, while keeping the
//! domain errors available to callers that need them.
//!
//! # Architecture
//!
//! - [`ReportErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use thiserror::Error;

pub use crate::analytics::AnalysisError;
pub use crate::notifications::ChannelError;
pub use crate::storage::SnapshotError;
pub use crate::utils::error::{FetchError, PayloadError};

/// Common trait for weekly-report error types
pub trait ReportErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Feed payload decoding errors
    Parsing,
    /// Snapshot and I/O errors
    Storage,
    /// Ranking and window analysis errors
    Analysis,
    /// Chat delivery errors
    Delivery,
    /// Configuration and validation errors
    Config,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Analysis => "analysis",
            Self::Delivery => "delivery",
            Self::Config => "config",
        }
    }
}

/// Unified error type for the weekly-report crate
#[derive(Error, Debug)]
pub enum Error {
    /// An upstream feed could not be fetched
    #[error("Fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    /// A feed arrived empty or malformed; the run stops without a report
    #[error("No data: {0}")]
    NoData(#[from] PayloadError),

    /// Analysis errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Report delivery errors
    #[error("Delivery error: {0}")]
    Delivery(#[from] ChannelError),

    /// Snapshot persistence errors
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl ReportErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::FetchFailed(e) => e.is_recoverable(),
            Self::Delivery(e) => e.is_recoverable(),
            Self::NoData(_) | Self::Analysis(_) | Self::Snapshot(_) | Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::FetchFailed(_) => ErrorCategory::Network,
            Self::NoData(_) => ErrorCategory::Parsing,
            Self::Analysis(_) => ErrorCategory::Analysis,
            Self::Delivery(ChannelError::InvalidConfig(_)) => ErrorCategory::Config,
            Self::Delivery(_) => ErrorCategory::Delivery,
            Self::Snapshot(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
