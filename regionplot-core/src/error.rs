//! Error taxonomy for the regional-plot pipeline.
//!
//! Severity policy:
//! - `Config` and `Data` are fatal for the whole run and are reported before
//!   any locus is processed.
//! - `Resolution` is fatal for the current locus only; other loci continue.
//! - `Layout` is fatal for the current locus's annotation track only; the
//!   locus may still render without annotations.

use thiserror::Error;

/// Main error type shared by the regionplot crates.
#[derive(Error, Debug)]
pub enum RegionError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("data error: {message}")]
    Data { message: String },

    #[error("LD resolution error: {message}")]
    Resolution { message: String },

    #[error("annotation layout error: {message}")]
    Layout { message: String },
}

impl RegionError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn data<S: Into<String>>(message: S) -> Self {
        Self::Data { message: message.into() }
    }

    pub fn resolution<S: Into<String>>(message: S) -> Self {
        Self::Resolution { message: message.into() }
    }

    pub fn layout<S: Into<String>>(message: S) -> Self {
        Self::Layout { message: message.into() }
    }
}

/// Result type for core operations.
pub type RegionResult<T> = Result<T, RegionError>;
