//! Error types for the `subrender` crate.
//!
//! This module defines [`SubRenderError`], the unified error type returned
//! by the crate's fallible operations. The render path itself never returns
//! errors: an unavailable rasterization engine and malformed scripts both
//! degrade to empty output, and caller contract violations are debug
//! assertions. What remains are the surrounding concerns: reading script
//! files, validating CLI input, and exporting images.

use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use thiserror::Error;

/// The unified error type for all `subrender` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubRenderError {
    /// A subtitle script file could not be read.
    #[error("Failed to read script at {path}: {reason}")]
    ScriptRead {
        /// Path to the script file.
        path: PathBuf,
        /// Underlying reason the read failed.
        reason: String,
    },

    /// An overlay geometry argument could not be parsed or is degenerate.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A timestamp argument could not be parsed.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A presentation parameter is out of range or could not be parsed.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during overlay export.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}
