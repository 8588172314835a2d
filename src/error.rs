// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for AINamify

use thiserror::Error;

/// Result type alias for AINamify operations
pub type Result<T> = std::result::Result<T, NamifyError>;

/// AINamify error types
///
/// Per-file failures inside a batch never surface here; they are recorded
/// as [`crate::audit::Outcome`]s instead.
#[derive(Error, Debug)]
pub enum NamifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Caption oracle not available: {0}")]
    OracleUnavailable(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed audit log: {0}")]
    AuditFormat(String),

    #[error("A rename job is already running")]
    JobAlreadyRunning,

    #[error("Invalid job state: {0}")]
    InvalidState(String),

    #[error("No log content to save")]
    EmptyLog,

    #[error("No input: {0}")]
    NoInput(String),
}
