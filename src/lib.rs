// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! AINamify: bulk image renamer
//!
//! Names image files after captions produced by a local vision model,
//! keeping a CSV audit log of every rename, skip and failure.

pub mod audit;
pub mod config;
pub mod error;
pub mod input;
pub mod job;
pub mod naming;
pub mod ollama;
pub mod oracle;
pub mod validate;

pub use config::AppConfig;
pub use error::{NamifyError, Result};
