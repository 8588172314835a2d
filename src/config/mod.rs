// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for AINamify

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::job::NamingRules;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Caption backend configuration
    pub ai_engine: EngineConfig,

    /// Filename rules
    #[serde(default)]
    pub naming: NamingConfig,

    /// Audit log settings
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    pub url: String,
    pub model: String,
    #[serde(default = "default_caption_prompt")]
    pub prompt: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Images larger than this on either side are downsized before upload
    #[serde(default = "default_max_image_side")]
    pub max_image_side: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NamingConfig {
    #[serde(default)]
    pub append_date: bool,
    #[serde(default = "default_token_length")]
    pub token_length: usize,
    #[serde(default = "default_collision_retries")]
    pub collision_retries: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_true")]
    pub auto_save: bool,
}

// Default value functions
fn default_timeout() -> u64 { 120 }
fn default_max_image_side() -> u32 { 1024 }
fn default_token_length() -> usize { 5 }
fn default_collision_retries() -> u32 { 5 }
fn default_true() -> bool { true }
fn default_log_directory() -> String { ".".to_string() }
fn default_log_prefix() -> String { "AINamify_log".to_string() }

fn default_caption_prompt() -> String {
    "Describe this image in one short sentence. \
     Return ONLY the description.".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_engine: EngineConfig {
                url: "http://localhost:11434".to_string(),
                model: "moondream".to_string(),
                prompt: default_caption_prompt(),
                timeout_secs: default_timeout(),
                max_image_side: default_max_image_side(),
            },
            naming: NamingConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            append_date: false,
            token_length: default_token_length(),
            collision_retries: default_collision_retries(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file_prefix: default_log_prefix(),
            auto_save: true,
        }
    }
}

impl NamingConfig {
    /// Rules handed to a batch job
    pub fn rules(&self) -> NamingRules {
        NamingRules {
            token_length: self.token_length,
            collision_retries: self.collision_retries,
        }
    }
}

impl LogConfig {
    /// Directory audit logs are written to
    pub fn directory(&self) -> PathBuf {
        PathBuf::from(&self.directory)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::NamifyError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values no job can run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.naming.token_length == 0 {
            return Err(crate::NamifyError::Config(
                "naming.token_length must be at least 1".to_string(),
            ));
        }
        if self.ai_engine.model.trim().is_empty() {
            return Err(crate::NamifyError::Config(
                "ai_engine.model must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
