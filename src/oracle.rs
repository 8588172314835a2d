// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Caption oracles: anything that can describe an image in words

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use image::GenericImageView;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::ollama::{model_matches, GenerateError, OllamaClient};
use crate::{NamifyError, Result};

/// Why a caption could not be produced for one image
#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("caption backend unreachable: {0}")]
    Unavailable(String),

    #[error("caption request timed out")]
    Timeout,

    #[error("caption backend rejected the image: {0}")]
    Rejected(String),

    #[error("caption backend returned no text")]
    Empty,

    #[error("image could not be prepared: {0}")]
    Image(String),
}

/// Source of image captions
#[async_trait]
pub trait CaptionOracle: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Confirm the oracle can serve requests before a job starts
    async fn check_available(&self) -> Result<()>;

    /// Describe the image at `path`
    async fn caption(&self, path: &Path) -> std::result::Result<String, CaptionError>;
}

/// Caption oracle backed by an Ollama vision model
pub struct OllamaCaptioner {
    client: OllamaClient,
    model: String,
    prompt: String,
    max_image_side: u32,
}

impl OllamaCaptioner {
    /// Create a captioner from engine settings
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = OllamaClient::new(&config.url, Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            client,
            model: config.model.clone(),
            prompt: config.prompt.clone(),
            max_image_side: config.max_image_side,
        })
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    /// Resize large images and re-encode as JPEG for upload
    fn prepare_image(path: &Path, max_side: u32) -> Result<Vec<u8>> {
        let img = image::open(path)?;
        let (width, height) = img.dimensions();
        debug!("Preparing {:?} ({}x{}) for upload", path, width, height);

        let img = if width > max_side || height > max_side {
            img.resize(max_side, max_side, image::imageops::FilterType::Triangle)
        } else {
            img
        };

        // JPEG has no alpha channel
        let img = image::DynamicImage::ImageRgb8(img.to_rgb8());

        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        img.write_to(&mut cursor, image::ImageFormat::Jpeg)?;

        Ok(buffer)
    }

    fn encode_image(&self, path: &Path) -> std::result::Result<String, CaptionError> {
        match Self::prepare_image(path, self.max_image_side) {
            Ok(data) => Ok(general_purpose::STANDARD.encode(&data)),
            Err(e) => {
                debug!("Falling back to raw bytes for {:?}: {}", path, e);
                let data = std::fs::read(path).map_err(|e| CaptionError::Image(e.to_string()))?;
                Ok(general_purpose::STANDARD.encode(&data))
            }
        }
    }
}

#[async_trait]
impl CaptionOracle for OllamaCaptioner {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn check_available(&self) -> Result<()> {
        info!("Checking Ollama availability at {}", self.client.base_url());
        self.client.health_check().await?;

        let models = self.client.list_models().await.map_err(|e| {
            NamifyError::OracleUnavailable(format!("Cannot list models: {}", e))
        })?;
        if !models.iter().any(|m| model_matches(m, &self.model)) {
            return Err(NamifyError::OracleUnavailable(format!(
                "Vision model '{}' not found. Available: {:?}",
                self.model, models
            )));
        }

        info!("Vision model '{}' available", self.model);
        Ok(())
    }

    async fn caption(&self, path: &Path) -> std::result::Result<String, CaptionError> {
        let image_data = self.encode_image(path)?;

        let text = self
            .client
            .generate_with_image(&self.model, &self.prompt, &image_data)
            .await
            .map_err(|e| match e {
                GenerateError::Transport(e) if e.is_timeout() => CaptionError::Timeout,
                GenerateError::Transport(e) => CaptionError::Unavailable(e.to_string()),
                GenerateError::Status(status) => {
                    CaptionError::Rejected(format!("Ollama returned status {}", status))
                }
            })?;

        let text = text.trim();
        if text.is_empty() {
            warn!("Vision model returned an empty caption for {:?}", path);
            return Err(CaptionError::Empty);
        }
        Ok(text.to_string())
    }
}

/// Oracle wrapper that reports itself available without asking.
///
/// Backend problems then surface as per-file caption errors.
pub struct SkipAvailabilityCheck {
    inner: Arc<dyn CaptionOracle>,
}

impl SkipAvailabilityCheck {
    pub fn new(inner: Arc<dyn CaptionOracle>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl CaptionOracle for SkipAvailabilityCheck {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn check_available(&self) -> Result<()> {
        debug!("Skipping availability check for {}", self.inner.name());
        Ok(())
    }

    async fn caption(&self, path: &Path) -> std::result::Result<String, CaptionError> {
        self.inner.caption(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_prepare_image_downsizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        image::RgbaImage::new(40, 10).save(&path).unwrap();

        let jpeg = OllamaCaptioner::prepare_image(&path, 20).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (20, 5));
    }

    #[test]
    fn test_prepare_image_keeps_small_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.png");
        image::RgbImage::new(8, 6).save(&path).unwrap();

        let jpeg = OllamaCaptioner::prepare_image(&path, 1024).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (8, 6));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        let mut config = AppConfig::default().ai_engine;
        // Port 9 (discard) is closed on test machines
        config.url = "http://127.0.0.1:9".to_string();
        config.timeout_secs = 2;
        let captioner = OllamaCaptioner::new(&config).unwrap();

        assert!(matches!(
            captioner.check_available().await,
            Err(NamifyError::OracleUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_skipped_check_still_captions_through_backend() {
        let mut config = AppConfig::default().ai_engine;
        config.url = "http://127.0.0.1:9".to_string();
        config.timeout_secs = 2;
        let oracle = SkipAvailabilityCheck::new(Arc::new(OllamaCaptioner::new(&config).unwrap()));

        assert_eq!(oracle.name(), "ollama");
        assert!(oracle.check_available().await.is_ok());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbImage::new(4, 4).save(&path).unwrap();
        assert!(matches!(
            oracle.caption(&path).await,
            Err(CaptionError::Unavailable(_) | CaptionError::Timeout)
        ));
    }
}
