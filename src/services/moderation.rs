//! Image moderation service.
//!
//! Decoding and both detectors are CPU bound; callers run [`ModerationService::analyze`]
//! on a blocking thread (see the `/moderate` handler).

use crate::{
    config::ModerationConfig,
    error::AnalysisError,
    models::ModerationResult,
    services::{edges, skin},
};
use image::{ImageReader, Limits, RgbImage};
use std::io::Cursor;
use tracing::{debug, warn};

/// Heuristic classifier for uploaded images
#[derive(Clone, Debug)]
pub struct ModerationService {
    config: ModerationConfig,
}

impl ModerationService {
    pub fn new(config: ModerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    /// Classify raw image bytes. Undecodable input yields a `processing_error`
    /// result rather than an error.
    pub fn analyze(&self, bytes: &[u8]) -> ModerationResult {
        match self.decode(bytes) {
            Ok(image) => self.classify(&image),
            Err(reason) => {
                warn!(error = %reason, size = bytes.len(), "image analysis failed");
                ModerationResult::processing_error(format!("Image analysis failed: {reason}"))
            }
        }
    }

    /// Run every detector over a decoded image and merge their verdicts
    pub fn classify(&self, image: &RgbImage) -> ModerationResult {
        let config = &self.config;
        let skin = skin::detect(image, config.skin_ratio_threshold);
        let edges = edges::detect(
            image,
            config.edge_ratio_threshold,
            config.canny_low_threshold,
            config.canny_high_threshold,
        );

        debug!(
            width = image.width(),
            height = image.height(),
            skin_ratio = skin.skin_ratio,
            edge_ratio = edges.edge_ratio,
            "image analyzed"
        );

        let mut result = ModerationResult::safe();
        if skin.detected {
            result.flag_nudity(skin);
        }
        if edges.detected {
            result.flag_violence(edges);
        }
        result.finalize()
    }

    /// Decode to RGB after checking the header against the pixel budget.
    /// The detectors hold several full-size buffers, so the budget, not the
    /// upload size, is what bounds memory per request.
    fn decode(&self, bytes: &[u8]) -> Result<RgbImage, AnalysisError> {
        let (width, height) = self.reader(bytes)?.into_dimensions()?;
        let pixels = u64::from(width) * u64::from(height);
        let limit = self.config.max_image_pixels;
        if pixels > limit {
            return Err(AnalysisError::TooManyPixels {
                width,
                height,
                pixels,
                limit,
            });
        }

        Ok(self.reader(bytes)?.decode()?.to_rgb8())
    }

    fn reader<'a>(&self, bytes: &'a [u8]) -> Result<ImageReader<Cursor<&'a [u8]>>, image::ImageError> {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.config.max_image_dimension);
        limits.max_image_height = Some(self.config.max_image_dimension);
        // Room for the widest decoded layout (16-bit RGBA)
        limits.max_alloc = Some(self.config.max_image_pixels.saturating_mul(8));

        let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        reader.limits(limits);
        Ok(reader)
    }
}
