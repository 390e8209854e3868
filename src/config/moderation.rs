//! Image moderation configuration.

use super::env_or;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Upload limits and detector thresholds
#[derive(Clone, Debug)]
pub struct ModerationConfig {
    pub max_upload_bytes: usize,
    /// Largest accepted width or height after decoding
    pub max_image_dimension: u32,
    /// Largest accepted width × height; bounds decoder and detector memory
    pub max_image_pixels: u64,
    pub skin_ratio_threshold: f64,
    pub edge_ratio_threshold: f64,
    pub canny_low_threshold: u32,
    pub canny_high_threshold: u32,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_image_dimension: 16_384,
            max_image_pixels: 24_000_000,
            skin_ratio_threshold: 0.3,
            edge_ratio_threshold: 0.15,
            canny_low_threshold: 50,
            canny_high_threshold: 150,
        }
    }
}

impl ModerationConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut config = Self {
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            max_image_dimension: env_or("MAX_IMAGE_DIMENSION", defaults.max_image_dimension),
            max_image_pixels: env_or("MAX_IMAGE_PIXELS", defaults.max_image_pixels),
            skin_ratio_threshold: env_or("SKIN_RATIO_THRESHOLD", defaults.skin_ratio_threshold),
            edge_ratio_threshold: env_or("EDGE_RATIO_THRESHOLD", defaults.edge_ratio_threshold),
            canny_low_threshold: env_or("CANNY_LOW_THRESHOLD", defaults.canny_low_threshold),
            canny_high_threshold: env_or("CANNY_HIGH_THRESHOLD", defaults.canny_high_threshold),
        };
        // Canny expects low <= high
        if config.canny_low_threshold > config.canny_high_threshold {
            std::mem::swap(&mut config.canny_low_threshold, &mut config.canny_high_threshold);
        }
        config
    }

    /// Upload limit rendered for error messages, e.g. `10MB`
    pub fn max_upload_label(&self) -> String {
        let mb = self.max_upload_bytes / (1024 * 1024);
        if mb > 0 && self.max_upload_bytes % (1024 * 1024) == 0 {
            format!("{mb}MB")
        } else {
            format!("{} bytes", self.max_upload_bytes)
        }
    }
}
