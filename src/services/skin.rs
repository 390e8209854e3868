//! Skin-tone coverage detector.
//!
//! Pixels are converted to 8-bit HSV with hue halved into `0..=180`, the layout
//! most computer-vision toolkits use for byte images.

use crate::models::SkinDetection;
use image::RgbImage;

const HUE_MAX: u8 = 20;
const SATURATION_MIN: u8 = 20;
const VALUE_MIN: u8 = 70;

const DETECTED_CONFIDENCE_CAP: f64 = 0.95;
const UNDETECTED_CONFIDENCE: f64 = 0.1;

/// 8-bit HSV triple: hue in `0..=180`, saturation and value in `0..=255`
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0.0 { 0.0 } else { diff * 255.0 / v };

    let h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    (
        (h / 2.0).round().min(180.0) as u8,
        s.round() as u8,
        v as u8,
    )
}

pub fn is_skin(r: u8, g: u8, b: u8) -> bool {
    let (h, s, v) = rgb_to_hsv(r, g, b);
    h <= HUE_MAX && s >= SATURATION_MIN && v >= VALUE_MIN
}

/// Fraction of pixels inside the skin-tone HSV band
pub fn skin_ratio(image: &RgbImage) -> f64 {
    let total = image.width() as u64 * image.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let skin = image
        .pixels()
        .filter(|p| is_skin(p.0[0], p.0[1], p.0[2]))
        .count() as u64;
    skin as f64 / total as f64
}

pub fn detect(image: &RgbImage, threshold: f64) -> SkinDetection {
    let ratio = skin_ratio(image);
    let detected = ratio > threshold;
    SkinDetection {
        detected,
        confidence: if detected {
            (ratio * 2.0).min(DETECTED_CONFIDENCE_CAP)
        } else {
            UNDETECTED_CONFIDENCE
        },
        skin_ratio: ratio,
    }
}
