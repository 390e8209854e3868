//! Edge-density detector built on a Canny edge map.
//!
//! The pipeline follows the classic formulation without pre-blurring: 3×3 Sobel
//! gradients over a replicated border, L1 magnitude, non-maximum suppression in
//! four directions, then double-threshold hysteresis over 8-connected pixels.

use crate::models::EdgeDetection;
use image::{GrayImage, Luma, RgbImage};

const DETECTED_CONFIDENCE_CAP: f64 = 0.9;
const UNDETECTED_CONFIDENCE: f64 = 0.05;

/// tan(22.5°) and tan(67.5°) bound the horizontal and vertical direction sectors
const TAN_22_5: f64 = 0.414_213_562_373_095_1;
const TAN_67_5: f64 = 2.414_213_562_373_095;

/// Luma with fixed-point BT.601 weights
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let y = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + 8192) >> 14;
        Luma([y.min(255) as u8])
    })
}

/// Sobel responses stay within ±1020 and their L1 magnitude within 2040, so
/// every plane is stored as `i16`.
struct Gradients {
    width: usize,
    height: usize,
    dx: Vec<i16>,
    dy: Vec<i16>,
    magnitude: Vec<i16>,
}

impl Gradients {
    fn compute(gray: &GrayImage) -> Self {
        let width = gray.width() as usize;
        let height = gray.height() as usize;
        let at = |x: isize, y: isize| -> i32 {
            let x = x.clamp(0, width as isize - 1) as u32;
            let y = y.clamp(0, height as isize - 1) as u32;
            gray.get_pixel(x, y).0[0] as i32
        };

        let mut dx = vec![0; width * height];
        let mut dy = vec![0; width * height];
        let mut magnitude = vec![0; width * height];

        for y in 0..height as isize {
            for x in 0..width as isize {
                let gx = (at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2 * at(x - 1, y) + at(x - 1, y + 1));
                let gy = (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1));
                let i = y as usize * width + x as usize;
                dx[i] = gx as i16;
                dy[i] = gy as i16;
                magnitude[i] = (gx.abs() + gy.abs()) as i16;
            }
        }

        Self {
            width,
            height,
            dx,
            dy,
            magnitude,
        }
    }

    /// Magnitude with zero outside the image
    fn mag(&self, x: isize, y: isize) -> i32 {
        if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
            0
        } else {
            i32::from(self.magnitude[y as usize * self.width + x as usize])
        }
    }

    fn is_local_maximum(&self, x: usize, y: usize) -> bool {
        let i = y * self.width + x;
        let m = i32::from(self.magnitude[i]);
        let (gx, gy) = (i32::from(self.dx[i]), i32::from(self.dy[i]));
        let (ax, ay) = (gx.abs() as f64, gy.abs() as f64);
        let (x, y) = (x as isize, y as isize);

        if ay < ax * TAN_22_5 {
            m > self.mag(x - 1, y) && m >= self.mag(x + 1, y)
        } else if ay > ax * TAN_67_5 {
            m > self.mag(x, y - 1) && m >= self.mag(x, y + 1)
        } else {
            let s: isize = if (gx < 0) != (gy < 0) { -1 } else { 1 };
            m > self.mag(x - s, y - 1) && m > self.mag(x + s, y + 1)
        }
    }
}

/// Binary edge map; `true` marks an edge pixel
pub fn canny(gray: &GrayImage, low: u32, high: u32) -> Vec<bool> {
    let (low, high) = (low.min(high) as i32, low.max(high) as i32);
    let gradients = Gradients::compute(gray);
    let (width, height) = (gradients.width, gradients.height);

    #[derive(Clone, Copy, PartialEq)]
    enum Class {
        None,
        Weak,
        Strong,
    }

    let mut classes = vec![Class::None; width * height];
    let mut stack = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let m = i32::from(gradients.magnitude[i]);
            if m <= low || !gradients.is_local_maximum(x, y) {
                continue;
            }
            if m > high {
                classes[i] = Class::Strong;
                stack.push((x, y));
            } else {
                classes[i] = Class::Weak;
            }
        }
    }

    // Hysteresis: promote weak pixels connected to a strong one
    while let Some((x, y)) = stack.pop() {
        for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                let j = ny * width + nx;
                if classes[j] == Class::Weak {
                    classes[j] = Class::Strong;
                    stack.push((nx, ny));
                }
            }
        }
    }

    classes.into_iter().map(|c| c == Class::Strong).collect()
}

/// Fraction of pixels on the Canny edge map
pub fn edge_ratio(image: &RgbImage, low: u32, high: u32) -> f64 {
    let total = image.width() as u64 * image.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let edges = canny(&to_grayscale(image), low, high)
        .into_iter()
        .filter(|e| *e)
        .count() as u64;
    edges as f64 / total as f64
}

pub fn detect(image: &RgbImage, threshold: f64, low: u32, high: u32) -> EdgeDetection {
    let ratio = edge_ratio(image, low, high);
    let detected = ratio > threshold;
    EdgeDetection {
        detected,
        confidence: if detected {
            (ratio * 3.0).min(DETECTED_CONFIDENCE_CAP)
        } else {
            UNDETECTED_CONFIDENCE
        },
        edge_ratio: ratio,
    }
}
