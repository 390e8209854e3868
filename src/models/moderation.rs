//! Moderation result types.

use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SAFE_MESSAGE: &str = "Image passed content moderation";
pub const PROCESSING_FAILED_MESSAGE: &str = "Failed to process image";
/// Confidence reported for images no detector flagged
pub const BASELINE_CONFIDENCE: f64 = 0.95;

/// Classification tags attached to unsafe images
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "snake_case")]
pub enum ModerationCategory {
    ExplicitNudity,
    GraphicViolence,
    HateSymbols,
    SelfHarm,
    ExtremistContent,
    ProcessingError,
}

impl ModerationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationCategory::ExplicitNudity => "explicit_nudity",
            ModerationCategory::GraphicViolence => "graphic_violence",
            ModerationCategory::HateSymbols => "hate_symbols",
            ModerationCategory::SelfHarm => "self_harm",
            ModerationCategory::ExtremistContent => "extremist_content",
            ModerationCategory::ProcessingError => "processing_error",
        }
    }
}

impl fmt::Display for ModerationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the skin-tone coverage detector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Apiv2Schema)]
pub struct SkinDetection {
    pub detected: bool,
    pub confidence: f64,
    pub skin_ratio: f64,
}

/// Output of the edge-density detector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Apiv2Schema)]
pub struct EdgeDetection {
    pub detected: bool,
    pub confidence: f64,
    pub edge_ratio: f64,
}

/// Per-detector evidence; only detectors that fired are present
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Apiv2Schema)]
pub struct ModerationDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nudity: Option<SkinDetection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violence: Option<EdgeDetection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body for `POST /moderate`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Apiv2Schema)]
pub struct ModerationResult {
    pub is_safe: bool,
    pub confidence: f64,
    pub message: String,
    pub categories: Vec<ModerationCategory>,
    #[serde(default)]
    pub details: ModerationDetails,
}

impl ModerationResult {
    /// Starting point before any detector runs
    pub fn safe() -> Self {
        Self {
            is_safe: true,
            confidence: BASELINE_CONFIDENCE,
            message: SAFE_MESSAGE.to_string(),
            categories: Vec::new(),
            details: ModerationDetails::default(),
        }
    }

    /// Result for images that could not be decoded or analyzed
    pub fn processing_error(reason: impl Into<String>) -> Self {
        Self {
            is_safe: false,
            confidence: 0.0,
            message: PROCESSING_FAILED_MESSAGE.to_string(),
            categories: vec![ModerationCategory::ProcessingError],
            details: ModerationDetails {
                error: Some(reason.into()),
                ..ModerationDetails::default()
            },
        }
    }

    pub fn flag_nudity(&mut self, detection: SkinDetection) {
        self.categories.push(ModerationCategory::ExplicitNudity);
        self.is_safe = false;
        self.confidence = detection.confidence;
        self.details.nudity = Some(detection);
    }

    pub fn flag_violence(&mut self, detection: EdgeDetection) {
        self.categories.push(ModerationCategory::GraphicViolence);
        self.is_safe = false;
        self.confidence = self.confidence.max(detection.confidence);
        self.details.violence = Some(detection);
    }

    /// Rewrite the message once all detectors have run
    pub fn finalize(mut self) -> Self {
        if !self.is_safe && !self.categories.is_empty() {
            let joined = self
                .categories
                .iter()
                .map(ModerationCategory::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            self.message = format!("Image flagged for: {joined}");
        }
        self
    }

    /// Label used for the moderation outcome metric
    pub fn outcome(&self) -> &'static str {
        if self.categories.contains(&ModerationCategory::ProcessingError) {
            "error"
        } else if self.is_safe {
            "safe"
        } else {
            "unsafe"
        }
    }
}
