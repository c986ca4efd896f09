//! Maps a similarity score onto user-facing guidance.

use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Scores above this are treated as a near copy of the source.
pub const TOO_SIMILAR_THRESHOLD: f64 = 0.85;
/// Scores above this (and not above [`TOO_SIMILAR_THRESHOLD`]) are borderline.
pub const BORDERLINE_THRESHOLD: f64 = 0.70;

/// Outcome of comparing a summary with its source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    TooSimilar,
    Borderline,
    Good,
}

impl FeedbackCategory {
    pub const ALL: [FeedbackCategory; 3] = [
        FeedbackCategory::TooSimilar,
        FeedbackCategory::Borderline,
        FeedbackCategory::Good,
    ];

    /// Wire name, as used in the `status` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackCategory::TooSimilar => "too_similar",
            FeedbackCategory::Borderline => "borderline",
            FeedbackCategory::Good => "good",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FeedbackCategory::TooSimilar => "⚠️ This summary is too close to the original source.",
            FeedbackCategory::Borderline => {
                "⚡ Getting closer, but still quite similar to the original."
            }
            FeedbackCategory::Good => {
                "✅ Great summary! You've captured the essence in your own words."
            }
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            FeedbackCategory::TooSimilar => {
                "Try to capture the core idea without using the author's sentence structure. \
                 Think about what the author is trying to say, then explain it as if you were \
                 telling a friend."
            }
            FeedbackCategory::Borderline => {
                "Focus on the main idea and express it in your natural writing style."
            }
            FeedbackCategory::Good => {
                "This shows good understanding. You can add this source to your knowledge library."
            }
        }
    }
}

impl std::fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower bounds of the two upper bands. Both comparisons are strict, so a score
/// equal to a bound lands in the band below it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedbackThresholds {
    pub too_similar: f64,
    pub borderline: f64,
}

impl Default for FeedbackThresholds {
    fn default() -> Self {
        Self {
            too_similar: TOO_SIMILAR_THRESHOLD,
            borderline: BORDERLINE_THRESHOLD,
        }
    }
}

impl FeedbackThresholds {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let in_range = |t: f64| t.is_finite() && (-1.0..=1.0).contains(&t);
        if !in_range(self.too_similar) || !in_range(self.borderline) {
            return Err(AnalysisError::InvalidThresholds(format!(
                "thresholds must lie in [-1, 1], got too_similar={} borderline={}",
                self.too_similar, self.borderline
            )));
        }
        if self.borderline >= self.too_similar {
            return Err(AnalysisError::InvalidThresholds(format!(
                "borderline ({}) must be below too_similar ({})",
                self.borderline, self.too_similar
            )));
        }
        Ok(())
    }

    pub fn classify(&self, score: f64) -> FeedbackCategory {
        if score > self.too_similar {
            FeedbackCategory::TooSimilar
        } else if score > self.borderline {
            FeedbackCategory::Borderline
        } else {
            FeedbackCategory::Good
        }
    }
}

/// Classifies `score` with the default bands: `> 0.85` too similar, `> 0.70`
/// borderline, anything else good.
pub fn classify(score: f64) -> FeedbackCategory {
    FeedbackThresholds::default().classify(score)
}

/// Result record handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackReport {
    pub similarity: f64,
    pub status: FeedbackCategory,
    pub message: String,
    pub advice: String,
}

impl FeedbackReport {
    pub fn new(similarity: f64, status: FeedbackCategory) -> Self {
        Self {
            similarity,
            status,
            message: status.message().to_string(),
            advice: status.advice().to_string(),
        }
    }
}
