//! Label scanning pipeline
//!
//! Capture → encode → structured analysis → advisory verification, sequenced
//! by [`AnalysisOrchestrator`] into a single [`AnalysisResult`].

mod analyzer;
mod capture;
mod codec;
mod orchestrator;
mod verify;

use serde::Deserialize;

pub use analyzer::{GenerationService, LabelAnalyzer, LabelReading};
pub use capture::{CameraDevice, CameraStream, CaptureSession, DeviceCapture, ImageSource};
pub use codec::ImagePayload;
pub use orchestrator::AnalysisOrchestrator;
pub use verify::ProductVerifier;

/// Health-impact score the analysis service assigns to each nutrient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientScore {
    Good,
    Moderate,
    High,
    Neutral,
}

/// One nutrient row extracted from the label
///
/// All four fields are required; a response missing any of them fails shape
/// validation as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Nutrient {
    /// e.g. "Calories", "Total Fat"
    pub name: String,
    /// Value with units, e.g. "150", "10g"
    pub value: String,
    /// Percentage of daily value, or "N/A"
    pub dv: String,
    pub score: NutrientScore,
}

/// Tallies for the nutrient-balance graph (neutral entries excluded)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreCounts {
    pub good: usize,
    pub moderate: usize,
    pub high: usize,
}

/// Structured outcome of one successful scan
///
/// Created once per pipeline run and never mutated; a new scan supersedes it
/// wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub product_name: String,
    /// Order matches the analysis response
    pub nutrients: Vec<Nutrient>,
    pub allergens: Vec<String>,
    pub summary: String,
    /// Advisory cross-reference outcome; false on any lookup miss or failure
    pub verified: bool,
}

impl AnalysisResult {
    /// Count nutrients per score bucket for the balance graph
    #[must_use]
    pub fn score_counts(&self) -> ScoreCounts {
        let mut counts = ScoreCounts::default();
        for nutrient in &self.nutrients {
            match nutrient.score {
                NutrientScore::Good => counts.good += 1,
                NutrientScore::Moderate => counts.moderate += 1,
                NutrientScore::High => counts.high += 1,
                NutrientScore::Neutral => {}
            }
        }
        counts
    }
}
