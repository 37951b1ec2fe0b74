//! Structured label analysis
//!
//! Sends the encoded label image to a schema-constrained generation service
//! and validates the shape of what comes back. One attempt, no retry; the
//! caller never learns whether transport or parsing failed.

use async_trait::async_trait;
use serde::Deserialize;

use super::codec::ImagePayload;
use super::Nutrient;
use crate::persona::{ANALYSIS_INSTRUCTION, UNREADABLE_LABEL};
use crate::{Error, Result};

/// External call returning content constrained to a declared schema
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate the raw JSON text of a schema-constrained response for the
    /// given image and instruction
    ///
    /// # Errors
    ///
    /// Returns error on any transport or provider failure
    async fn generate_structured(
        &self,
        payload: &ImagePayload,
        instruction: &str,
    ) -> Result<String>;
}

/// What the analysis response must parse as; any missing field fails the
/// attempt as a unit
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelReading {
    pub product_name: String,
    pub nutrients: Vec<Nutrient>,
    pub allergens: Vec<String>,
    pub summary: String,
}

/// Validates structured-generation responses for label images
pub struct LabelAnalyzer {
    service: Box<dyn GenerationService>,
}

impl LabelAnalyzer {
    /// Create an analyzer over the given generation service
    #[must_use]
    pub fn new(service: Box<dyn GenerationService>) -> Self {
        Self { service }
    }

    /// Analyze one label image
    ///
    /// # Errors
    ///
    /// Returns [`Error::Analysis`] with the fixed friendly message on any
    /// transport failure or shape violation
    pub async fn analyze(&self, payload: &ImagePayload) -> Result<LabelReading> {
        let raw = self
            .service
            .generate_structured(payload, ANALYSIS_INSTRUCTION)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "label analysis request failed");
                Error::Analysis(UNREADABLE_LABEL.to_string())
            })?;

        let reading: LabelReading = serde_json::from_str(raw.trim()).map_err(|e| {
            tracing::warn!(error = %e, "label analysis response failed validation");
            Error::Analysis(UNREADABLE_LABEL.to_string())
        })?;

        tracing::info!(
            product = %reading.product_name,
            nutrients = reading.nutrients.len(),
            "label analyzed"
        );
        Ok(reading)
    }
}
