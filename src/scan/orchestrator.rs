//! Scan pipeline orchestration
//!
//! Sequences capture → encode → analyze → verify into one result and owns
//! the busy/error state the caller displays.

use super::analyzer::LabelAnalyzer;
use super::capture::{DeviceCapture, ImageSource};
use super::codec::ImagePayload;
use super::verify::ProductVerifier;
use super::AnalysisResult;
use crate::Result;

/// Drives the scan use case end-to-end
///
/// At most one result or one error is current at a time; starting a new scan
/// clears both before the attempt begins.
pub struct AnalysisOrchestrator {
    capture: DeviceCapture,
    analyzer: LabelAnalyzer,
    verifier: ProductVerifier,
    busy: bool,
    result: Option<AnalysisResult>,
    error: Option<String>,
}

impl AnalysisOrchestrator {
    /// Assemble the pipeline from its stages
    #[must_use]
    pub const fn new(
        capture: DeviceCapture,
        analyzer: LabelAnalyzer,
        verifier: ProductVerifier,
    ) -> Self {
        Self {
            capture,
            analyzer,
            verifier,
            busy: false,
            result: None,
            error: None,
        }
    }

    /// Whether a scan is in flight
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// The current result, if the last scan succeeded
    #[must_use]
    pub const fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// The current dismissible error message, if the last scan failed
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Clear result and error back to the idle scan state
    pub fn reset(&mut self) {
        self.result = None;
        self.error = None;
    }

    /// Access the capture device, e.g. to start a camera preview
    pub fn capture_mut(&mut self) -> &mut DeviceCapture {
        &mut self.capture
    }

    /// Run one analysis attempt; single shot, never retried
    ///
    /// Any active camera stream is released before the attempt proceeds.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Capture`] if no image could be acquired (the
    /// analyzer is never invoked), or [`crate::Error::Analysis`] if the
    /// structured-generation call fails as a unit. Verification failures are
    /// folded into the result, never raised.
    pub async fn analyze(&mut self, source: ImageSource) -> Result<AnalysisResult> {
        self.reset();
        self.busy = true;

        let outcome = self.run_pipeline(source).await;

        self.busy = false;
        match &outcome {
            Ok(result) => self.result = Some(result.clone()),
            Err(e) => self.error = Some(e.to_string()),
        }
        outcome
    }

    async fn run_pipeline(&mut self, source: ImageSource) -> Result<AnalysisResult> {
        // A camera-sourced capture releases the stream itself; for file
        // sources any leftover preview stream is released here.
        if !matches!(source, ImageSource::Camera) {
            self.capture.release();
        }

        let bytes = self.capture.acquire(source).await?;
        let payload = ImagePayload::from_bytes(bytes);

        let reading = self.analyzer.analyze(&payload).await?;

        // Advisory only: a miss or a dead catalog never blocks the result.
        let verified = self.verifier.verify(&reading.product_name).await;

        Ok(AnalysisResult {
            product_name: reading.product_name,
            nutrients: reading.nutrients,
            allergens: reading.allergens,
            summary: reading.summary,
            verified,
        })
    }
}
