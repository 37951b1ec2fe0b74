//! Utterance endpointing
//!
//! Energy-based detection of one spoken utterance: speech starts when the
//! signal rises above the energy floor, and ends after a stretch of silence.
//! Recognition sessions are single-shot, so one completed segment is all a
//! gate ever produces.

/// Minimum RMS energy to count as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech length for a valid utterance (samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Trailing silence that ends the utterance (samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// State of the utterance gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Waiting for speech to start
    Idle,
    /// Speech detected, accumulating the utterance
    Capturing,
    /// A full utterance has been captured
    Complete,
}

/// Accumulates exactly one utterance from streamed samples
pub struct UtteranceGate {
    state: GateState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
}

impl Default for UtteranceGate {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceGate {
    /// Create a gate in the idle state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: GateState::Idle,
            speech_buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Feed captured samples; returns true once the utterance is complete
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            GateState::Idle => {
                if is_speech {
                    self.state = GateState::Capturing;
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
            }
            GateState::Capturing => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > SILENCE_SAMPLES
                    && self.speech_buffer.len() > MIN_SPEECH_SAMPLES
                {
                    self.state = GateState::Complete;
                    tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                }
            }
            GateState::Complete => {}
        }

        self.state == GateState::Complete
    }

    /// Whether a full utterance has been captured
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == GateState::Complete
    }

    /// Take the captured utterance, resetting the gate
    pub fn take_utterance(&mut self) -> Vec<f32> {
        self.state = GateState::Idle;
        self.silence_counter = 0;
        std::mem::take(&mut self.speech_buffer)
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }
}

/// RMS energy of a sample window
#[allow(clippy::cast_precision_loss)]
fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(duration_samples: usize, amplitude: f32) -> Vec<f32> {
        (0..duration_samples)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f32 / 16000.0;
                amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn silence_does_not_trigger() {
        let mut gate = UtteranceGate::new();
        assert!(!gate.process(&vec![0.0; 1600]));
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn speech_then_silence_completes() {
        let mut gate = UtteranceGate::new();

        let speech = tone(8000, 0.3);
        gate.process(&speech);
        assert_eq!(gate.state(), GateState::Capturing);

        let complete = gate.process(&vec![0.0; 9000]);
        assert!(complete);
        assert!(gate.is_complete());
    }

    #[test]
    fn take_utterance_resets() {
        let mut gate = UtteranceGate::new();
        let speech = tone(8000, 0.3);
        gate.process(&speech);
        gate.process(&vec![0.0; 9000]);

        let utterance = gate.take_utterance();
        assert_eq!(utterance.len(), 8000 + 9000);
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn short_blip_does_not_complete() {
        let mut gate = UtteranceGate::new();
        gate.process(&tone(1000, 0.3));
        assert!(!gate.process(&vec![0.0; 9000]));
    }

    #[test]
    fn energy_of_silence_is_near_zero() {
        assert!(calculate_energy(&vec![0.0; 100]) < 0.001);
        assert!(calculate_energy(&vec![0.5; 100]) > 0.4);
    }
}
