//! Voice I/O
//!
//! Microphone capture, utterance endpointing, STT/TTS clients, and the two
//! bridges the chat loop talks to: one utterance in, one spoken reply out.

mod cancel;
mod capture;
mod endpoint;
mod input;
mod output;
mod playback;
mod stt;
mod tts;

pub use capture::{MicCapture, SAMPLE_RATE, samples_to_wav};
pub use endpoint::{GateState, UtteranceGate};
pub use input::{MicRecognizer, SpeechRecognizer, VoiceInputBridge, VoiceInputEvent};
pub use output::{
    Speaker, SpeechSynthesizer, VoiceOutputBridge, VoiceProfile, select_voice,
};
pub use playback::AudioPlayback;
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
