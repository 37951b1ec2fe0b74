//! Voice output bridge
//!
//! Speaks sealed assistant turns aloud, at most once per turn. A new
//! utterance always preempts the old one; nothing is queued.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::cancel::CancelSource;
use super::playback::AudioPlayback;
use super::tts::TextToSpeech;
use crate::chat::{ChatTurn, Role};
use crate::Result;

/// A synthesis voice the platform offers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub name: String,
    /// BCP-47 style tag, e.g. "en-IN"
    pub language: String,
    /// Higher-quality network voice, as opposed to a local one
    pub network: bool,
}

/// Pick the best voice for a session language
///
/// Preference order: network voice with an exact language match, any exact
/// match, a voice sharing the primary language subtag, then the first voice
/// available at all.
#[must_use]
pub fn select_voice<'a>(voices: &'a [VoiceProfile], language: &str) -> Option<&'a VoiceProfile> {
    let wanted = language.to_lowercase();
    let primary = wanted.split('-').next().unwrap_or(&wanted).to_string();

    voices
        .iter()
        .find(|v| v.network && v.language.eq_ignore_ascii_case(&wanted))
        .or_else(|| {
            voices
                .iter()
                .find(|v| v.language.eq_ignore_ascii_case(&wanted))
        })
        .or_else(|| {
            voices.iter().find(|v| {
                v.language
                    .to_lowercase()
                    .split('-')
                    .next()
                    .is_some_and(|p| p == primary)
            })
        })
        .or_else(|| voices.first())
}

/// A text-to-speech device capability
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize and play one utterance to completion
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str) -> Result<()>;

    /// Cut off any in-progress utterance
    fn cancel(&self);
}

/// Speaks sealed turns, tracking which turn index was last spoken
pub struct VoiceOutputBridge {
    synth: Arc<dyn SpeechSynthesizer>,
    enabled: bool,
    last_spoken: Option<usize>,
    current: Option<JoinHandle<()>>,
}

impl VoiceOutputBridge {
    /// Create a bridge over the given synthesizer, initially enabled
    #[must_use]
    pub fn new(synth: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synth,
            enabled: true,
            last_spoken: None,
            current: None,
        }
    }

    /// Whether speech output is enabled
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable speech output; disabling cancels any utterance
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.cancel();
        }
    }

    /// The most recently spoken turn index
    #[must_use]
    pub const fn last_spoken(&self) -> Option<usize> {
        self.last_spoken
    }

    /// Speak a sealed turn; returns whether synthesis was started
    ///
    /// Skipped while disabled, and idempotent per turn index: asking to
    /// speak the same turn twice results in exactly one synthesis. A new
    /// turn preempts whatever is still playing.
    pub fn speak_turn(&mut self, index: usize, text: &str) -> bool {
        if !self.enabled {
            return false;
        }
        if self.last_spoken == Some(index) {
            tracing::debug!(index, "turn already spoken, skipping");
            return false;
        }

        self.cancel();
        self.last_spoken = Some(index);

        let synth = Arc::clone(&self.synth);
        let text = text.to_owned();
        self.current = Some(tokio::spawn(async move {
            if let Err(e) = synth.speak(&text).await {
                tracing::warn!(error = %e, "speech synthesis failed");
            }
        }));

        true
    }

    /// Speak the trailing assistant turn of a conversation snapshot
    ///
    /// Skipped while a reply is still streaming, so a partially streamed
    /// turn is never synthesized. The greeting (index 0) is not spoken.
    pub fn speak_reply(&mut self, turns: &[ChatTurn], sending: bool) -> bool {
        if sending {
            return false;
        }
        let index = turns.len().saturating_sub(1);
        match turns.last() {
            Some(turn) if index > 0 && turn.role == Role::Assistant => {
                self.speak_turn(index, &turn.text)
            }
            _ => false,
        }
    }

    /// Cancel any in-progress utterance immediately
    pub fn cancel(&mut self) {
        self.synth.cancel();
        if let Some(task) = self.current.take() {
            task.abort();
        }
    }
}

impl Drop for VoiceOutputBridge {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Real synthesizer: OpenAI TTS into cpal playback
///
/// Each utterance polls its own cancellation flag; the blocking playback of
/// a superseded utterance keeps seeing its (permanently set) flag and dies
/// at its next poll even though the new utterance has already started.
pub struct Speaker {
    tts: TextToSpeech,
    playback: Arc<AudioPlayback>,
    cancel: CancelSource,
}

impl Speaker {
    /// Create a speaker from TTS and playback halves
    #[must_use]
    pub fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self {
            tts,
            playback: Arc::new(playback),
            cancel: CancelSource::new(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for Speaker {
    async fn speak(&self, text: &str) -> Result<()> {
        let cancelled = self.cancel.begin();

        let audio = self.tts.synthesize(text).await?;
        if cancelled.load(Ordering::SeqCst) {
            return Ok(());
        }

        let playback = Arc::clone(&self.playback);
        tokio::task::spawn_blocking(move || playback.play_mp3(&audio, &cancelled))
            .await
            .map_err(|e| crate::Error::Audio(e.to_string()))?
    }

    fn cancel(&self) {
        self.cancel.cancel();
    }
}
