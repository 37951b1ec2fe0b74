//! Voice input bridge
//!
//! Wraps a speech recognizer behind a small idle/listening state machine.
//! Each listening session delivers at most one recognized utterance, then
//! the bridge returns to idle on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::cancel::CancelSource;
use super::capture::{samples_to_wav, MicCapture, SAMPLE_RATE};
use super::endpoint::UtteranceGate;
use super::stt::SpeechToText;
use crate::{Error, Result};

/// Longest a single listening session may run
const MAX_UTTERANCE: Duration = Duration::from_secs(15);

/// Outcome of one listening session
#[derive(Debug, Clone)]
pub enum VoiceInputEvent {
    /// One recognized utterance
    Utterance(String),
    /// The device or recognizer reported an error
    Error(String),
}

/// A speech-to-text device capability
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Whether the capability can be used right now
    fn is_available(&self) -> bool;

    /// Capture and transcribe exactly one utterance
    ///
    /// # Errors
    ///
    /// Returns error if capture or transcription fails
    async fn recognize_once(&self) -> Result<String>;

    /// Abandon the in-progress recognition and release capture devices
    fn cancel(&self);
}

/// Idle/listening bridge over a [`SpeechRecognizer`]
///
/// Delivery goes through the mpsc channel handed in at construction, so the
/// consumer can select on it alongside its other event sources.
pub struct VoiceInputBridge {
    recognizer: Arc<dyn SpeechRecognizer>,
    events: mpsc::Sender<VoiceInputEvent>,
    listening: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl VoiceInputBridge {
    /// Create a bridge delivering events on the given channel
    #[must_use]
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        events: mpsc::Sender<VoiceInputEvent>,
    ) -> Self {
        Self {
            recognizer,
            events,
            listening: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Whether a listening session is active
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Begin one listening session; no-op if already listening
    ///
    /// # Errors
    ///
    /// Refuses synchronously with [`Error::VoiceUnavailable`] when the
    /// underlying capability cannot be used, so the caller can explain the
    /// limitation immediately.
    pub fn start(&mut self) -> Result<()> {
        if !self.recognizer.is_available() {
            return Err(Error::VoiceUnavailable(
                "speech recognition is not available on this device".to_string(),
            ));
        }
        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let recognizer = Arc::clone(&self.recognizer);
        let events = self.events.clone();
        let listening = Arc::clone(&self.listening);

        self.task = Some(tokio::spawn(async move {
            let outcome = recognizer.recognize_once().await;
            listening.store(false, Ordering::SeqCst);
            let event = match outcome {
                Ok(text) => VoiceInputEvent::Utterance(text),
                Err(e) => {
                    tracing::warn!(error = %e, "recognition failed");
                    VoiceInputEvent::Error(e.to_string())
                }
            };
            let _ = events.send(event).await;
        }));

        tracing::debug!("listening session started");
        Ok(())
    }

    /// Stop the active session without delivering anything
    ///
    /// The recognizer is told to cancel as well: aborting the task alone
    /// would leave a blocking capture loop holding the microphone.
    pub fn stop(&mut self) {
        self.abort_task();
        self.recognizer.cancel();
        self.listening.store(false, Ordering::SeqCst);
        tracing::debug!("listening session stopped");
    }

    /// Stop if listening, start if idle
    ///
    /// # Errors
    ///
    /// Same refusal semantics as [`Self::start`]
    pub fn toggle(&mut self) -> Result<()> {
        if self.is_listening() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for VoiceInputBridge {
    // Abort, not merely stop: no callback may fire after the consumer is gone
    fn drop(&mut self) {
        self.abort_task();
        self.recognizer.cancel();
    }
}

/// Microphone-backed recognizer: cpal capture, energy endpointing, Whisper
pub struct MicRecognizer {
    stt: Arc<SpeechToText>,
    cancel: CancelSource,
}

impl MicRecognizer {
    /// Create a recognizer over the given STT client
    #[must_use]
    pub fn new(stt: SpeechToText) -> Self {
        Self {
            stt: Arc::new(stt),
            cancel: CancelSource::new(),
        }
    }

    /// Blocking capture of one endpointed utterance
    ///
    /// The cancellation flag is checked every loop turn, so the microphone
    /// is released within about one poll interval of a cancel.
    fn capture_utterance(cancelled: &AtomicBool) -> Result<Vec<f32>> {
        let mut mic = MicCapture::new()?;
        mic.start()?;

        let mut gate = UtteranceGate::new();
        let started = std::time::Instant::now();

        loop {
            if cancelled.load(Ordering::SeqCst) {
                mic.stop();
                return Ok(Vec::new());
            }
            std::thread::sleep(Duration::from_millis(100));
            let chunk = mic.take_buffer();
            if gate.process(&chunk) {
                break;
            }
            if started.elapsed() > MAX_UTTERANCE {
                break;
            }
        }

        mic.stop();
        Ok(gate.take_utterance())
    }
}

#[async_trait]
impl SpeechRecognizer for MicRecognizer {
    fn is_available(&self) -> bool {
        use cpal::traits::HostTrait;
        cpal::default_host().default_input_device().is_some()
    }

    async fn recognize_once(&self) -> Result<String> {
        let cancelled = self.cancel.begin();
        let samples =
            tokio::task::spawn_blocking(move || Self::capture_utterance(&cancelled))
                .await
                .map_err(|e| Error::Audio(e.to_string()))??;

        if samples.is_empty() {
            return Err(Error::Stt("no speech detected".to_string()));
        }

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        self.stt.transcribe(&wav).await
    }

    fn cancel(&self) {
        self.cancel.cancel();
    }
}
