//! Error types for the NutriScan gateway

use thiserror::Error;

/// Result type alias for NutriScan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the NutriScan gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Image capture error (camera, permissions, file read)
    #[error("{0}")]
    Capture(String),

    /// Label analysis error (transport or schema-validation failure)
    #[error("{0}")]
    Analysis(String),

    /// Chat stream error (start or mid-stream)
    #[error("chat stream error: {0}")]
    ChatStream(String),

    /// Voice capability unavailable (refused synchronously at start)
    #[error("voice unavailable: {0}")]
    VoiceUnavailable(String),

    /// Generation provider error
    #[error("provider error: {0}")]
    Provider(String),

    /// Product catalog lookup error
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
