//! Configuration management for the NutriScan gateway

pub mod file;

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::{Error, Result};

use file::NutriscanConfigFile;

/// Gateway configuration, resolved from defaults, the config file, and
/// environment variables (later sources win)
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (preferences, caches)
    pub data_dir: PathBuf,

    /// Gemini model used for both vision analysis and chat
    pub model: String,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input/output
    pub enabled: bool,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS speed multiplier
    pub tts_speed: f32,

    /// Session language for voice selection (e.g. "en-IN")
    pub language: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stt_model: "whisper-1".to_string(),
            tts_speed: 1.0,
            language: "en-IN".to_string(),
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Gemini (analysis + chat)
    pub gemini: String,

    /// OpenAI (Whisper STT, TTS)
    pub openai: String,
}

impl Config {
    /// Load configuration
    ///
    /// # Errors
    ///
    /// Returns error if the platform directories cannot be determined or the
    /// config file is malformed
    pub fn load() -> Result<Self> {
        let dirs = ProjectDirs::from("dev", "nutriscan", "nutriscan")
            .ok_or_else(|| Error::Config("could not determine home directory".to_string()))?;

        let file = NutriscanConfigFile::load(&dirs.config_dir().join("config.toml"))?;

        let mut voice = VoiceConfig::default();
        if let Some(enabled) = file.voice.enabled {
            voice.enabled = enabled;
        }
        if let Some(stt_model) = file.voice.stt_model {
            voice.stt_model = stt_model;
        }
        if let Some(speed) = file.voice.tts_speed {
            #[allow(clippy::cast_possible_truncation)]
            {
                voice.tts_speed = speed as f32;
            }
        }
        if let Some(language) = file.voice.language {
            voice.language = language;
        }

        let api_keys = ApiKeys {
            gemini: std::env::var("GEMINI_API_KEY")
                .ok()
                .or(file.api_keys.gemini)
                .unwrap_or_default(),
            openai: std::env::var("OPENAI_API_KEY")
                .ok()
                .or(file.api_keys.openai)
                .unwrap_or_default(),
        };

        Ok(Self {
            data_dir: dirs.data_dir().to_path_buf(),
            model: file
                .model
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            voice,
            api_keys,
        })
    }
}
