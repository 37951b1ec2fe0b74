//! NutriScan Gateway - nutrition label scanning and meal-chat assistant
//!
//! This library provides the two core pipelines of the NutriScan assistant:
//! - Label scanning: camera/file capture → structured vision analysis →
//!   advisory catalog verification, sequenced into one result
//! - Meal chat: a streaming conversation loop with optional voice input and
//!   spoken replies
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Interfaces                      │
//! │        CLI  │  Camera/File  │  Mic  │  Speaker       │
//! └────────────────────┬─────────────────────────────────┘
//!                      │
//! ┌────────────────────▼─────────────────────────────────┐
//! │                 NutriScan Gateway                    │
//! │  AnalysisOrchestrator  │  ConversationSession        │
//! │  VoiceInputBridge      │  VoiceOutputBridge          │
//! └────────────────────┬─────────────────────────────────┘
//!                      │
//! ┌────────────────────▼─────────────────────────────────┐
//! │               External collaborators                 │
//! │  Gemini (vision + chat)  │  Whisper  │  Catalog      │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod persona;
pub mod prefs;
pub mod providers;
pub mod scan;
pub mod voice;

pub use catalog::{ProductCatalog, ProductCategory, ProductRecord, ReferenceCatalog};
pub use chat::{
    ChatModel, ChatTurn, ConversationSession, ReplyChunk, ReplyPrinter, Role, TokenStream,
};
pub use config::Config;
pub use error::{Error, Result};
pub use prefs::Preferences;
pub use providers::GeminiClient;
pub use scan::{
    AnalysisOrchestrator, AnalysisResult, DeviceCapture, GenerationService, ImagePayload,
    ImageSource, LabelAnalyzer, Nutrient, NutrientScore, ProductVerifier, ScoreCounts,
};
pub use voice::{
    SpeechRecognizer, SpeechSynthesizer, VoiceInputBridge, VoiceInputEvent, VoiceOutputBridge,
    VoiceProfile, select_voice,
};
