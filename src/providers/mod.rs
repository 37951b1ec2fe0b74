//! External AI provider clients

mod gemini;

pub use gemini::GeminiClient;
