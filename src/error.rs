//! Error types for ebook-builder

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EbookError {
    #[error("Key-value store unavailable: {0}")]
    StoreUnavailable(#[from] redis::RedisError),

    #[error("Generation timeout after {timeout_ms}ms")]
    GenerationTimeout { timeout_ms: u64 },

    #[error("Failed to generate content: {0}")]
    GenerationError(String),

    #[error("OpenAI API error: {0}")]
    OpenAiError(#[from] async_openai::error::OpenAIError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, EbookError>;
