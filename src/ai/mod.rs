//! Generative-model integration: client, prompts and response shaping.

pub mod gemini;
pub mod parser;
pub mod prompt;
pub mod types;

pub use gemini::*;
pub use parser::*;
pub use prompt::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("Model API unreachable at {0}")]
    Connection(String),

    #[error("Model API returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Model API key not configured")]
    MissingApiKey,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}
