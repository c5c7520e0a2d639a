//! In-process semantic index over uploaded document text.

pub mod chunker;
pub mod embedder;
pub mod store;
pub mod types;

pub use chunker::*;
pub use embedder::*;
pub use store::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Index lock poisoned")]
    LockPoisoned,
}
