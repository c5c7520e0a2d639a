//! Issue-tracker integration: JIRA REST client and issue-field builders.

pub mod jira;
pub mod types;

pub use jira::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Cannot connect to tracker at {0}")]
    Connection(String),

    #[error("Tracker API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Tracker credentials not configured")]
    NotConfigured,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Failed to parse tracker response: {0}")]
    ResponseParsing(String),
}
