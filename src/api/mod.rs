//! HTTP surface: shared state, error mapping, router and endpoint handlers.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::api_router;
pub use state::AppState;
