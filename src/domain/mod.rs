//! # Domain Layer
//!
//! Conversation state, credentials and generation settings.
//! This layer is independent of the provider, the terminal and the runtime.

mod error;
pub mod models;

pub use error::*;
pub use models::*;
