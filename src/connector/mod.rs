//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Completion (Replicate over server-sent events, scripted mock)
//! - Domain filtering (medical keyword list)
//! - Terminal chat surface
//! - Wiring of all of the above from command-line settings

pub mod adapter;
mod container;
pub mod terminal;

pub use adapter::*;
pub use container::*;
pub use terminal::*;
