//! # Application Layer
//!
//! The chat session controller and the ports it drives.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
