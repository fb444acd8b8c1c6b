mod chat_controller;
mod commands;
mod masked_input;
mod renderer;

pub use chat_controller::*;
pub use commands::*;
pub use masked_input::*;
pub use renderer::*;
