mod chat_session;
mod prompt_assembler;
mod response_accumulator;

pub use chat_session::*;
pub use prompt_assembler::*;
pub use response_accumulator::*;
