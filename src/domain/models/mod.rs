mod completion_request;
mod credential;
mod generation;
mod message;
mod model_choice;
mod profile;
mod transcript;

pub use completion_request::*;
pub use credential::*;
pub use generation::*;
pub use message::*;
pub use model_choice::*;
pub use profile::*;
pub use transcript::*;
