mod keyword_domain_filter;
mod mock_completion;
mod replicate_client;
mod secret_source;
mod sse;

pub use keyword_domain_filter::*;
pub use mock_completion::*;
pub use replicate_client::*;
pub use secret_source::*;
pub use sse::*;
