mod completion_client;
mod domain_filter;
mod response_renderer;

pub use completion_client::*;
pub use domain_filter::*;
pub use response_renderer::*;
