use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Interactive chat session (default)
    Chat,

    /// Send one message and stream the reply to stdout
    Ask {
        /// The message; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Check the shape of an API token without contacting the provider
    CheckToken {
        /// Token to check; defaults to REPLICATE_API_TOKEN
        token: Option<String>,
    },

    /// List the selectable models
    Models,
}
