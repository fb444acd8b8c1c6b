use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use medwise::cli::Commands;
use medwise::connector::{model_list, provisioned_token, TokenSource, TOKEN_ENV_VAR};
use medwise::domain::{is_valid_token, DEFAULT_TEMPERATURE, DEFAULT_TOP_P};
use medwise::{
    AssistantProfile, Container, ContainerConfig, ModelChoice, TerminalChat, TerminalRenderer,
};

#[derive(Parser)]
#[command(name = "medwise")]
#[command(author, version, about = "Medical chat assistant for the terminal", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// open: medical system prompt only; strict: adds the keyword filter
    #[arg(long, global = true, default_value = "open")]
    profile: AssistantProfile,

    #[arg(short, long, global = true, default_value = "llama3-8b")]
    model: ModelChoice,

    #[arg(short, long, global = true, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f64,

    #[arg(long, global = true, default_value_t = DEFAULT_TOP_P)]
    top_p: f64,

    /// Give up on the provider after this many seconds (0 disables)
    #[arg(long, global = true, default_value = "120")]
    timeout_secs: u64,

    /// Only send the last N messages as conversation history
    #[arg(long, global = true)]
    history_window: Option<usize>,

    /// Report provider failures instead of replying with an apology
    #[arg(long, global = true)]
    no_recover: bool,

    /// Use canned replies instead of calling Replicate
    #[arg(long, global = true)]
    mock_provider: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.clone().unwrap_or(Commands::Chat);

    match command {
        Commands::Models => {
            println!("{}", model_list(cli.model));
            return Ok(());
        }
        Commands::CheckToken { token } => {
            let token = match token {
                Some(token) => token,
                None => match provisioned_token() {
                    TokenSource::Provisioned(token) => token,
                    TokenSource::Missing => bail!("No token given and {} is not set", TOKEN_ENV_VAR),
                },
            };
            if is_valid_token(&token) {
                println!("Token looks valid.");
                return Ok(());
            }
            bail!("Token is not a valid Replicate API token");
        }
        Commands::Chat | Commands::Ask { .. } => {}
    }

    let container = Container::new(ContainerConfig {
        profile: cli.profile,
        model: cli.model,
        temperature: cli.temperature,
        top_p: cli.top_p,
        timeout_secs: cli.timeout_secs,
        history_window: cli.history_window,
        no_recover: cli.no_recover,
        mock_provider: cli.mock_provider,
    })?;

    info!(
        "Starting {} profile with {}",
        container.profile(),
        cli.model.label()
    );

    match command {
        Commands::Ask { message } => {
            let token = match provisioned_token() {
                TokenSource::Provisioned(token) => token,
                TokenSource::Missing => bail!("{} is not set", TOKEN_ENV_VAR),
            };
            let mut session = container.chat_session();
            session.set_credential(&token)?;

            let mut renderer = TerminalRenderer::stdout();
            session.submit(&message.join(" "), &mut renderer).await?;
        }
        _ => {
            TerminalChat::new(container.chat_session(), container.profile())
                .run()
                .await?;
        }
    }

    Ok(())
}
