use std::io::{self, Write};

use crossterm::style::Stylize;
use tracing::{debug, warn};

use crate::application::ChatSession;
use crate::connector::adapter::{provisioned_token, TokenSource};
use crate::connector::terminal::commands::{
    parse_chat_command, ChatCommand, ParsedChatCommand, CHAT_HELP,
};
use crate::connector::terminal::masked_input::read_masked;
use crate::connector::terminal::renderer::{print_message, TerminalRenderer};
use crate::domain::{AssistantProfile, DomainError, GenerationParameters, ModelChoice};

pub const TITLE: &str = "🩺 MedWise - Your Friendly Health Chatbot";
pub const KEY_PROVIDED: &str = "API key already provided!";
pub const KEY_MISSING: &str = "Please enter your credentials!";
pub const KEY_ACCEPTED: &str = "Proceed to entering your medical query!";

const TOKEN_PROMPT: &str = "Enter Replicate API token: ";

/// Line-oriented chat loop on stdin/stdout around a [`ChatSession`].
pub struct TerminalChat {
    session: ChatSession,
    profile: AssistantProfile,
}

impl TerminalChat {
    pub fn new(session: ChatSession, profile: AssistantProfile) -> Self {
        Self { session, profile }
    }

    pub async fn run(mut self) -> Result<(), DomainError> {
        let mut out = io::stdout();
        writeln!(out, "{}\n", TITLE.bold())?;

        match provisioned_token() {
            TokenSource::Provisioned(token) => {
                if self.session.set_credential(&token).is_ok() {
                    print_success(&mut out, KEY_PROVIDED)?;
                } else {
                    print_warning(&mut out, "The provisioned API token is not valid.")?;
                    self.prompt_token(&mut out).await?;
                }
            }
            TokenSource::Missing => self.prompt_token(&mut out).await?,
        }

        writeln!(out, "{}", sidebar(&self.session, self.profile))?;
        writeln!(out, "Type /help for commands.\n")?;
        self.print_history(&mut out)?;

        loop {
            let prompt = if self.session.is_input_enabled() {
                "> "
            } else {
                "(locked) > "
            };
            let Some(line) = read_line(prompt).await? else {
                break;
            };

            match parse_chat_command(&line) {
                ParsedChatCommand::NotACommand => self.send(&line, &mut out).await?,
                ParsedChatCommand::Command(ChatCommand::Exit) => break,
                ParsedChatCommand::Command(command) => {
                    self.handle_command(command, &mut out).await?
                }
                ParsedChatCommand::MissingArgument { usage } => {
                    print_warning(&mut out, &format!("Usage: {usage}"))?
                }
                ParsedChatCommand::UnknownCommand(name) => print_warning(
                    &mut out,
                    &format!("Unknown command {name}. Type /help for commands."),
                )?,
            }
        }

        debug!("Chat loop finished");
        Ok(())
    }

    async fn send(&mut self, line: &str, out: &mut impl Write) -> Result<(), DomainError> {
        if line.trim().is_empty() {
            return Ok(());
        }
        if !self.session.is_input_enabled() {
            print_warning(out, KEY_MISSING)?;
            return print_warning(out, "Use /token to enter your API token.");
        }

        let mut renderer = TerminalRenderer::stdout();
        let result = self.session.submit(line, &mut renderer).await;
        self.report(result.map(|_| ()), out)
    }

    async fn handle_command(
        &mut self,
        command: ChatCommand,
        out: &mut impl Write,
    ) -> Result<(), DomainError> {
        match command {
            ChatCommand::Exit => {}
            ChatCommand::Help => writeln!(out, "{CHAT_HELP}\n")?,
            ChatCommand::Clear => {
                self.session.clear();
                print_success(out, "Chat history cleared.")?;
                self.print_history(out)?;
            }
            ChatCommand::Model(None) => {
                writeln!(out, "{}", model_list(self.session.parameters().model()))?
            }
            ChatCommand::Model(Some(name)) => {
                let params = *self.session.parameters();
                let result = name
                    .parse::<ModelChoice>()
                    .map(|model| params.with_model(model));
                self.apply_parameters(result, out)?;
            }
            ChatCommand::Temperature(value) => {
                let params = *self.session.parameters();
                let result = parse_value(&value).and_then(|v| params.with_temperature(v));
                self.apply_parameters(result, out)?;
            }
            ChatCommand::TopP(value) => {
                let params = *self.session.parameters();
                let result = parse_value(&value).and_then(|v| params.with_top_p(v));
                self.apply_parameters(result, out)?;
            }
            ChatCommand::Token => self.prompt_token(out).await?,
            ChatCommand::History => self.print_history(out)?,
            ChatCommand::Status => writeln!(out, "{}", sidebar(&self.session, self.profile))?,
            ChatCommand::Retry => {
                let mut renderer = TerminalRenderer::stdout();
                let result = self.session.respond_pending(&mut renderer).await;
                self.report(result.map(|_| ()), out)?;
            }
        }
        Ok(())
    }

    fn apply_parameters(
        &mut self,
        result: Result<GenerationParameters, DomainError>,
        out: &mut impl Write,
    ) -> Result<(), DomainError> {
        match result {
            Ok(params) => {
                self.session.set_parameters(params);
                print_success(
                    out,
                    &format!(
                        "{} | temperature {:.2} | top_p {:.2}",
                        params.model().label(),
                        params.temperature(),
                        params.top_p()
                    ),
                )
            }
            Err(e) => print_warning(out, &e.to_string()),
        }
    }

    async fn prompt_token(&mut self, out: &mut impl Write) -> Result<(), DomainError> {
        let entered = tokio::task::spawn_blocking(|| read_masked(TOKEN_PROMPT))
            .await
            .map_err(|e| DomainError::internal(format!("token prompt failed: {e}")))?;

        let token = match entered {
            Ok(token) => token,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => None,
            Err(e) => return Err(e.into()),
        };

        let accepted = token
            .map(|t| self.session.set_credential(&t).is_ok())
            .unwrap_or(false);
        if accepted {
            print_success(out, KEY_ACCEPTED)
        } else {
            print_warning(out, KEY_MISSING)
        }
    }

    fn print_history(&self, out: &mut impl Write) -> Result<(), DomainError> {
        for message in self.session.messages() {
            print_message(out, message)?;
        }
        out.flush()?;
        Ok(())
    }

    fn report(
        &self,
        result: Result<(), DomainError>,
        out: &mut impl Write,
    ) -> Result<(), DomainError> {
        match result {
            Ok(()) => Ok(()),
            Err(DomainError::InvalidInput(_)) => Ok(()),
            Err(e @ DomainError::IoError(_)) => Err(e),
            Err(e) if e.is_provider_error() => {
                warn!("Turn failed: {}", e);
                print_warning(out, &format!("Request failed: {e}"))?;
                print_warning(out, "Type /retry to ask again.")
            }
            Err(e) => print_warning(out, &e.to_string()),
        }
    }
}

/// The "Model and Parameters" block.
pub fn sidebar(session: &ChatSession, profile: AssistantProfile) -> String {
    let params = session.parameters();
    let credential = if session.is_input_enabled() {
        "provided"
    } else {
        "missing"
    };
    format!(
        "Model and Parameters\n  \
         Model:       {}\n  \
         Temperature: {:.2}\n  \
         Top P:       {:.2}\n  \
         Profile:     {}\n  \
         Provider:    {}\n  \
         API token:   {}\n",
        params.model().label(),
        params.temperature(),
        params.top_p(),
        profile,
        session.provider_name(),
        credential
    )
}

pub fn model_list(current: ModelChoice) -> String {
    ModelChoice::ALL
        .iter()
        .map(|model| {
            let marker = if *model == current { "*" } else { " " };
            format!("{marker} {:<12} {:<24} {}", model.key(), model.label(), model.identifier())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_value(value: &str) -> Result<f64, DomainError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| DomainError::invalid_input(format!("'{value}' is not a number")))
}

async fn read_line(prompt: &'static str) -> Result<Option<String>, DomainError> {
    let line = tokio::task::spawn_blocking(move || -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt.bold())?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    })
    .await
    .map_err(|e| DomainError::internal(format!("input reader failed: {e}")))?;

    Ok(line?)
}

fn print_success(out: &mut impl Write, text: &str) -> Result<(), DomainError> {
    writeln!(out, "{}", text.green())?;
    Ok(())
}

fn print_warning(out: &mut impl Write, text: &str) -> Result<(), DomainError> {
    writeln!(out, "{}", text.yellow())?;
    Ok(())
}
