use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::application::ResponseRenderer;
use crate::domain::{Message, Role};

/// Streams the assistant reply to a terminal as it grows.
///
/// Only the new suffix of each partial is written. When a partial does not
/// extend what is already shown (an apology after a half-streamed reply),
/// the replacement starts on a fresh line.
pub struct TerminalRenderer<W: Write + Send = Stdout> {
    out: W,
    spinner: Option<ProgressBar>,
    show_spinner: bool,
    shown: String,
    labelled: bool,
    write_failed: bool,
}

impl TerminalRenderer<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), true)
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, show_spinner: bool) -> Self {
        Self {
            out,
            spinner: None,
            show_spinner,
            shown: String::new(),
            labelled: false,
            write_failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Rendering never fails the turn; the first write error is logged and
    /// later ones are dropped.
    fn check(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            if !self.write_failed {
                warn!("Could not write the reply to the terminal: {}", e);
                self.write_failed = true;
            }
        }
    }

    fn write_label(&mut self) {
        if !self.labelled {
            self.stop_spinner();
            let result = write!(self.out, "{} ", role_label(Role::Assistant));
            self.check(result);
            self.labelled = true;
        }
    }

    fn write_text(&mut self, text: &str) {
        self.write_label();
        let result = match text.strip_prefix(self.shown.as_str()) {
            Some(delta) => write!(self.out, "{delta}"),
            None => write!(self.out, "\n{text}"),
        }
        .and_then(|()| self.out.flush());
        self.check(result);
        self.shown.clear();
        self.shown.push_str(text);
    }
}

impl<W: Write + Send> ResponseRenderer for TerminalRenderer<W> {
    fn begin(&mut self) {
        self.shown.clear();
        self.labelled = false;
        if self.show_spinner {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message("Thinking...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            self.spinner = Some(spinner);
        }
    }

    fn render(&mut self, partial: &str) {
        self.write_text(partial);
    }

    fn finish(&mut self, committed: &str) {
        if self.shown != committed {
            self.write_text(committed);
        }
        self.stop_spinner();
        let result = writeln!(self.out, "\n").and_then(|()| self.out.flush());
        self.check(result);
        self.shown.clear();
        self.labelled = false;
    }
}

pub fn role_label(role: Role) -> String {
    let label = format!("{}:", role.label());
    match role {
        Role::User => label.bold().green().to_string(),
        Role::Assistant => label.bold().cyan().to_string(),
    }
}

/// Write one finished transcript entry.
pub fn print_message(out: &mut impl Write, message: &Message) -> io::Result<()> {
    writeln!(out, "{} {}", role_label(message.role()), message.content())?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(renderer: TerminalRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_are_recorded_not_raised() {
        let mut renderer = TerminalRenderer::new(BrokenPipe, false);
        assert!(!renderer.write_failed);

        renderer.begin();
        renderer.render("Rest");
        renderer.render("Rest well");
        renderer.finish("Rest well");

        assert!(renderer.write_failed);
        assert!(renderer.shown.is_empty());
    }

    #[test]
    fn writes_only_new_suffix() {
        let mut renderer = TerminalRenderer::new(Vec::new(), false);
        renderer.begin();
        renderer.render("Hel");
        renderer.render("Hello");
        renderer.finish("Hello");

        let text = output(renderer);
        assert_eq!(text.matches("Hel").count(), 1);
        assert!(text.ends_with("Hello\n\n"));
    }

    #[test]
    fn committed_text_without_frames_is_printed() {
        let mut renderer = TerminalRenderer::new(Vec::new(), false);
        renderer.finish("Refused.");

        assert!(output(renderer).contains("Refused."));
    }

    #[test]
    fn replacement_starts_on_new_line() {
        let mut renderer = TerminalRenderer::new(Vec::new(), false);
        renderer.begin();
        renderer.render("Partial");
        renderer.render("Sorry");
        renderer.finish("Sorry");

        let text = output(renderer);
        assert!(text.contains("Partial\nSorry"));
    }
}
