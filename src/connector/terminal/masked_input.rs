use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Prompt for a secret, echoing `*` per character.
///
/// Falls back to reading a plain line when stdin is not a terminal. Returns
/// `Ok(None)` on end of input; Ctrl-C yields `ErrorKind::Interrupted`.
pub fn read_masked(prompt: &str) -> io::Result<Option<String>> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    if !io::stdin().is_terminal() {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        writeln!(stdout)?;
        return Ok((read > 0).then(|| line.trim_end_matches(['\r', '\n']).to_string()));
    }

    enable_raw_mode()?;
    let result = read_masked_raw(&mut stdout);
    disable_raw_mode()?;
    write!(stdout, "\r\n")?;
    stdout.flush()?;
    result.map(Some)
}

fn read_masked_raw(out: &mut impl Write) -> io::Result<String> {
    let mut secret = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => break,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "input cancelled"));
            }
            KeyCode::Backspace => {
                if secret.pop().is_some() {
                    write!(out, "\x08 \x08")?;
                }
            }
            KeyCode::Char(c) => {
                secret.push(c);
                write!(out, "*")?;
            }
            _ => {}
        }
        out.flush()?;
    }
    Ok(secret)
}
