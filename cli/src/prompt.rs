//! Line-oriented terminal input for interactive commands.
//!
//! Stdin is read on the blocking pool so the username check and other
//! background tasks keep running while the user types.

#[cfg(test)]
#[path = "prompt_test.rs"]
mod prompt_test;

use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::CliError;

/// A line typed at a wizard prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Value(String),
    Back,
    Code,
    Forgot,
    Resend,
    Quit,
}

impl Input {
    /// Words starting with `:` are commands; anything else is field input.
    pub fn parse(line: &str) -> Result<Self, CliError> {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix(':') else {
            return Ok(Self::Value(trimmed.to_owned()));
        };
        match command {
            "back" | "b" => Ok(Self::Back),
            "code" => Ok(Self::Code),
            "forgot" => Ok(Self::Forgot),
            "resend" => Ok(Self::Resend),
            "quit" | "q" => Ok(Self::Quit),
            other => Err(CliError::InvalidArg(format!("unknown command :{other}"))),
        }
    }
}

/// Print `label` and read one line. End of input reads as `:quit`.
pub async fn ask(label: &str) -> Result<Input, CliError> {
    let label = label.to_owned();
    let line = tokio::task::spawn_blocking(move || read_line(&label))
        .await
        .map_err(|e| CliError::Prompt(e.to_string()))??;
    match line {
        Some(line) => Input::parse(&line),
        None => Ok(Input::Quit),
    }
}

/// Like [`ask`], but commands are not expected and quitting is an error.
pub async fn ask_value(label: &str) -> Result<String, CliError> {
    match ask(label).await? {
        Input::Value(value) => Ok(value),
        Input::Quit => Err(CliError::Cancelled),
        other => Err(CliError::InvalidArg(format!("{other:?} is not valid here"))),
    }
}

/// Yes/no question; anything other than `y` or `yes` is no.
pub async fn confirm(label: &str) -> Result<bool, CliError> {
    let answer = ask_value(&format!("{label} [y/N]")).await?;
    Ok(is_yes(&answer))
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn read_line(label: &str) -> io::Result<Option<String>> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{label}: ")?;
    stdout.flush()?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    Ok((read > 0).then_some(line))
}

/// Image content type from a file extension.
pub fn image_content_type(path: &Path) -> Result<&'static str, CliError> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        _ => Err(CliError::InvalidArg(format!("unsupported image type: {}", path.display()))),
    }
}
