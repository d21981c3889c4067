//! Line-oriented interactive session.
//!
//! Drives an [`InputCoordinator`](crate::input::InputCoordinator) and a
//! [`GenerationTrigger`] from text commands, standing in for the file
//! picker, URL field, drop area, paste target and generate button of a
//! graphical front end.

use crate::input::{ClipboardItem, ImageFile};
use crate::trigger::{GenerationTrigger, TriggerOutcome};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const HELP: &str = "\
commands:
  file [path]        choose a file (no path: dismiss the picker)
  url <text>         type into the URL field
  drop <path>...     drop files onto the upload area
  paste <path|text>  paste an image file or text
  reset              clear every input
  status             show inputs and the last result
  generate <prompt>  generate from the current input
  help               show this message
  quit               leave the session";

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// File picker change.
    File(Option<PathBuf>),
    /// URL field contents.
    Url(String),
    /// Files dropped on the upload area.
    Drop(Vec<PathBuf>),
    /// Clipboard contents: an image file path or plain text.
    Paste(String),
    /// Clear every input.
    Reset,
    /// Print the current state.
    Status,
    /// Trigger a generation.
    Generate(String),
    /// Print usage.
    Help,
    /// End the session.
    Quit,
}

impl std::str::FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_start();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));

        match word.trim_end() {
            "file" => {
                let path = rest.trim();
                Ok(Self::File((!path.is_empty()).then(|| PathBuf::from(path))))
            }
            // The URL field keeps raw text, surrounding spaces included.
            "url" => Ok(Self::Url(rest.to_string())),
            "drop" => Ok(Self::Drop(
                rest.split_whitespace().map(PathBuf::from).collect(),
            )),
            "paste" => Ok(Self::Paste(rest.to_string())),
            "reset" => Ok(Self::Reset),
            "status" => Ok(Self::Status),
            "generate" => Ok(Self::Generate(rest.to_string())),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command: {other} (try `help`)")),
        }
    }
}

/// Interactive session over a trigger and its coordinator.
pub struct Session {
    trigger: GenerationTrigger,
}

impl Session {
    /// Creates a session.
    pub fn new(trigger: GenerationTrigger) -> Self {
        Self { trigger }
    }

    /// Reads commands from `reader` until EOF or `quit`, writing replies to
    /// `writer`.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let reply = match line.parse::<SessionCommand>() {
                Ok(SessionCommand::Quit) => break,
                Ok(command) => self.handle(command).await,
                Err(e) => e,
            };

            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }

    /// Applies one command and returns the text to show.
    pub async fn handle(&self, command: SessionCommand) -> String {
        let inputs = self.trigger.inputs();

        match command {
            SessionCommand::File(path) => {
                inputs.set_from_file(path.map(ImageFile::from_path)).await;
                self.input_line()
            }
            SessionCommand::Url(text) => {
                inputs.set_from_url(&text);
                self.input_line()
            }
            SessionCommand::Drop(paths) => {
                let files = paths.into_iter().map(ImageFile::from_path).collect();
                inputs.set_from_drop(files).await;
                self.input_line()
            }
            SessionCommand::Paste(content) => {
                let path = PathBuf::from(content.trim());
                if !content.trim().is_empty() && path.is_file() {
                    let file = ImageFile::from_path(path);
                    let item = ClipboardItem {
                        mime_type: file.mime_type.clone().unwrap_or_default(),
                        file: Some(file),
                    };
                    inputs.set_from_paste(vec![item], None).await;
                } else {
                    inputs.set_from_paste(Vec::new(), Some(content)).await;
                }
                self.input_line()
            }
            SessionCommand::Reset => {
                inputs.reset();
                self.input_line()
            }
            SessionCommand::Status => self.status(),
            SessionCommand::Generate(prompt) => match self.trigger.trigger(&prompt).await {
                TriggerOutcome::Generated { url } => format!("generated: {url}"),
                TriggerOutcome::Busy => "busy: a generation is already running".to_string(),
                outcome => outcome
                    .notice()
                    .map(|n| n.message().to_string())
                    .unwrap_or_default(),
            },
            SessionCommand::Help => HELP.to_string(),
            SessionCommand::Quit => String::new(),
        }
    }

    fn input_line(&self) -> String {
        let snapshot = self.trigger.inputs().snapshot();
        match (&snapshot.current, snapshot.source_channel) {
            (Some(source), Some(channel)) => {
                format!("input: {} (via {})", source.describe(), channel)
            }
            (Some(source), None) => format!("input: {}", source.describe()),
            (None, _) => "input: none".to_string(),
        }
    }

    fn status(&self) -> String {
        let snapshot = self.trigger.inputs().snapshot();
        let view = self.trigger.view();

        let mut out = self.input_line();
        out.push_str(&format!(
            "\nfile picker: {}",
            snapshot.file_selection.as_deref().unwrap_or("-")
        ));
        out.push_str(&format!("\nurl field: {}", snapshot.url_field));
        out.push_str(&format!(
            "\ngenerate: {}",
            if view.busy() { "busy" } else { "ready" }
        ));
        out.push_str(&format!(
            "\nresult: {}",
            view.visible_result().unwrap_or("-")
        ));
        out
    }
}
