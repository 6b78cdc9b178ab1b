//! Where input lines come from: a batch file or an interactive terminal.

use crate::lexer;
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::BufRead;

/// One line of input, without its trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text(String),
    /// Longer than the configured limit; echoed and rejected, never run.
    Overlong(String),
}

impl Line {
    /// Wrap `text`, flagging it if it exceeds `max_len` bytes.
    pub fn checked(text: String, max_len: usize) -> Self {
        if text.len() > max_len {
            Line::Overlong(text)
        } else {
            Line::Text(text)
        }
    }
}

/// Supplier of input lines for a session.
pub trait LineSource {
    /// Next line, or `None` once input is exhausted.
    ///
    /// `prompt` is shown by sources that talk to a user.
    fn next_line(&mut self, prompt: &str) -> Result<Option<Line>>;
}

/// Lines read from any buffered reader, typically a batch file.
pub struct BatchSource<R> {
    reader: R,
    max_line_length: usize,
}

impl<R: BufRead> BatchSource<R> {
    pub fn new(reader: R, max_line_length: usize) -> Self {
        Self {
            reader,
            max_line_length,
        }
    }
}

impl<R: BufRead> LineSource for BatchSource<R> {
    fn next_line(&mut self, _prompt: &str) -> Result<Option<Line>> {
        let mut buf = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut buf)
            .context("failed to read batch input")?;
        if read == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        let text = String::from_utf8_lossy(&buf).into_owned();
        Ok(Some(Line::checked(text, self.max_line_length)))
    }
}

/// Lines typed at a terminal, with editing and history.
pub struct InteractiveSource {
    editor: DefaultEditor,
    max_line_length: usize,
}

impl InteractiveSource {
    pub fn new(max_line_length: usize) -> Result<Self> {
        let editor = DefaultEditor::new().context("failed to initialize line editor")?;
        Ok(Self {
            editor,
            max_line_length,
        })
    }
}

impl LineSource for InteractiveSource {
    fn next_line(&mut self, prompt: &str) -> Result<Option<Line>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !lexer::is_blank(&line) {
                    self.editor
                        .add_history_entry(line.as_str())
                        .context("failed to record history")?;
                }
                Ok(Some(Line::checked(line, self.max_line_length)))
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(err) => Err(err).context("failed to read from terminal"),
        }
    }
}
