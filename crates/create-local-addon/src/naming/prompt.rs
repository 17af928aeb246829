//! Interactive prompting seam.
//!
//! The negotiator only needs "ask this, get a line back"; [`StdioPrompter`]
//! is the terminal implementation and tests substitute scripted answers.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// A question put to the user, with the answer used when they enter nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    message: String,
    default: String,
}

impl Prompt {
    /// Creates a prompt.
    #[must_use]
    pub fn new(message: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            default: default.into(),
        }
    }

    /// Question text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Answer assumed for an empty reply.
    #[must_use]
    pub fn default_answer(&self) -> &str {
        &self.default
    }

    /// Substitutes the default for a blank reply.
    #[must_use]
    pub fn resolve(&self, answer: &str) -> String {
        let trimmed = answer.trim();
        if trimmed.is_empty() {
            self.default.clone()
        } else {
            trimmed.to_owned()
        }
    }
}

/// Errors raised while reading an answer.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The input stream ended before an answer was given.
    #[error("input closed while waiting for an answer to '{message}'")]
    Closed {
        /// Question that went unanswered.
        message: String,
    },
    /// Reading from or writing to the terminal failed.
    #[error("failed to prompt for '{message}'")]
    Io {
        /// Question being asked.
        message: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Source of answers to [`Prompt`]s.
pub trait Prompter {
    /// Asks `prompt` and returns the raw reply. Blocks until one arrives.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError`] when no reply can be obtained.
    fn ask(&mut self, prompt: &Prompt) -> Result<String, PromptError>;
}

/// Prompts on a line-oriented reader/writer pair, typically stdin/stdout.
pub struct StdioPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> StdioPrompter<R, W> {
    /// Wraps the given streams.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for StdioPrompter<R, W> {
    fn ask(&mut self, prompt: &Prompt) -> Result<String, PromptError> {
        let io_error = |source: io::Error| PromptError::Io {
            message: prompt.message().to_owned(),
            source,
        };
        write!(
            self.output,
            "? {} ({}) ",
            prompt.message(),
            prompt.default_answer()
        )
        .map_err(io_error)?;
        self.output.flush().map_err(io_error)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(io_error)?;
        if read == 0 {
            return Err(PromptError::Closed {
                message: prompt.message().to_owned(),
            });
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_owned())
    }
}
