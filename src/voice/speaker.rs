//! Speech sinks

use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::SpeechConfig;
use crate::{Error, Result};

/// One-way speech output
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Say `text`, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error if the text could not be spoken
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Prints speech to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSpeaker;

#[async_trait]
impl Speaker for ConsoleSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        tracing::debug!(text, "speaking");
        println!("{text}");
        Ok(())
    }
}

/// Runs an external TTS command with the text as its last argument
///
/// E.g. `espeak -v en` or `say`.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    /// Parse a whitespace-separated command line
    ///
    /// # Errors
    ///
    /// Returns error if the command line is empty
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(ToString::to_string);
        let program = parts
            .next()
            .ok_or_else(|| Error::Config("speech command must not be empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Program that will be run
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Fixed arguments placed before the text
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl Speaker for CommandSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        tracing::debug!(program = %self.program, text, "speaking");

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Speech(format!("{} exited with {status}", self.program)))
        }
    }
}

/// Build the configured speaker, falling back to the console
#[must_use]
pub fn speaker_from_config(config: &SpeechConfig) -> Arc<dyn Speaker> {
    match config.command.as_deref().map(CommandSpeaker::parse) {
        Some(Ok(speaker)) => {
            tracing::info!(program = speaker.program(), "using external speech command");
            Arc::new(speaker)
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "invalid speech command, printing to console");
            Arc::new(ConsoleSpeaker)
        }
        None => Arc::new(ConsoleSpeaker),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        let speaker = CommandSpeaker::parse("espeak -v en").unwrap();
        assert_eq!(speaker.program(), "espeak");
        assert_eq!(speaker.args(), &["-v", "en"]);

        assert!(CommandSpeaker::parse("   ").is_err());
    }

    #[tokio::test]
    async fn test_console_speaker() {
        tokio_test::assert_ok!(ConsoleSpeaker.speak("hello").await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_speaker_exit_status() {
        let speaker = tokio_test::assert_ok!(CommandSpeaker::parse("true"));
        tokio_test::assert_ok!(speaker.speak("hi").await);

        let speaker = tokio_test::assert_ok!(CommandSpeaker::parse("false"));
        let err = tokio_test::assert_err!(speaker.speak("hi").await);
        assert!(matches!(err, Error::Speech(_)));
    }
}
