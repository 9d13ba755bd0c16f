//! Subcommands and their execution.

use std::io::{self, Read};

use anyhow::Context;
use clap::{Args, Subcommand};
use forprompt_client::{
    ClientConfig, ForPromptClient, LogMessage, RedactionConfig, available_patterns, redact_pii,
};
use serde_json::{Value, json};

use crate::TRACING_TARGET_COMMAND;

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch a single prompt
    Get {
        /// Prompt key
        key: String,
        /// Pin a version instead of the active one
        #[arg(long = "prompt-version")]
        version: Option<u32>,
    },
    /// Fetch several prompts; failed keys are omitted
    GetMany {
        /// Prompt keys
        #[arg(required = true)]
        keys: Vec<String>,
        /// Pin a version instead of the active one
        #[arg(long = "prompt-version")]
        version: Option<u32>,
    },
    /// Log a single message in its own trace
    Log(LogArgs),
    /// Redact PII from text (reads stdin when no text is given)
    Redact {
        /// Text to redact
        text: Option<String>,
        /// Restrict to the named pattern; repeatable
        #[arg(long = "pattern", value_name = "NAME")]
        patterns: Vec<String>,
    },
    /// List redaction pattern names
    Patterns,
}

/// Arguments of the `log` subcommand.
#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Prompt key the message belongs to
    #[arg(long = "prompt-key")]
    pub prompt_key: String,
    /// Speaker role
    #[arg(long, default_value = "user")]
    pub role: String,
    /// Message text
    #[arg(long)]
    pub content: String,
    /// Reuse an existing trace id
    #[arg(long = "trace-id")]
    pub trace_id: Option<String>,
    /// Prompt version the message was produced with
    #[arg(long = "prompt-version")]
    pub version: Option<u32>,
    /// Model that produced the message
    #[arg(long)]
    pub model: Option<String>,
    /// Tokens in the model input
    #[arg(long = "input-tokens")]
    pub input_tokens: Option<u64>,
    /// Tokens in the model output
    #[arg(long = "output-tokens")]
    pub output_tokens: Option<u64>,
    /// Generation time in milliseconds
    #[arg(long = "duration-ms")]
    pub duration_ms: Option<u64>,
    /// Send the content without PII redaction
    #[arg(long = "no-redact")]
    pub no_redact: bool,
}

impl LogArgs {
    fn message(&self) -> LogMessage {
        let mut message = LogMessage::new(&self.role, &self.content);
        message.model = self.model.clone();
        message.input_tokens = self.input_tokens;
        message.output_tokens = self.output_tokens;
        message.duration_ms = self.duration_ms;
        if self.no_redact {
            message = message.with_redact_pii(false);
        }
        message
    }
}

impl Command {
    /// Returns the subcommand name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get { .. } => "get",
            Self::GetMany { .. } => "get-many",
            Self::Log(_) => "log",
            Self::Redact { .. } => "redact",
            Self::Patterns => "patterns",
        }
    }

    /// Runs the subcommand and returns its JSON output.
    pub async fn execute(self, config: ClientConfig) -> anyhow::Result<Value> {
        tracing::debug!(
            target: TRACING_TARGET_COMMAND,
            command = self.name(),
            "Executing command"
        );

        match self {
            Self::Get { key, version } => {
                let client = ForPromptClient::new(config).context("failed to create client")?;
                let prompt = client
                    .get_prompt(&key, version)
                    .await
                    .with_context(|| format!("failed to fetch prompt '{key}'"))?;
                Ok(serde_json::to_value(prompt)?)
            }
            Self::GetMany { keys, version } => {
                let client = ForPromptClient::new(config).context("failed to create client")?;
                let prompts = client.get_prompts(keys, version).await;
                Ok(serde_json::to_value(prompts)?)
            }
            Self::Log(args) => {
                let client = ForPromptClient::new(config).context("failed to create client")?;
                let mut logger = client.logger();
                let message = args.message();

                let trace_id = match args.trace_id {
                    Some(trace_id) => {
                        logger.start_trace(&args.prompt_key, Some(trace_id), args.version);
                        let result = logger.log(message).await;
                        let trace_id = logger.trace_id().map(str::to_owned);
                        logger.end_trace();
                        result.context("failed to log message")?;
                        trace_id.unwrap_or_default()
                    }
                    None => logger
                        .log_request(&args.prompt_key, message, args.version)
                        .await
                        .context("failed to log message")?,
                };

                Ok(json!({ "traceId": trace_id }))
            }
            Self::Redact { text, patterns } => {
                let text = match text {
                    Some(text) => text,
                    None => read_stdin().context("failed to read stdin")?,
                };

                let mut redaction = RedactionConfig::default();
                if !patterns.is_empty() {
                    redaction = redaction.with_patterns(patterns);
                }

                Ok(serde_json::to_value(redact_pii(&text, &redaction))?)
            }
            Self::Patterns => Ok(json!(available_patterns())),
        }
    }
}

fn read_stdin() -> io::Result<String> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;
    use crate::config::Cli;

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["forprompt"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_parse_get() {
        let command = parse(&["get", "greeting", "--prompt-version", "2"]);
        assert!(matches!(
            command,
            Command::Get { ref key, version: Some(2) } if key == "greeting"
        ));
    }

    #[test]
    fn test_parse_get_many_requires_keys() {
        assert!(Cli::try_parse_from(["forprompt", "get-many"]).is_err());
        let command = parse(&["get-many", "a", "b"]);
        assert!(matches!(command, Command::GetMany { ref keys, version: None } if keys.len() == 2));
    }

    #[test]
    fn test_parse_log() {
        let Command::Log(args) = parse(&[
            "log",
            "--prompt-key",
            "bot",
            "--content",
            "hi",
            "--model",
            "gpt-4o",
            "--input-tokens",
            "12",
            "--output-tokens",
            "3",
            "--duration-ms",
            "250",
            "--no-redact",
        ]) else {
            panic!("expected log command");
        };

        assert_eq!(args.role, "user");
        let message = args.message();
        assert_eq!(message.content, "hi");
        assert_eq!(message.model.as_deref(), Some("gpt-4o"));
        assert_eq!(message.input_tokens, Some(12));
        assert_eq!(message.output_tokens, Some(3));
        assert_eq!(message.duration_ms, Some(250));
        assert_eq!(message.redact_pii, Some(false));
    }

    #[test]
    fn test_log_flags_have_help() {
        let cli = Cli::command();
        let log = cli.find_subcommand("log").unwrap();
        for id in ["input_tokens", "output_tokens", "duration_ms"] {
            let arg = log.get_arguments().find(|a| a.get_id().as_str() == id).unwrap();
            assert!(arg.get_help().is_some(), "{id} has no help text");
        }
    }

    #[tokio::test]
    async fn test_redact_needs_no_api_key() {
        let command = parse(&[
            "redact",
            "mail a@b.io or call 555-123-4567",
            "--pattern",
            "email",
        ]);

        let output = command.execute(ClientConfig::default()).await.unwrap();
        assert_eq!(output["redacted"], "mail [EMAIL_REDACTED] or call 555-123-4567");
        assert_eq!(output["has_pii"], true);
    }

    #[tokio::test]
    async fn test_patterns_output() {
        let output = Command::Patterns
            .execute(ClientConfig::default())
            .await
            .unwrap();
        assert_eq!(output.as_array().unwrap().len(), 7);
        assert_eq!(output[0], "email");
    }

    #[tokio::test]
    async fn test_get_without_api_key_fails() {
        let command = Command::Get {
            key: "greeting".to_owned(),
            version: None,
        };
        assert!(command.execute(ClientConfig::default()).await.is_err());
    }
}
