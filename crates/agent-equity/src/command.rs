//! Chat-style digest commands
//!
//! A digest command is a message whose first line is the trigger word
//! followed by ticker symbols. Any further lines are extra instructions:
//!
//! ```text
//! stock_daily_digest AAPL tsla MSFT
//! Focus on the last quarter's earnings
//! ```

use crate::container::Application;
use crate::render::render_outcome;
use crate::validator::{TickerValidator, normalize_tickers, partition_tickers};
use tracing::info;

/// Parsed digest command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestCommand {
    /// Normalized symbols, first occurrence order
    pub tickers: Vec<String>,
    /// Lines after the first, trimmed, blanks dropped
    pub instructions: Vec<String>,
}

impl DigestCommand {
    /// Parse `text`, returning `None` unless it starts with `trigger`
    ///
    /// Leading chat mentions (`<@U123>`) are skipped. The trigger is matched
    /// case-insensitively.
    pub fn parse(text: &str, trigger: &str) -> Option<Self> {
        let mut lines = text.lines();
        let first = lines.next()?;

        let mut words = first
            .split_whitespace()
            .skip_while(|w| w.starts_with("<@") && w.ends_with('>'));
        if !words.next()?.eq_ignore_ascii_case(trigger) {
            return None;
        }

        let tickers = normalize_tickers(words);
        let instructions = lines
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        Some(Self {
            tickers,
            instructions,
        })
    }

    /// Build the replies a chat bot would post for this command
    ///
    /// One acknowledgement, then one reply per valid ticker. Each ticker runs
    /// as its own batch so one failure does not hide the others.
    pub async fn respond(
        &self,
        app: &Application,
        validator: &dyn TickerValidator,
    ) -> Vec<String> {
        let partition = partition_tickers(validator, &self.tickers).await;

        if partition.valid.is_empty() {
            return vec![usage(&app.config().trigger)];
        }

        let mut replies = vec![format!("valid symbols: {}", partition.valid.join(", "))];
        if !partition.invalid.is_empty() {
            replies.push(format!(
                "ignored invalid symbols: {}",
                partition.invalid.join(", ")
            ));
        }

        info!("Digest for {}", partition.valid.join(", "));
        for (ticker, outcome) in app.summarize_each(partition.valid.as_slice(), &self.instructions).await {
            replies.push(format!("**{ticker}**\n{}", render_outcome(&outcome)));
        }

        replies
    }
}

/// Reply sent when a command has no usable symbols
pub fn usage(trigger: &str) -> String {
    format!("No valid stock symbols found!\n\nUsage: {trigger} AAPL TSLA MSFT GOOGL AMZN")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, DEFAULT_TRIGGER, DigestConfig, ProviderKind};
    use crate::validator::MockTickerValidator;
    use agent_core::RetryPolicy;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_symbols_and_instructions() {
        let cmd = DigestCommand::parse(
            "stock_daily_digest aapl TSLA aapl\n\n  Focus on dividends  \nUse tables",
            DEFAULT_TRIGGER,
        )
        .unwrap();

        assert_eq!(cmd.tickers, ["AAPL", "TSLA"]);
        assert_eq!(cmd.instructions, ["Focus on dividends", "Use tables"]);
    }

    #[test]
    fn test_parse_skips_mentions() {
        let cmd = DigestCommand::parse("<@U024BE7LH> Stock_Daily_Digest VTI", DEFAULT_TRIGGER).unwrap();
        assert_eq!(cmd.tickers, ["VTI"]);
        assert!(cmd.instructions.is_empty());
    }

    #[test]
    fn test_other_messages_ignored() {
        assert_eq!(DigestCommand::parse("hello there", DEFAULT_TRIGGER), None);
        assert_eq!(DigestCommand::parse("", DEFAULT_TRIGGER), None);
        assert_eq!(DigestCommand::parse("please stock_daily_digest AAPL", DEFAULT_TRIGGER), None);
    }

    #[tokio::test]
    async fn test_no_valid_symbols_replies_with_usage() {
        let config = DigestConfig::builder()
            .backend(BackendConfig::new(ProviderKind::Groq, "k"))
            .build()
            .unwrap();
        let app = Application::from_config(config).unwrap();
        let mut validator = MockTickerValidator::new();
        validator.expect_is_valid().returning(|_| false);

        let cmd = DigestCommand::parse("stock_daily_digest NOPE", DEFAULT_TRIGGER).unwrap();
        let replies = cmd.respond(&app, &validator).await;

        assert_eq!(replies, [usage(DEFAULT_TRIGGER)]);
    }

    #[tokio::test]
    async fn test_failing_ticker_does_not_hide_others() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Analyze the ticker AAPL"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Analyze the ticker MSFT"))
            .and(body_string_contains("Focus on dividends"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "MSFT report"},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = DigestConfig::builder()
            .backend(
                BackendConfig::new(ProviderKind::Groq, "test-key")
                    .with_name("Agent1")
                    .with_api_base(server.uri()),
            )
            .retry_policy(&RetryPolicy::fast())
            .build()
            .unwrap();
        let app = Application::from_config(config).unwrap();
        let mut validator = MockTickerValidator::new();
        validator
            .expect_is_valid()
            .returning(|ticker| ticker != "NOPE");

        let cmd = DigestCommand::parse(
            "stock_daily_digest aapl nope MSFT\nFocus on dividends",
            DEFAULT_TRIGGER,
        )
        .unwrap();
        let replies = cmd.respond(&app, &validator).await;

        assert_eq!(replies.len(), 4);
        assert_eq!(replies[0], "valid symbols: AAPL, MSFT");
        assert_eq!(replies[1], "ignored invalid symbols: NOPE");
        assert!(replies[2].starts_with(
            "**AAPL**\nError [AGENT_EXECUTION_ERROR]: 1 agents failed to provide an answer.\n  - Agent1: [Agent1]"
        ));
        assert_eq!(replies[2].matches("Error [AGENT_EXECUTION_ERROR]").count(), 1);
        assert_eq!(replies[3], "**MSFT**\nMSFT report");
    }
}
