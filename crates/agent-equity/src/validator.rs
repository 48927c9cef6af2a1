//! Ticker validation against market data

use crate::error::{EquityError, Result};
use async_trait::async_trait;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Checks that a symbol refers to a listed instrument
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TickerValidator: Send + Sync {
    async fn is_valid(&self, ticker: &str) -> bool;
}

/// Validator backed by Yahoo Finance quotes
///
/// A ticker is valid when Yahoo returns a latest quote for it. Any error,
/// network failures included, counts as invalid.
pub struct YahooTickerValidator {
    connector: yahoo::YahooConnector,
}

impl YahooTickerValidator {
    pub fn new() -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| EquityError::YahooFinanceError(e.to_string()))?;
        Ok(Self { connector })
    }
}

#[async_trait]
impl TickerValidator for YahooTickerValidator {
    async fn is_valid(&self, ticker: &str) -> bool {
        match self.connector.get_latest_quotes(ticker, "1d").await {
            Ok(response) => response.last_quote().is_ok(),
            Err(e) => {
                debug!("No quote for {}: {}", ticker, e);
                false
            }
        }
    }
}

/// Tickers split by validity, each list in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerPartition {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

/// Trim and uppercase symbols, dropping blanks and repeats
pub fn normalize_tickers<I, S>(tickers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = Vec::new();
    for ticker in tickers {
        let ticker = ticker.as_ref().trim().to_uppercase();
        if !ticker.is_empty() && !seen.contains(&ticker) {
            seen.push(ticker);
        }
    }
    seen
}

/// Normalize `tickers` and check each one with `validator`
pub async fn partition_tickers<I, S>(validator: &dyn TickerValidator, tickers: I) -> TickerPartition
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut partition = TickerPartition::default();
    for ticker in normalize_tickers(tickers) {
        if validator.is_valid(&ticker).await {
            partition.valid.push(ticker);
        } else {
            debug!("Rejected ticker {}", ticker);
            partition.invalid.push(ticker);
        }
    }
    partition
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dedups_preserving_order() {
        let tickers = normalize_tickers([" aapl", "MSFT", "AAPL", "", "tsla "]);
        assert_eq!(tickers, ["AAPL", "MSFT", "TSLA"]);
    }

    #[tokio::test]
    async fn test_partition_keeps_input_order() {
        let mut validator = MockTickerValidator::new();
        validator
            .expect_is_valid()
            .returning(|ticker| ticker != "ZZZZ");

        let partition = partition_tickers(&validator, ["msft", "zzzz", "aapl", "MSFT"]).await;

        assert_eq!(partition.valid, ["MSFT", "AAPL"]);
        assert_eq!(partition.invalid, ["ZZZZ"]);
    }

    #[tokio::test]
    async fn test_each_ticker_checked_once() {
        let mut validator = MockTickerValidator::new();
        validator.expect_is_valid().times(2).returning(|_| true);

        let partition = partition_tickers(&validator, ["AAPL", "aapl", "GOOG"]).await;

        assert_eq!(partition.valid.len(), 2);
        assert!(partition.invalid.is_empty());
    }
}
