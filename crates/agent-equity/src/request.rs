//! Per-ticker and batch requests

/// One ticker to summarize, with the instructions sent alongside it
///
/// Instructions are passed to the backend in order. Whether the ticker
/// exists is not checked here; see [`crate::validator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRequest {
    ticker: String,
    instructions: Vec<String>,
}

impl TickerRequest {
    /// Create a request with no instructions
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            instructions: Vec::new(),
        }
    }

    /// Append one instruction
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    /// Append several instructions, keeping their order
    pub fn with_instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions
            .extend(instructions.into_iter().map(Into::into));
        self
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    /// Query sent to the backend for this ticker
    pub fn query(&self) -> String {
        format!(
            "Analyze the ticker {} to provide a detailed investment report",
            self.ticker
        )
    }
}

/// Ordered tickers processed by one use-case run
///
/// Output is concatenated in this order. An empty batch is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRequest {
    requests: Vec<TickerRequest>,
}

impl BatchRequest {
    pub fn new(requests: Vec<TickerRequest>) -> Self {
        Self { requests }
    }

    /// Build a batch where every ticker shares the same instructions
    pub fn from_tickers<I, S>(tickers: I, instructions: &[String]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requests = tickers
            .into_iter()
            .map(|t| TickerRequest::new(t).with_instructions(instructions.iter().cloned()))
            .collect();
        Self { requests }
    }

    pub fn requests(&self) -> &[TickerRequest] {
        &self.requests
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TickerRequest> {
        self.requests.iter()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl From<TickerRequest> for BatchRequest {
    fn from(request: TickerRequest) -> Self {
        Self::new(vec![request])
    }
}

impl<'a> IntoIterator for &'a BatchRequest {
    type Item = &'a TickerRequest;
    type IntoIter = std::slice::Iter<'a, TickerRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
