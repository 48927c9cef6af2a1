//! Scripted backends for unit tests

use crate::{AgentService, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend that replays a fixed script of responses
pub(crate) struct ScriptedAgent {
    name: String,
    script: Mutex<VecDeque<Result<String>>>,
    fallback: Option<Result<String>>,
    calls: AtomicUsize,
    last_instructions: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    /// Replay `script` once, then fail the test if called again
    pub(crate) fn new(name: &str, script: Vec<Result<String>>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            fallback: None,
            calls: AtomicUsize::new(0),
            last_instructions: Mutex::new(Vec::new()),
        }
    }

    /// Give the same response on every call
    pub(crate) fn repeating(name: &str, response: Result<String>) -> Self {
        Self {
            fallback: Some(response),
            ..Self::new(name, Vec::new())
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_instructions(&self) -> Vec<String> {
        self.last_instructions.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentService for ScriptedAgent {
    async fn answer(&self, _query: &str, instructions: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_instructions.lock().unwrap() = instructions.to_vec();

        let next = self.script.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(response), _) => response,
            (None, Some(response)) => response.clone(),
            (None, None) => panic!("agent '{}' called more often than scripted", self.name),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
