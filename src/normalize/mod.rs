//! Result normalization.
//!
//! A tool's text payload arrives in one of two historical layouts: a JSON
//! object (current servers) or delimited text (older servers). Both are
//! mapped into [`CanonicalResult`] by an ordered chain of
//! [`NormalizeStrategy`] implementations; the first strategy that accepts
//! the payload wins.
//!
//! Whatever strategy runs, the shape of the result depends only on the tool
//! that was called.

mod legacy;
mod structured;

pub use legacy::LegacyTextStrategy;
pub use structured::StructuredStrategy;

use std::fmt::Debug;

use crate::models::{CanonicalResult, SearchTool, ToolOutcome};

/// Line prefix that marks an error report in a payload
pub const ERROR_PREFIX: &str = "ERROR:";

/// One way of reading a tool payload
pub trait NormalizeStrategy: Send + Sync + Debug {
    /// Strategy name, for logging
    fn name(&self) -> &'static str;

    /// Normalize `raw`, or return `None` if this strategy does not apply
    fn normalize(&self, raw: &str, tool: SearchTool) -> Option<ToolOutcome>;
}

/// Ordered chain of normalization strategies
#[derive(Debug)]
pub struct Normalizer {
    strategies: Vec<Box<dyn NormalizeStrategy>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
            .with_strategy(StructuredStrategy)
            .with_strategy(LegacyTextStrategy)
    }
}

impl Normalizer {
    /// An empty chain
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy to the chain
    pub fn with_strategy(mut self, strategy: impl NormalizeStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Names of the strategies, in the order they are tried
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Normalize the payload of a call to `tool_name`
    pub fn normalize(&self, raw: &str, tool_name: &str) -> ToolOutcome {
        let tool = SearchTool::from_name(tool_name);

        if let Some(message) = find_error_line(raw) {
            return ToolOutcome::error(message);
        }

        for strategy in &self.strategies {
            if let Some(outcome) = strategy.normalize(raw, tool) {
                tracing::debug!(strategy = strategy.name(), tool = %tool, "normalized tool payload");
                return outcome;
            }
        }

        tracing::debug!(tool = %tool, "no strategy accepted the payload");
        CanonicalResult::empty(tool, "").into()
    }
}

/// Normalize with the default chain
pub fn normalize(raw: &str, tool_name: &str) -> ToolOutcome {
    Normalizer::default().normalize(raw, tool_name)
}

/// The message of the first `ERROR:` line, if any
fn find_error_line(raw: &str) -> Option<String> {
    raw.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(ERROR_PREFIX))
        .map(|message| message.trim().to_string())
}
