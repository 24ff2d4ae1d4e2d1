use serde::{Deserialize, Serialize};


/// Execution limits. Missing keys in a JSON config fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// How many times a single `while`/`for` loop may run its body before
    /// the run is aborted as a likely infinite loop.
    pub iteration_limit: usize,
    /// How many calls may be active at once, `main` included.
    pub call_depth_limit: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self { iteration_limit: 1000, call_depth_limit: 64 }
    }
}

impl InterpreterConfig {
    pub fn from_json_str(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }

    pub fn with_iteration_limit(mut self, iteration_limit: usize) -> Self {
        self.iteration_limit = iteration_limit;
        self
    }

    pub fn with_call_depth_limit(mut self, call_depth_limit: usize) -> Self {
        self.call_depth_limit = call_depth_limit;
        self
    }
}
