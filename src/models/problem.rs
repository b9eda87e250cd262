use serde::{Deserialize, Serialize};

/// Longest slice of a rejected line kept in the problem report
pub const MAX_PROBLEM_CONTENT_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemLine {
    /// 1-based line number within the chunk file
    pub line: usize,
    pub content: String,
    pub error: String,
}

impl ProblemLine {
    pub fn new(line: usize, content: &str, error: impl Into<String>) -> Self {
        Self {
            line,
            content: content.chars().take(MAX_PROBLEM_CONTENT_CHARS).collect(),
            error: error.into(),
        }
    }
}
