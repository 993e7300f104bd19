//! Errors reported before search starts.

use thiserror::Error;

/// A model or configuration problem detected before any search step.
///
/// Search exhaustion is not an error: it is reported as
/// [`SearchStatus::NoSolution`](super::SearchStatus::NoSolution) inside a
/// successful [`CspResult`](super::CspResult).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CspError<V: std::fmt::Debug> {
    /// A variable has no legal value, so the model is unsatisfiable by
    /// construction.
    #[error("variable {0:?} has an empty domain")]
    EmptyDomain(V),

    /// The same variable was declared twice.
    #[error("variable {0:?} is declared more than once")]
    DuplicateVariable(V),

    /// The solver configuration is invalid.
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e: CspError<&str> = CspError::EmptyDomain("x");
        assert_eq!(e.to_string(), "variable \"x\" has an empty domain");

        let e: CspError<u32> = CspError::DuplicateVariable(7);
        assert_eq!(e.to_string(), "variable 7 is declared more than once");

        let e: CspError<u32> = CspError::InvalidConfig("max_nodes must be positive".into());
        assert!(e.to_string().contains("max_nodes"));
    }
}
