//! Search configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the engine picks the next variable to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VariableOrdering {
    /// First unassigned variable in declaration order.
    InputOrder,
    /// Minimum remaining values: the variable with the fewest values still
    /// consistent with the current partial assignment. Ties go to the
    /// earliest declared variable.
    Mrv,
    /// MRV with ties broken by the degree heuristic: prefer the variable
    /// whose domain overlaps the domains of the most unassigned variables.
    #[default]
    MrvDegree,
    /// MRV and degree, with any remaining ties broken by the seeded rng.
    MrvRandomTies,
}

/// How the engine orders the candidate values of the chosen variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueOrdering {
    /// Domain declaration order.
    DomainOrder,
    /// Least-constraining value first: candidates ranked by how many
    /// (variable, value) pairs of the other unassigned variables stay
    /// consistent if the candidate is chosen.
    #[default]
    LeastConstraining,
    /// Domain order shuffled by the seeded rng.
    Shuffled,
}

/// Recursion strategy of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SearchMode {
    /// Depth-first recursion; undo happens as the call stack unwinds.
    #[default]
    Recursive,
    /// Explicit frame stack; call-stack depth stays constant regardless of
    /// the number of variables.
    Iterative,
}

/// Configuration for [`CspRunner`](super::CspRunner).
///
/// # Examples
///
/// ```
/// use u_timetable::csp::{CspConfig, SearchMode, ValueOrdering, VariableOrdering};
///
/// let config = CspConfig::default()
///     .with_variable_ordering(VariableOrdering::Mrv)
///     .with_value_ordering(ValueOrdering::Shuffled)
///     .with_mode(SearchMode::Iterative)
///     .with_seed(7)
///     .with_max_nodes(10_000);
/// assert_eq!(config.seed, Some(7));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CspConfig {
    /// Variable selection policy.
    pub variable_ordering: VariableOrdering,
    /// Value ordering policy.
    pub value_ordering: ValueOrdering,
    /// Recursive or iterative engine.
    pub mode: SearchMode,
    /// Random seed for shuffled orderings (None uses a fixed default).
    pub seed: Option<u64>,
    /// Maximum number of search nodes (variable selections). None = unbounded.
    pub max_nodes: Option<usize>,
    /// Wall-clock limit in milliseconds. None = unbounded.
    pub time_limit_ms: Option<u64>,
    /// Fan the root variable's candidates out to rayon workers.
    ///
    /// Only honoured when the crate is built with the `parallel` feature.
    pub parallel: bool,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            variable_ordering: VariableOrdering::default(),
            value_ordering: ValueOrdering::default(),
            mode: SearchMode::default(),
            seed: None,
            max_nodes: None,
            time_limit_ms: None,
            parallel: false,
        }
    }
}

impl CspConfig {
    /// Sets the variable ordering heuristic.
    pub fn with_variable_ordering(mut self, ordering: VariableOrdering) -> Self {
        self.variable_ordering = ordering;
        self
    }

    /// Sets the value ordering heuristic.
    pub fn with_value_ordering(mut self, ordering: ValueOrdering) -> Self {
        self.value_ordering = ordering;
        self
    }

    /// Sets the search mode.
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the random seed for randomized orderings.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the maximum number of search nodes.
    pub fn with_max_nodes(mut self, n: usize) -> Self {
        self.max_nodes = Some(n);
        self
    }

    /// Sets the time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Enables parallel search of the root candidates (feature `parallel`).
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_nodes == Some(0) {
            return Err("max_nodes must be positive or None".into());
        }
        if self.time_limit_ms == Some(0) {
            return Err("time_limit_ms must be positive or None".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CspConfig::default();
        assert_eq!(config.variable_ordering, VariableOrdering::MrvDegree);
        assert_eq!(config.value_ordering, ValueOrdering::LeastConstraining);
        assert_eq!(config.mode, SearchMode::Recursive);
        assert!(config.seed.is_none());
        assert!(config.max_nodes.is_none());
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = CspConfig::default()
            .with_variable_ordering(VariableOrdering::InputOrder)
            .with_value_ordering(ValueOrdering::DomainOrder)
            .with_mode(SearchMode::Iterative)
            .with_time_limit_ms(500)
            .with_parallel(true);
        assert_eq!(config.variable_ordering, VariableOrdering::InputOrder);
        assert_eq!(config.value_ordering, ValueOrdering::DomainOrder);
        assert_eq!(config.mode, SearchMode::Iterative);
        assert_eq!(config.time_limit_ms, Some(500));
        assert!(config.parallel);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        assert!(CspConfig::default().with_max_nodes(0).validate().is_err());
        assert!(CspConfig::default().with_time_limit_ms(0).validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_config_uses_defaults() {
        use serde::de::value::{Error, MapDeserializer};

        let fields = vec![("parallel", true)].into_iter();
        let config = CspConfig::deserialize(MapDeserializer::<_, Error>::new(fields)).unwrap();
        assert!(config.parallel);
        assert_eq!(config.variable_ordering, VariableOrdering::MrvDegree);
        assert_eq!(config.mode, SearchMode::Recursive);
        assert!(config.seed.is_none());
    }
}
