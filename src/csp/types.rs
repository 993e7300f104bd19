//! Search outcome types and the bounds shared by variables and values.

use std::fmt::Debug;
use std::hash::Hash;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::assignment::Assignment;

/// Bounds required of a CSP variable.
///
/// Blanket-implemented; any cloneable, hashable, thread-safe type works.
pub trait CspVariable: Clone + Eq + Hash + Debug + Send + Sync {}

impl<T: Clone + Eq + Hash + Debug + Send + Sync> CspVariable for T {}

/// Bounds required of a CSP value.
///
/// Values must be hashable so the degree heuristic can detect domain
/// overlap between variables.
pub trait CspValue: Clone + Eq + Hash + Debug + Send + Sync {}

impl<T: Clone + Eq + Hash + Debug + Send + Sync> CspValue for T {}

/// Terminal state of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SearchStatus {
    /// Every variable is bound and every constraint holds.
    Solved,
    /// The root variable's candidates were exhausted.
    NoSolution,
    /// A node limit, time limit, or cancel flag stopped the search.
    Cancelled,
}

/// Counters collected during a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchStats {
    /// Variable selections (search tree nodes expanded).
    pub nodes: u64,
    /// Bindings that passed the constraint checks and were later undone
    /// because their subtree failed.
    pub backtracks: u64,
    /// Candidate bindings rejected by a constraint.
    pub rejections: u64,
    /// Individual constraint evaluations, including heuristic lookahead.
    pub constraint_checks: u64,
    /// Wall-clock time of the search in milliseconds.
    pub elapsed_ms: u64,
}

impl SearchStats {
    /// Adds another run's counters to these. `elapsed_ms` is left alone.
    pub fn absorb(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.backtracks += other.backtracks;
        self.rejections += other.rejections;
        self.constraint_checks += other.constraint_checks;
    }
}

/// Result of a CSP search.
#[derive(Debug, Clone)]
pub struct CspResult<V, X> {
    /// How the search ended.
    pub status: SearchStatus,
    /// The complete assignment; `Some` only when `status` is `Solved`.
    pub assignment: Option<Assignment<V, X>>,
    /// Search counters.
    pub stats: SearchStats,
}

impl<V, X> CspResult<V, X> {
    /// Whether a solution was found.
    pub fn is_solved(&self) -> bool {
        self.status == SearchStatus::Solved
    }
}
