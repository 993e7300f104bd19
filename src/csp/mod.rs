//! Constraint Satisfaction Problem (CSP) solving by backtracking search.
//!
//! A CSP assigns each variable a value from its finite domain so that every
//! constraint holds. This module provides a generic depth-first solver with
//! chronological backtracking and search-order heuristics; it knows nothing
//! about the problem it solves.
//!
//! # Key Components
//!
//! - **Model**: [`CspModel`] holds variables, domains and constraints
//! - **Constraints**: [`Constraint`] trait, [`FnConstraint`] for closures
//! - **Assignment**: [`Assignment`], a partial mapping with an undo trail
//! - **Heuristics**: [`VariableOrdering`] (MRV, degree), [`ValueOrdering`]
//!   (least-constraining value, seeded shuffle)
//! - **Engine**: [`CspRunner`] / [`Backtracker`], recursive or iterative
//!   search with optional parallel fan-out (feature `parallel`)
//!
//! # Design
//!
//! No constraint propagation (AC-3) and no learning across branches: the
//! value-ordering lookahead only reorders candidates. Worst-case effort is
//! exponential in the number of variables; the heuristics mitigate this.
//!
//! # References
//!
//! - Russell & Norvig (2020), "Artificial Intelligence: A Modern Approach", Ch. 6
//! - Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"

mod assignment;
mod clock;
mod config;
mod constraint;
mod error;
mod model;
mod ordering;
mod runner;
mod types;

pub use assignment::Assignment;
pub use config::{CspConfig, SearchMode, ValueOrdering, VariableOrdering};
pub use constraint::{Constraint, FnConstraint};
pub use error::CspError;
pub use model::CspModel;
pub use runner::{Backtracker, CspRunner};
pub use types::{CspResult, CspValue, CspVariable, SearchStats, SearchStatus};
