//! Backtracking constraint satisfaction and timetable construction.
//!
//! - **CSP**: a generic, domain-agnostic backtracking solver with
//!   minimum-remaining-values / degree variable ordering and
//!   least-constraining-value ordering, in recursive, iterative and
//!   (feature `parallel`) root-parallel modes.
//! - **Timetable**: university timetabling expressed as a CSP: groups,
//!   subjects, teachers and a weekly grid turned into variables, domains
//!   and scheduling constraints, with a readable timetable as the result.
//!
//! # Architecture
//!
//! The `csp` module knows nothing about schedules; `timetable` is one
//! consumer of it. Any other problem with finite domains and predicate
//! constraints plugs into `csp` the same way.

pub mod csp;
pub mod timetable;

#[cfg(feature = "wasm")]
mod wasm;
