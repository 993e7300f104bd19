//! Variable and value ordering heuristics.
//!
//! # Variable ordering
//!
//! MRV (minimum remaining values) picks the unassigned variable with the
//! fewest values that are still consistent with the partial assignment,
//! so dead ends surface as early as possible ("fail first"). Ties go to the
//! variable whose domain overlaps the domains of the most other unassigned
//! variables (degree heuristic).
//!
//! # Value ordering
//!
//! LCV (least-constraining value) counts, for each candidate, how many
//! (variable, value) pairs of the other unassigned variables would remain
//! consistent, and tries the candidate that forecloses the fewest options
//! first. This is one-step lookahead only: domains are never pruned.
//!
//! # Reference
//!
//! Russell & Norvig (2020), "Artificial Intelligence: A Modern Approach",
//! 4th ed., §6.3.1

use std::cmp::Reverse;
use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use super::assignment::Assignment;
use super::config::{ValueOrdering, VariableOrdering};
use super::model::CspModel;
use super::types::{CspValue, CspVariable};

/// Runs every constraint against the most recent binding, in installed
/// order, stopping at the first violation.
pub(crate) fn accepts_latest<V: CspVariable, X: CspValue>(
    model: &CspModel<V, X>,
    assignment: &Assignment<V, X>,
    checks: &mut u64,
) -> bool {
    for constraint in model.constraints() {
        *checks += 1;
        if !constraint.accepts_latest(assignment) {
            return false;
        }
    }
    true
}

/// Number of values of variable `idx` consistent with the assignment.
///
/// Stops counting once `cap` is reached.
fn legal_value_count<V: CspVariable, X: CspValue>(
    model: &CspModel<V, X>,
    assignment: &mut Assignment<V, X>,
    idx: usize,
    cap: usize,
    checks: &mut u64,
) -> usize {
    let var = &model.variables()[idx];
    let mut count = 0;
    for value in model.domain_at(idx) {
        assignment.bind(var.clone(), value.clone());
        if accepts_latest(model, assignment, checks) {
            count += 1;
        }
        assignment.unbind_last();
        if count >= cap {
            break;
        }
    }
    count
}

/// Builds the static domain-overlap graph used by the degree heuristic.
///
/// `graph[i]` lists, in ascending order, every other variable sharing at
/// least one value with variable `i`.
pub(crate) fn overlap_graph<V: CspVariable, X: CspValue>(model: &CspModel<V, X>) -> Vec<Vec<usize>> {
    let n = model.variable_count();
    let mut holders: HashMap<&X, Vec<usize>> = HashMap::new();
    for i in 0..n {
        for value in model.domain_at(i) {
            let list = holders.entry(value).or_default();
            if list.last() != Some(&i) {
                list.push(i);
            }
        }
    }

    let mut graph = vec![Vec::new(); n];
    let mut seen = vec![usize::MAX; n];
    for (i, neighbours) in graph.iter_mut().enumerate() {
        for value in model.domain_at(i) {
            for &j in &holders[value] {
                if j != i && seen[j] != i {
                    seen[j] = i;
                    neighbours.push(j);
                }
            }
        }
        neighbours.sort_unstable();
    }
    graph
}

/// Picks the next variable to bind, or `None` when every variable is bound.
pub(crate) fn select_variable<V: CspVariable, X: CspValue, R: Rng>(
    model: &CspModel<V, X>,
    assignment: &mut Assignment<V, X>,
    ordering: VariableOrdering,
    graph: &[Vec<usize>],
    rng: &mut R,
    checks: &mut u64,
) -> Option<usize> {
    let unassigned: Vec<usize> = (0..model.variable_count())
        .filter(|&i| !assignment.contains(&model.variables()[i]))
        .collect();

    if ordering == VariableOrdering::InputOrder {
        return unassigned.first().copied();
    }

    // Key: (remaining values, Reverse(degree)); smaller is better.
    let mut best_key = (usize::MAX, Reverse(0usize));
    let mut tied: Vec<usize> = Vec::new();
    for &i in &unassigned {
        // Counting past best + 1 cannot change the outcome.
        let cap = best_key.0.saturating_add(1);
        let remaining = legal_value_count(model, assignment, i, cap, checks);
        if remaining > best_key.0 {
            continue;
        }
        let degree = match ordering {
            VariableOrdering::Mrv => 0,
            _ => graph[i]
                .iter()
                .filter(|&&j| !assignment.contains(&model.variables()[j]))
                .count(),
        };
        let key = (remaining, Reverse(degree));
        if key < best_key {
            best_key = key;
            tied.clear();
            tied.push(i);
        } else if key == best_key {
            tied.push(i);
        }
    }

    match ordering {
        VariableOrdering::MrvRandomTies if tied.len() > 1 => {
            Some(tied[rng.random_range(0..tied.len())])
        }
        _ => tied.first().copied(),
    }
}

/// Orders the candidate values of variable `idx`.
pub(crate) fn order_values<V: CspVariable, X: CspValue, R: Rng>(
    model: &CspModel<V, X>,
    assignment: &mut Assignment<V, X>,
    idx: usize,
    ordering: ValueOrdering,
    rng: &mut R,
    checks: &mut u64,
) -> Vec<X> {
    let mut values = model.domain_at(idx).to_vec();
    match ordering {
        ValueOrdering::DomainOrder => {}
        ValueOrdering::Shuffled => values.shuffle(rng),
        ValueOrdering::LeastConstraining => {
            let mut scored: Vec<(X, Option<usize>)> = values
                .into_iter()
                .map(|value| {
                    let score = remaining_support(model, assignment, idx, &value, checks);
                    (value, score)
                })
                .collect();
            // Stable: equal scores keep domain order. Inconsistent
            // candidates (None) go last.
            scored.sort_by_key(|(_, score)| Reverse(*score));
            values = scored.into_iter().map(|(value, _)| value).collect();
        }
    }
    values
}

/// How many (variable, value) pairs of the other unassigned variables stay
/// consistent if variable `idx` takes `value`.
///
/// Returns `None` when `value` itself violates a constraint.
fn remaining_support<V: CspVariable, X: CspValue>(
    model: &CspModel<V, X>,
    assignment: &mut Assignment<V, X>,
    idx: usize,
    value: &X,
    checks: &mut u64,
) -> Option<usize> {
    let variables = model.variables();
    assignment.bind(variables[idx].clone(), value.clone());
    if !accepts_latest(model, assignment, checks) {
        assignment.unbind_last();
        return None;
    }

    let mut support = 0;
    for (j, other) in variables.iter().enumerate() {
        if j == idx || assignment.contains(other) {
            continue;
        }
        for candidate in model.domain_at(j) {
            assignment.bind(other.clone(), candidate.clone());
            if accepts_latest(model, assignment, checks) {
                support += 1;
            }
            assignment.unbind_last();
        }
    }

    assignment.unbind_last();
    Some(support)
}
