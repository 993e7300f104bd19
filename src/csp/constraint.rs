//! Constraint predicates over partial assignments.

use std::fmt;

use super::assignment::Assignment;

/// A global constraint evaluated against a (possibly partial) assignment.
///
/// Constraints are total: every syntactically valid partial assignment
/// either satisfies the constraint or violates it. A constraint must never
/// report a violation that could be repaired by binding more variables,
/// otherwise the search prunes branches that contain solutions.
pub trait Constraint<V, X>: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Evaluates the constraint against the whole assignment.
    fn is_satisfied(&self, assignment: &Assignment<V, X>) -> bool;

    /// Evaluates the constraint after a single new binding.
    ///
    /// Called by the engine right after binding `assignment.last()`, when
    /// every earlier binding is already known to satisfy the constraint.
    /// Implementations may therefore only look at the interactions of the
    /// latest binding. Defaults to [`Constraint::is_satisfied`].
    fn accepts_latest(&self, assignment: &Assignment<V, X>) -> bool {
        self.is_satisfied(assignment)
    }
}

/// A constraint built from a closure.
///
/// # Examples
///
/// ```
/// use u_timetable::csp::{Assignment, Constraint, FnConstraint};
///
/// let all_different = FnConstraint::new("all-different", |a: &Assignment<u8, u8>| {
///     let mut seen = std::collections::HashSet::new();
///     a.iter().all(|(_, x)| seen.insert(*x))
/// });
///
/// let mut a = Assignment::new();
/// a.bind(0, 1);
/// a.bind(1, 1);
/// assert!(!all_different.is_satisfied(&a));
/// ```
pub struct FnConstraint<F> {
    name: String,
    predicate: F,
}

impl<F> FnConstraint<F> {
    /// Wraps `predicate` under the given name.
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> fmt::Debug for FnConstraint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConstraint")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<V, X, F> Constraint<V, X> for FnConstraint<F>
where
    F: Fn(&Assignment<V, X>) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn is_satisfied(&self, assignment: &Assignment<V, X>) -> bool {
        (self.predicate)(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_equal() -> FnConstraint<impl Fn(&Assignment<char, i32>) -> bool + Send + Sync> {
        FnConstraint::new("a != b", |a: &Assignment<char, i32>| {
            match (a.get(&'a'), a.get(&'b')) {
                (Some(x), Some(y)) => x != y,
                _ => true,
            }
        })
    }

    #[test]
    fn test_fn_constraint_partial_assignment() {
        let c = not_equal();
        let mut a: Assignment<char, i32> = Assignment::new();
        assert!(c.is_satisfied(&a));

        a.bind('a', 1);
        assert!(c.is_satisfied(&a));

        a.bind('b', 1);
        assert!(!c.is_satisfied(&a));
        assert!(!c.accepts_latest(&a));

        a.unbind_last();
        a.bind('b', 2);
        assert!(c.is_satisfied(&a));
    }

    #[test]
    fn test_fn_constraint_name_and_debug() {
        let c = not_equal();
        assert_eq!(Constraint::<char, i32>::name(&c), "a != b");
        assert!(format!("{c:?}").contains("a != b"));
    }
}
