//! Partial assignments with an undo trail.

use std::collections::HashMap;
use std::hash::Hash;

/// A partial mapping from variables to values.
///
/// Bindings are kept in the order they were made. The search engine only
/// ever removes the most recent binding, so [`Assignment::unbind_last`] is
/// the exact inverse of [`Assignment::bind`] and the trail doubles as the
/// undo log for chronological backtracking.
///
/// # Examples
///
/// ```
/// use u_timetable::csp::Assignment;
///
/// let mut a: Assignment<&str, u8> = Assignment::new();
/// assert!(a.bind("x", 1));
/// assert!(a.bind("y", 2));
/// assert!(!a.bind("x", 3)); // already bound
/// assert_eq!(a.get(&"y"), Some(&2));
/// assert_eq!(a.unbind_last(), Some(("y", 2)));
/// assert_eq!(a.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Assignment<V, X> {
    trail: Vec<(V, X)>,
    index: HashMap<V, usize>,
}

impl<V, X> Default for Assignment<V, X> {
    fn default() -> Self {
        Self {
            trail: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V: Clone + Eq + Hash, X> Assignment<V, X> {
    /// Creates an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty assignment with room for `n` bindings.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            trail: Vec::with_capacity(n),
            index: HashMap::with_capacity(n),
        }
    }

    /// Binds `var` to `value`.
    ///
    /// Returns `false` (and leaves the assignment untouched) if `var` is
    /// already bound.
    pub fn bind(&mut self, var: V, value: X) -> bool {
        if self.index.contains_key(&var) {
            return false;
        }
        self.index.insert(var.clone(), self.trail.len());
        self.trail.push((var, value));
        true
    }

    /// Removes the most recent binding and returns it.
    pub fn unbind_last(&mut self) -> Option<(V, X)> {
        let (var, value) = self.trail.pop()?;
        self.index.remove(&var);
        Some((var, value))
    }

    /// Removes every binding, most recent first.
    pub fn clear(&mut self) {
        while self.unbind_last().is_some() {}
    }

    /// Value bound to `var`, if any.
    pub fn get(&self, var: &V) -> Option<&X> {
        self.index.get(var).map(|&i| &self.trail[i].1)
    }

    /// Whether `var` is bound.
    pub fn contains(&self, var: &V) -> bool {
        self.index.contains_key(var)
    }

    /// The most recent binding.
    pub fn last(&self) -> Option<(&V, &X)> {
        self.trail.last().map(|(v, x)| (v, x))
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.trail.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    /// Iterates over bindings in the order they were made.
    pub fn iter(&self) -> impl Iterator<Item = (&V, &X)> {
        self.trail.iter().map(|(v, x)| (v, x))
    }

    /// Iterates over all bindings except the most recent one.
    ///
    /// Incremental constraint checks compare the latest binding against
    /// these.
    pub fn iter_before_last(&self) -> impl Iterator<Item = (&V, &X)> {
        let n = self.trail.len().saturating_sub(1);
        self.trail[..n].iter().map(|(v, x)| (v, x))
    }
}
