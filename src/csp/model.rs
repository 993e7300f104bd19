//! CSP model definition.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use super::assignment::Assignment;
use super::constraint::Constraint;
use super::error::CspError;

/// A constraint satisfaction problem: ordered variables, their finite
/// ordered domains, and an ordered list of constraints.
///
/// The model is built once and read-only during search. Domains never
/// change; heuristics only reorder the candidates they hand to the engine.
///
/// # Examples
///
/// ```
/// use u_timetable::csp::{Assignment, CspModel, FnConstraint};
///
/// let mut model: CspModel<char, u8> = CspModel::new("coloring");
/// model.add_variable('a', vec![0, 1]);
/// model.add_variable('b', vec![0, 1]);
/// model.add_constraint(FnConstraint::new("a != b", |x: &Assignment<char, u8>| {
///     match (x.get(&'a'), x.get(&'b')) {
///         (Some(p), Some(q)) => p != q,
///         _ => true,
///     }
/// }));
/// assert!(model.validate().is_ok());
/// assert_eq!(model.variable_count(), 2);
/// ```
pub struct CspModel<V, X> {
    /// Model name.
    pub name: String,
    variables: Vec<V>,
    domains: Vec<Vec<X>>,
    index: HashMap<V, usize>,
    constraints: Vec<Box<dyn Constraint<V, X>>>,
    duplicates: Vec<V>,
}

impl<V, X> CspModel<V, X>
where
    V: Clone + Eq + Hash + fmt::Debug,
    X: Clone + PartialEq,
{
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            domains: Vec::new(),
            index: HashMap::new(),
            constraints: Vec::new(),
            duplicates: Vec::new(),
        }
    }

    /// Declares a variable with its ordered domain.
    ///
    /// Redeclaring a variable is recorded and reported by
    /// [`CspModel::validate`]; the first declaration is kept.
    pub fn add_variable(&mut self, var: V, domain: Vec<X>) {
        if self.index.contains_key(&var) {
            self.duplicates.push(var);
            return;
        }
        self.index.insert(var.clone(), self.variables.len());
        self.variables.push(var);
        self.domains.push(domain);
    }

    /// Appends a constraint. Constraints are checked in insertion order.
    pub fn add_constraint<C>(&mut self, constraint: C)
    where
        C: Constraint<V, X> + 'static,
    {
        self.constraints.push(Box::new(constraint));
    }

    /// Appends an already boxed constraint.
    pub fn add_boxed_constraint(&mut self, constraint: Box<dyn Constraint<V, X>>) {
        self.constraints.push(constraint);
    }

    /// Checks the model before search.
    ///
    /// Reports the first duplicate declaration, then the first variable
    /// (in declaration order) whose domain is empty.
    pub fn validate(&self) -> Result<(), CspError<V>> {
        if let Some(var) = self.duplicates.first() {
            return Err(CspError::DuplicateVariable(var.clone()));
        }
        for (var, domain) in self.variables.iter().zip(&self.domains) {
            if domain.is_empty() {
                return Err(CspError::EmptyDomain(var.clone()));
            }
        }
        Ok(())
    }

    /// Variables in declaration order.
    pub fn variables(&self) -> &[V] {
        &self.variables
    }

    /// Domain of `var`, if declared.
    pub fn domain(&self, var: &V) -> Option<&[X]> {
        self.index.get(var).map(|&i| self.domains[i].as_slice())
    }

    /// Position of `var` in declaration order.
    pub fn variable_index(&self, var: &V) -> Option<usize> {
        self.index.get(var).copied()
    }

    pub(crate) fn domain_at(&self, i: usize) -> &[X] {
        &self.domains[i]
    }

    /// Installed constraints, in check order.
    pub fn constraints(&self) -> &[Box<dyn Constraint<V, X>>] {
        &self.constraints
    }

    /// Number of declared variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Number of installed constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Checks that `assignment` is a complete solution of this model.
    ///
    /// Every variable must be bound exactly once, to a member of its
    /// declared domain, and every constraint must hold on the full
    /// assignment.
    pub fn verify(&self, assignment: &Assignment<V, X>) -> Result<(), String> {
        if assignment.len() != self.variables.len() {
            return Err(format!(
                "assignment binds {} of {} variables",
                assignment.len(),
                self.variables.len()
            ));
        }
        for (var, domain) in self.variables.iter().zip(&self.domains) {
            match assignment.get(var) {
                None => return Err(format!("variable {var:?} is unbound")),
                Some(value) if !domain.contains(value) => {
                    return Err(format!("value of {var:?} is outside its domain"));
                }
                Some(_) => {}
            }
        }
        for constraint in &self.constraints {
            if !constraint.is_satisfied(assignment) {
                return Err(format!("constraint '{}' is violated", constraint.name()));
            }
        }
        Ok(())
    }
}

impl<V: fmt::Debug, X> fmt::Debug for CspModel<V, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.constraints.iter().map(|c| c.name()).collect();
        f.debug_struct("CspModel")
            .field("name", &self.name)
            .field("variables", &self.variables.len())
            .field("constraints", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csp::FnConstraint;

    fn two_var_model() -> CspModel<u32, u32> {
        let mut model = CspModel::new("test");
        model.add_variable(0, vec![1, 2]);
        model.add_variable(1, vec![1, 2]);
        model.add_constraint(FnConstraint::new("distinct", |a: &Assignment<u32, u32>| {
            match (a.get(&0), a.get(&1)) {
                (Some(x), Some(y)) => x != y,
                _ => true,
            }
        }));
        model
    }

    #[test]
    fn test_model_creation() {
        let model = two_var_model();
        assert_eq!(model.variable_count(), 2);
        assert_eq!(model.constraint_count(), 1);
        assert_eq!(model.domain(&1), Some(&[1, 2][..]));
        assert_eq!(model.domain(&9), None);
        assert_eq!(model.variable_index(&1), Some(1));
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_empty_domain_detected() {
        let mut model: CspModel<&str, u8> = CspModel::new("test");
        model.add_variable("ok", vec![1]);
        model.add_variable("empty", vec![]);
        model.add_variable("also-empty", vec![]);
        assert_eq!(model.validate(), Err(CspError::EmptyDomain("empty")));
    }

    #[test]
    fn test_duplicate_variable_detected() {
        let mut model: CspModel<&str, u8> = CspModel::new("test");
        model.add_variable("x", vec![1]);
        model.add_variable("x", vec![2]);
        assert_eq!(model.variable_count(), 1);
        assert_eq!(model.domain(&"x"), Some(&[1][..]));
        assert_eq!(model.validate(), Err(CspError::DuplicateVariable("x")));
    }

    #[test]
    fn test_verify() {
        let model = two_var_model();
        let mut a = Assignment::new();
        a.bind(0, 1);
        assert!(model.verify(&a).unwrap_err().contains("1 of 2"));

        a.bind(1, 1);
        assert!(model.verify(&a).unwrap_err().contains("distinct"));

        a.unbind_last();
        a.bind(1, 7);
        assert!(model.verify(&a).unwrap_err().contains("outside its domain"));

        a.unbind_last();
        a.bind(1, 2);
        assert!(model.verify(&a).is_ok());
    }

    #[test]
    fn test_debug_lists_constraint_names() {
        let model = two_var_model();
        let s = format!("{model:?}");
        assert!(s.contains("distinct"));
    }
}
