//! Backtracking search engine.
//!
//! # Algorithm
//!
//! 1. Select an unassigned variable (see [`VariableOrdering`])
//! 2. Order its candidate values (see [`ValueOrdering`])
//! 3. For each candidate:
//!    a. Bind it and run every constraint against the new binding
//!    b. On violation, undo and try the next candidate
//!    c. Otherwise recurse; on success propagate it, on failure undo
//! 4. When no candidate works, report failure to the caller, which undoes
//!    its own latest binding (chronological backtracking)
//!
//! The assignment trail is the undo log: every failed branch leaves the
//! assignment exactly as it found it, so a search that ends without a
//! solution always ends with an empty assignment.
//!
//! # Reference
//!
//! Russell & Norvig (2020), "Artificial Intelligence: A Modern Approach",
//! 4th ed., §6.3 (BACKTRACKING-SEARCH)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::assignment::Assignment;
use super::clock;
use super::config::{CspConfig, SearchMode, ValueOrdering, VariableOrdering};
use super::error::CspError;
use super::model::CspModel;
use super::ordering;
use super::types::{CspResult, CspValue, CspVariable, SearchStats, SearchStatus};

const DEFAULT_SEED: u64 = 42;

/// Search frame of the iterative engine: a variable and the cursor into its
/// ordered candidates.
struct Frame<X> {
    var_idx: usize,
    values: Vec<X>,
    next: usize,
}

/// Stop conditions consulted at every variable-selection point.
#[derive(Clone)]
struct Limits {
    max_nodes: Option<u64>,
    /// Absolute deadline on the search clock, in milliseconds.
    deadline: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
    /// Parallel branches only: (best successful rank so far, own rank).
    #[cfg(feature = "parallel")]
    outranked: Option<(Arc<std::sync::atomic::AtomicUsize>, usize)>,
}

impl Limits {
    fn reached(&self, nodes: u64) -> bool {
        if self.max_nodes.is_some_and(|max| nodes >= max) {
            return true;
        }
        if self.deadline.is_some_and(|d| clock::now_ms() >= d) {
            return true;
        }
        #[cfg(feature = "parallel")]
        if let Some((winner, rank)) = &self.outranked {
            if winner.load(Ordering::Relaxed) < *rank {
                return true;
            }
        }
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// A single backtracking search over a [`CspModel`].
///
/// Owns the partial assignment and mutates it in place. Most callers use
/// [`CspRunner`], which validates the model first; `Backtracker` is public
/// so the assignment can be inspected after a search.
///
/// # Examples
///
/// ```
/// use u_timetable::csp::{Backtracker, CspConfig, CspModel, SearchStatus};
///
/// let mut model: CspModel<u8, u8> = CspModel::new("tiny");
/// model.add_variable(0, vec![3]);
///
/// let config = CspConfig::default();
/// let mut search = Backtracker::new(&model, &config);
/// assert_eq!(search.solve(), SearchStatus::Solved);
/// assert_eq!(search.assignment().get(&0), Some(&3));
/// ```
pub struct Backtracker<'m, V, X> {
    model: &'m CspModel<V, X>,
    variable_ordering: VariableOrdering,
    value_ordering: ValueOrdering,
    mode: SearchMode,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    seed: u64,
    graph: Arc<Vec<Vec<usize>>>,
    assignment: Assignment<V, X>,
    rng: StdRng,
    limits: Limits,
    stats: SearchStats,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel: bool,
}

impl<'m, V: CspVariable, X: CspValue> Backtracker<'m, V, X> {
    /// Prepares a search; the clock for `time_limit_ms` starts here.
    pub fn new(model: &'m CspModel<V, X>, config: &CspConfig) -> Self {
        Self::with_cancel(model, config, None)
    }

    /// Prepares a search that also stops when `cancel` is set.
    pub fn with_cancel(
        model: &'m CspModel<V, X>,
        config: &CspConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Self {
        let seed = config.seed.unwrap_or(DEFAULT_SEED);
        Self {
            model,
            variable_ordering: config.variable_ordering,
            value_ordering: config.value_ordering,
            mode: config.mode,
            seed,
            graph: Arc::new(ordering::overlap_graph(model)),
            assignment: Assignment::with_capacity(model.variable_count()),
            rng: StdRng::seed_from_u64(seed),
            limits: Limits {
                max_nodes: config.max_nodes.map(|n| n as u64),
                deadline: config
                    .time_limit_ms
                    .map(|ms| clock::now_ms().saturating_add(ms)),
                cancel,
                #[cfg(feature = "parallel")]
                outranked: None,
            },
            stats: SearchStats::default(),
            parallel: config.parallel,
        }
    }

    /// Runs the search to completion, failure, or cancellation.
    ///
    /// On `Solved` the assignment is complete; otherwise it is empty.
    pub fn solve(&mut self) -> SearchStatus {
        let started = clock::now_ms();
        debug!(
            "csp '{}': searching {} variables under {} constraints ({:?}, {:?}, {:?})",
            self.model.name,
            self.model.variable_count(),
            self.model.constraint_count(),
            self.variable_ordering,
            self.value_ordering,
            self.mode,
        );

        let status = self.dispatch();

        self.stats.elapsed_ms = clock::now_ms().saturating_sub(started);
        debug!(
            "csp '{}': {:?} after {} nodes, {} backtracks, {} rejections",
            self.model.name, status, self.stats.nodes, self.stats.backtracks, self.stats.rejections,
        );
        status
    }

    #[cfg(feature = "parallel")]
    fn dispatch(&mut self) -> SearchStatus {
        if self.parallel {
            self.search_parallel()
        } else {
            self.search()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn dispatch(&mut self) -> SearchStatus {
        self.search()
    }

    fn search(&mut self) -> SearchStatus {
        match self.mode {
            SearchMode::Recursive => self.search_recursive(),
            SearchMode::Iterative => self.search_iterative(),
        }
    }

    /// The current (partial or complete) assignment.
    pub fn assignment(&self) -> &Assignment<V, X> {
        &self.assignment
    }

    /// Counters collected so far.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Consumes the search, returning its assignment.
    pub fn into_assignment(self) -> Assignment<V, X> {
        self.assignment
    }

    fn select_variable(&mut self) -> Option<usize> {
        ordering::select_variable(
            self.model,
            &mut self.assignment,
            self.variable_ordering,
            &self.graph,
            &mut self.rng,
            &mut self.stats.constraint_checks,
        )
    }

    fn order_values(&mut self, var_idx: usize) -> Vec<X> {
        ordering::order_values(
            self.model,
            &mut self.assignment,
            var_idx,
            self.value_ordering,
            &mut self.rng,
            &mut self.stats.constraint_checks,
        )
    }

    /// Binds `value` to variable `var_idx` if every constraint accepts it.
    fn try_bind(&mut self, var_idx: usize, value: X) -> bool {
        let var = &self.model.variables()[var_idx];
        self.assignment.bind(var.clone(), value);
        if ordering::accepts_latest(self.model, &self.assignment, &mut self.stats.constraint_checks) {
            return true;
        }
        if let Some((var, value)) = self.assignment.unbind_last() {
            trace!("rejected {var:?} = {value:?}");
        }
        self.stats.rejections += 1;
        false
    }

    fn search_recursive(&mut self) -> SearchStatus {
        let Some(var_idx) = self.select_variable() else {
            return SearchStatus::Solved;
        };
        if self.limits.reached(self.stats.nodes) {
            return SearchStatus::Cancelled;
        }
        self.stats.nodes += 1;

        for value in self.order_values(var_idx) {
            if !self.try_bind(var_idx, value) {
                continue;
            }
            match self.search_recursive() {
                SearchStatus::Solved => return SearchStatus::Solved,
                SearchStatus::Cancelled => {
                    self.assignment.unbind_last();
                    return SearchStatus::Cancelled;
                }
                SearchStatus::NoSolution => {
                    self.assignment.unbind_last();
                    self.stats.backtracks += 1;
                }
            }
        }
        SearchStatus::NoSolution
    }

    /// Same traversal as [`Self::search_recursive`], driven by an explicit
    /// stack. Every frame below the top has its current candidate bound.
    fn search_iterative(&mut self) -> SearchStatus {
        let mut stack: Vec<Frame<X>> = Vec::new();
        loop {
            let Some(var_idx) = self.select_variable() else {
                return SearchStatus::Solved;
            };
            if self.limits.reached(self.stats.nodes) {
                self.assignment.clear();
                return SearchStatus::Cancelled;
            }
            self.stats.nodes += 1;
            let values = self.order_values(var_idx);
            stack.push(Frame {
                var_idx,
                values,
                next: 0,
            });

            // Advance to the next consistent candidate, popping exhausted frames.
            loop {
                let Some(frame) = stack.last_mut() else {
                    return SearchStatus::NoSolution;
                };
                if frame.next < frame.values.len() {
                    let value = frame.values[frame.next].clone();
                    frame.next += 1;
                    let idx = frame.var_idx;
                    if self.try_bind(idx, value) {
                        break;
                    }
                } else {
                    stack.pop();
                    if stack.is_empty() {
                        return SearchStatus::NoSolution;
                    }
                    self.assignment.unbind_last();
                    self.stats.backtracks += 1;
                }
            }
        }
    }

    /// Fans the root variable's candidates out to rayon workers.
    ///
    /// Each branch searches its own copy of the assignment. Branches are
    /// ranked by candidate order and the lowest-ranked success wins, so the
    /// result matches the sequential search whenever the orderings are
    /// deterministic. A branch stops early once a lower-ranked branch has
    /// succeeded. `max_nodes` applies to each branch separately.
    #[cfg(feature = "parallel")]
    fn search_parallel(&mut self) -> SearchStatus {
        use rayon::prelude::*;
        use std::sync::atomic::AtomicUsize;

        let Some(var_idx) = self.select_variable() else {
            return SearchStatus::Solved;
        };
        if self.limits.reached(self.stats.nodes) {
            return SearchStatus::Cancelled;
        }
        self.stats.nodes += 1;
        let values = self.order_values(var_idx);

        let winner = Arc::new(AtomicUsize::new(usize::MAX));
        let this = &*self;
        let outcomes: Vec<(SearchStatus, bool, Assignment<V, X>, SearchStats)> = values
            .into_par_iter()
            .enumerate()
            .map(|(rank, value)| {
                let mut branch = this.fork(rank, &winner);
                if !branch.try_bind(var_idx, value) {
                    return (SearchStatus::NoSolution, false, branch.assignment, branch.stats);
                }
                let status = branch.search();
                if status == SearchStatus::Solved {
                    winner.fetch_min(rank, Ordering::SeqCst);
                }
                (status, true, branch.assignment, branch.stats)
            })
            .collect();

        let mut result = SearchStatus::NoSolution;
        for (status, bound, assignment, stats) in outcomes {
            self.stats.absorb(&stats);
            match status {
                SearchStatus::Solved if result != SearchStatus::Solved => {
                    self.assignment = assignment;
                    result = SearchStatus::Solved;
                }
                SearchStatus::NoSolution if bound => self.stats.backtracks += 1,
                SearchStatus::Cancelled if result == SearchStatus::NoSolution => {
                    result = SearchStatus::Cancelled;
                }
                _ => {}
            }
        }
        result
    }

    /// A fresh search state sharing this one's model, limits and overlap
    /// graph, with its own copy of the assignment and a rank-derived seed.
    #[cfg(feature = "parallel")]
    fn fork(&self, rank: usize, winner: &Arc<std::sync::atomic::AtomicUsize>) -> Self {
        let seed = self.seed.wrapping_add(rank as u64 + 1);
        let mut limits = self.limits.clone();
        limits.outranked = Some((Arc::clone(winner), rank));
        Self {
            model: self.model,
            variable_ordering: self.variable_ordering,
            value_ordering: self.value_ordering,
            mode: self.mode,
            seed,
            graph: Arc::clone(&self.graph),
            assignment: self.assignment.clone(),
            rng: StdRng::seed_from_u64(seed),
            limits,
            stats: SearchStats::default(),
            parallel: false,
        }
    }
}

/// Entry point for solving a [`CspModel`].
pub struct CspRunner;

impl CspRunner {
    /// Validates the configuration and the model, then searches.
    ///
    /// Empty domains and duplicate variables are reported as errors before
    /// any search step. An exhausted search is a normal result with
    /// [`SearchStatus::NoSolution`]; no partial assignment is ever returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_timetable::csp::{Assignment, CspConfig, CspModel, CspRunner, FnConstraint};
    ///
    /// // Colour a triangle with three colours.
    /// let mut model: CspModel<u8, char> = CspModel::new("triangle");
    /// for v in 0..3 {
    ///     model.add_variable(v, vec!['r', 'g', 'b']);
    /// }
    /// model.add_constraint(FnConstraint::new("proper", |a: &Assignment<u8, char>| {
    ///     let edges = [(0, 1), (1, 2), (0, 2)];
    ///     edges.iter().all(|(x, y)| match (a.get(x), a.get(y)) {
    ///         (Some(p), Some(q)) => p != q,
    ///         _ => true,
    ///     })
    /// }));
    ///
    /// let result = CspRunner::run(&model, &CspConfig::default()).unwrap();
    /// assert!(result.is_solved());
    /// assert!(model.verify(result.assignment.as_ref().unwrap()).is_ok());
    /// ```
    pub fn run<V: CspVariable, X: CspValue>(
        model: &CspModel<V, X>,
        config: &CspConfig,
    ) -> Result<CspResult<V, X>, CspError<V>> {
        Self::run_with_cancel(model, config, None)
    }

    /// Like [`CspRunner::run`], stopping with [`SearchStatus::Cancelled`]
    /// once `cancel` is set. The flag is polled at every search node.
    pub fn run_with_cancel<V: CspVariable, X: CspValue>(
        model: &CspModel<V, X>,
        config: &CspConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<CspResult<V, X>, CspError<V>> {
        config.validate().map_err(CspError::InvalidConfig)?;
        model.validate()?;

        let mut search = Backtracker::with_cancel(model, config, cancel);
        let status = search.solve();
        let stats = search.stats();
        let assignment = match status {
            SearchStatus::Solved => Some(search.into_assignment()),
            SearchStatus::NoSolution | SearchStatus::Cancelled => None,
        };

        Ok(CspResult {
            status,
            assignment,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csp::FnConstraint;

    // ---- N-queens: variable = column, value = row ----

    fn queens(n: u32) -> CspModel<u32, u32> {
        let mut model = CspModel::new(format!("{n}-queens"));
        for col in 0..n {
            model.add_variable(col, (0..n).collect());
        }
        model.add_constraint(FnConstraint::new("no-attack", |a: &Assignment<u32, u32>| {
            let placed: Vec<(i64, i64)> = a.iter().map(|(&c, &r)| (c as i64, r as i64)).collect();
            placed.iter().enumerate().all(|(i, &(c1, r1))| {
                placed[i + 1..]
                    .iter()
                    .all(|&(c2, r2)| r1 != r2 && (c1 - c2).abs() != (r1 - r2).abs())
            })
        }));
        model
    }

    fn pigeonhole(pigeons: u32, holes: u32) -> CspModel<u32, u32> {
        let mut model = CspModel::new("pigeonhole");
        for p in 0..pigeons {
            model.add_variable(p, (0..holes).collect());
        }
        model.add_constraint(FnConstraint::new("one-per-hole", |a: &Assignment<u32, u32>| {
            let mut seen = std::collections::HashSet::new();
            a.iter().all(|(_, h)| seen.insert(*h))
        }));
        model
    }

    fn all_configs() -> Vec<CspConfig> {
        let mut configs = Vec::new();
        for vo in [
            VariableOrdering::InputOrder,
            VariableOrdering::Mrv,
            VariableOrdering::MrvDegree,
            VariableOrdering::MrvRandomTies,
        ] {
            for xo in [
                ValueOrdering::DomainOrder,
                ValueOrdering::LeastConstraining,
                ValueOrdering::Shuffled,
            ] {
                for mode in [SearchMode::Recursive, SearchMode::Iterative] {
                    configs.push(
                        CspConfig::default()
                            .with_variable_ordering(vo)
                            .with_value_ordering(xo)
                            .with_mode(mode)
                            .with_seed(3),
                    );
                }
            }
        }
        configs
    }

    #[test]
    fn test_queens_solved_under_every_config() {
        let model = queens(6);
        for config in all_configs() {
            let result = CspRunner::run(&model, &config).unwrap();
            assert!(result.is_solved(), "{config:?}");
            let assignment = result.assignment.unwrap();
            assert_eq!(assignment.len(), 6);
            assert!(model.verify(&assignment).is_ok(), "{config:?}");
        }
    }

    #[test]
    fn test_unsatisfiable_leaves_empty_assignment() {
        let model = pigeonhole(4, 3);
        for config in all_configs() {
            let mut search = Backtracker::new(&model, &config);
            assert_eq!(search.solve(), SearchStatus::NoSolution, "{config:?}");
            assert!(search.assignment().is_empty(), "{config:?}");
            assert!(search.stats().nodes > 0);
        }
    }

    #[test]
    fn test_recursive_and_iterative_agree() {
        let model = queens(8);
        for vo in [VariableOrdering::InputOrder, VariableOrdering::MrvDegree] {
            let base = CspConfig::default()
                .with_variable_ordering(vo)
                .with_value_ordering(ValueOrdering::DomainOrder);
            let rec = CspRunner::run(&model, &base.clone().with_mode(SearchMode::Recursive)).unwrap();
            let it = CspRunner::run(&model, &base.with_mode(SearchMode::Iterative)).unwrap();

            let rec_a: Vec<_> = rec.assignment.unwrap().iter().map(|(v, x)| (*v, *x)).collect();
            let it_a: Vec<_> = it.assignment.unwrap().iter().map(|(v, x)| (*v, *x)).collect();
            assert_eq!(rec_a, it_a);
            assert_eq!(rec.stats.nodes, it.stats.nodes);
            assert_eq!(rec.stats.backtracks, it.stats.backtracks);
            assert_eq!(rec.stats.rejections, it.stats.rejections);
        }
    }

    #[test]
    fn test_input_order_queens_first_solution() {
        // Plain chronological backtracking in row order finds the
        // lexicographically first placement.
        let config = CspConfig::default()
            .with_variable_ordering(VariableOrdering::InputOrder)
            .with_value_ordering(ValueOrdering::DomainOrder);
        let result = CspRunner::run(&queens(4), &config).unwrap();
        let a = result.assignment.unwrap();
        let rows: Vec<u32> = (0..4).map(|c| a.get(&c).copied().unwrap()).collect();
        assert_eq!(rows, vec![1, 3, 0, 2]);
        assert!(result.stats.backtracks > 0);
    }

    #[test]
    fn test_trivial_single_value() {
        let mut model: CspModel<&str, u8> = CspModel::new("single");
        model.add_variable("only", vec![9]);
        let result = CspRunner::run(&model, &CspConfig::default()).unwrap();
        assert!(result.is_solved());
        assert_eq!(result.assignment.unwrap().get(&"only"), Some(&9));
        assert_eq!(result.stats.backtracks, 0);
        assert_eq!(result.stats.rejections, 0);
        assert_eq!(result.stats.nodes, 1);
    }

    #[test]
    fn test_empty_model_is_solved() {
        let model: CspModel<u8, u8> = CspModel::new("empty");
        let result = CspRunner::run(&model, &CspConfig::default()).unwrap();
        assert!(result.is_solved());
        assert!(result.assignment.unwrap().is_empty());
        assert_eq!(result.stats.nodes, 0);
    }

    #[test]
    fn test_empty_domain_reported_before_search() {
        let mut model: CspModel<&str, u8> = CspModel::new("empty-domain");
        model.add_variable("a", vec![1]);
        model.add_variable("b", vec![]);
        let err = CspRunner::run(&model, &CspConfig::default()).unwrap_err();
        assert_eq!(err, CspError::EmptyDomain("b"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let model = queens(4);
        let err = CspRunner::run(&model, &CspConfig::default().with_max_nodes(0)).unwrap_err();
        assert!(matches!(err, CspError::InvalidConfig(_)));
    }

    #[test]
    fn test_node_limit_cancels_cleanly() {
        let model = pigeonhole(7, 6);
        for mode in [SearchMode::Recursive, SearchMode::Iterative] {
            let config = CspConfig::default()
                .with_variable_ordering(VariableOrdering::InputOrder)
                .with_value_ordering(ValueOrdering::DomainOrder)
                .with_mode(mode)
                .with_max_nodes(25);
            let mut search = Backtracker::new(&model, &config);
            assert_eq!(search.solve(), SearchStatus::Cancelled);
            assert!(search.assignment().is_empty());
            assert_eq!(search.stats().nodes, 25);
        }
    }

    #[test]
    fn test_time_limit_cancels_cleanly() {
        // Exhausting 14 pigeons in 13 holes takes billions of nodes
        let model = pigeonhole(14, 13);
        for mode in [SearchMode::Recursive, SearchMode::Iterative] {
            let config = CspConfig::default()
                .with_variable_ordering(VariableOrdering::InputOrder)
                .with_value_ordering(ValueOrdering::DomainOrder)
                .with_mode(mode)
                .with_time_limit_ms(1);
            let mut search = Backtracker::new(&model, &config);
            assert_eq!(search.solve(), SearchStatus::Cancelled);
            assert!(search.assignment().is_empty());

            let result = CspRunner::run(&model, &config).unwrap();
            assert_eq!(result.status, SearchStatus::Cancelled);
            assert!(result.assignment.is_none());
        }
    }

    #[test]
    fn test_cancel_flag_stops_search() {
        let model = pigeonhole(9, 8);
        let flag = Arc::new(AtomicBool::new(true));
        let result = CspRunner::run_with_cancel(&model, &CspConfig::default(), Some(flag)).unwrap();
        assert_eq!(result.status, SearchStatus::Cancelled);
        assert!(result.assignment.is_none());
        assert_eq!(result.stats.nodes, 0);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let model = queens(8);
        let config = CspConfig::default()
            .with_variable_ordering(VariableOrdering::MrvRandomTies)
            .with_value_ordering(ValueOrdering::Shuffled)
            .with_seed(11);
        let r1 = CspRunner::run(&model, &config).unwrap();
        let r2 = CspRunner::run(&model, &config).unwrap();
        let a1: Vec<_> = r1.assignment.unwrap().iter().map(|(v, x)| (*v, *x)).collect();
        let a2: Vec<_> = r2.assignment.unwrap().iter().map(|(v, x)| (*v, *x)).collect();
        assert_eq!(a1, a2);
        assert_eq!(r1.stats.nodes, r2.stats.nodes);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let model = queens(8);
        let base = CspConfig::default()
            .with_variable_ordering(VariableOrdering::InputOrder)
            .with_value_ordering(ValueOrdering::DomainOrder);
        let seq = CspRunner::run(&model, &base).unwrap();
        let par = CspRunner::run(&model, &base.clone().with_parallel(true)).unwrap();
        assert!(par.is_solved());
        let mut s: Vec<_> = seq.assignment.unwrap().iter().map(|(v, x)| (*v, *x)).collect();
        let mut p: Vec<_> = par.assignment.unwrap().iter().map(|(v, x)| (*v, *x)).collect();
        s.sort_unstable();
        p.sort_unstable();
        assert_eq!(s, p);

        let unsat = pigeonhole(5, 4);
        let mut search = Backtracker::new(&unsat, &base.with_parallel(true));
        assert_eq!(search.solve(), SearchStatus::NoSolution);
        assert!(search.assignment().is_empty());
    }
}
