//! Narrow 0/1 integer-programming interface.
//!
//! The squad optimizer only needs binary variables, linear constraints, a
//! linear objective and a solve call that reports a status. Any backend
//! offering those can sit behind `IntegerProgram`.

use std::fmt;

#[cfg(test)]
use mockall::automock;

/// Handle to a binary decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

/// Sum of `coefficient * variable` terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    /// Every variable with coefficient 1.
    pub fn sum_of<I: IntoIterator<Item = VarId>>(vars: I) -> Self {
        vars.into_iter().map(|v| (v, 1.0)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate against a full assignment indexed by `VarId`.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
            .sum()
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self { terms: iter.into_iter().collect() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Le,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Maximize,
    Minimize,
}

/// Terminal status reported by a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Optimal,
    /// A solution exists but optimality was not proven.
    Feasible,
    Infeasible,
    Unbounded,
    Error(String),
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "Optimal"),
            SolveStatus::Feasible => write!(f, "Feasible"),
            SolveStatus::Infeasible => write!(f, "Infeasible"),
            SolveStatus::Unbounded => write!(f, "Unbounded"),
            SolveStatus::Error(msg) => write!(f, "Error({msg})"),
        }
    }
}

/// A 0/1 integer linear program under construction.
///
/// Constraints accumulate across solves; setting a new objective replaces
/// the previous one. Values are only available after an optimal solve.
#[cfg_attr(test, automock)]
pub trait IntegerProgram {
    /// Create a binary variable.
    fn add_binary(&mut self, name: &str) -> VarId;

    /// Add `expr (cmp) rhs`.
    fn add_constraint(&mut self, expr: LinearExpr, cmp: Comparison, rhs: f64);

    /// Set the objective.
    fn set_objective(&mut self, expr: LinearExpr, sense: Sense);

    /// Solve the current program.
    fn solve(&mut self) -> SolveStatus;

    /// Value of a variable in the last optimal solution.
    fn value(&self, var: VarId) -> Option<f64>;
}
