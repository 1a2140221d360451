//! `IntegerProgram` backed by `good_lp` with the pure-Rust microlp solver.
//!
//! The program is recorded as plain data and rebuilt into a fresh
//! `good_lp` model on every solve, so constraints added between solves
//! (e.g. the tie-break stage) are picked up naturally.

use good_lp::solvers::microlp::microlp;
use good_lp::{constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable};
use tracing::debug;

use super::solver::{Comparison, IntegerProgram, LinearExpr, Sense, SolveStatus, VarId};

#[derive(Debug, Default)]
pub struct MicrolpBackend {
    names: Vec<String>,
    constraints: Vec<(LinearExpr, Comparison, f64)>,
    objective: Option<(LinearExpr, Sense)>,
    values: Option<Vec<f64>>,
}

impl MicrolpBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable_count(&self) -> usize {
        self.names.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    fn to_expression(&self, expr: &LinearExpr, handles: &[Variable]) -> Result<Expression, String> {
        let mut out = Expression::from(0.0);
        for (var, coef) in &expr.terms {
            let handle = handles
                .get(var.0)
                .ok_or_else(|| format!("unknown variable index {}", var.0))?;
            out += *coef * *handle;
        }
        Ok(out)
    }

    fn run(&self) -> Result<Vec<f64>, SolveStatus> {
        let Some((objective, sense)) = &self.objective else {
            return Err(SolveStatus::Error("no objective set".into()));
        };

        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = self
            .names
            .iter()
            .map(|n| vars.add(variable().binary().name(n.clone())))
            .collect();

        let objective = self.to_expression(objective, &handles).map_err(SolveStatus::Error)?;
        let unsolved = match sense {
            Sense::Maximize => vars.maximise(objective),
            Sense::Minimize => vars.minimise(objective),
        };

        let mut model = unsolved.using(microlp);
        for (expr, cmp, rhs) in &self.constraints {
            let lhs = self.to_expression(expr, &handles).map_err(SolveStatus::Error)?;
            let c = match cmp {
                Comparison::Eq => constraint::eq(lhs, *rhs),
                Comparison::Le => constraint::leq(lhs, *rhs),
                Comparison::Ge => constraint::geq(lhs, *rhs),
            };
            model = model.with(c);
        }

        match model.solve() {
            Ok(solution) => Ok(handles.iter().map(|v| solution.value(*v)).collect()),
            Err(ResolutionError::Infeasible) => Err(SolveStatus::Infeasible),
            Err(ResolutionError::Unbounded) => Err(SolveStatus::Unbounded),
            Err(other) => Err(SolveStatus::Error(other.to_string())),
        }
    }
}

impl IntegerProgram for MicrolpBackend {
    fn add_binary(&mut self, name: &str) -> VarId {
        self.values = None;
        self.names.push(name.to_string());
        VarId(self.names.len() - 1)
    }

    fn add_constraint(&mut self, expr: LinearExpr, cmp: Comparison, rhs: f64) {
        self.values = None;
        self.constraints.push((expr, cmp, rhs));
    }

    fn set_objective(&mut self, expr: LinearExpr, sense: Sense) {
        self.values = None;
        self.objective = Some((expr, sense));
    }

    fn solve(&mut self) -> SolveStatus {
        debug!(
            variables = self.names.len(),
            constraints = self.constraints.len(),
            "microlp solve"
        );
        match self.run() {
            Ok(values) => {
                self.values = Some(values);
                SolveStatus::Optimal
            }
            Err(status) => {
                self.values = None;
                status
            }
        }
    }

    fn value(&self, var: VarId) -> Option<f64> {
        self.values.as_ref()?.get(var.0).copied()
    }
}
