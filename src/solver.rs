use good_lp::solvers::microlp::microlp;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution as _, SolverModel, Variable,
    constraint, variable,
};

use crate::error::SolverError;
use crate::model::{Domain, LinExpr, ModelSpec, Relation, VarId};

/// Values the solver chose for every variable of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    values: Vec<f64>,
    objective: f64,
}

impl Solution {
    pub fn new(values: Vec<f64>, objective: f64) -> Self {
        Self { values, objective }
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Optimal(Solution),
    Infeasible,
    Unbounded,
}

/// Boundary to the mixed-integer engine. Implementations only read the
/// terminal status; they never steer the search.
pub trait Solver: Sync {
    fn solve(&self, model: &ModelSpec) -> Result<SolveOutcome, SolverError>;
}

/// Pure-Rust branch and bound through `good_lp`'s microlp backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

impl MicroLpSolver {
    pub fn new() -> Self {
        Self
    }

    fn to_expression(expr: &LinExpr, handles: &[Variable]) -> Expression {
        let mut out = Expression::default();
        for &(var, coeff) in expr.terms() {
            out += handles[var.index()] * coeff;
        }
        out
    }
}

impl Solver for MicroLpSolver {
    fn solve(&self, model: &ModelSpec) -> Result<SolveOutcome, SolverError> {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .variables()
            .iter()
            .map(|def| {
                let mut v = match def.domain {
                    Domain::Binary => variable().binary(),
                    Domain::Continuous => variable().min(0.0),
                };
                if let Some(upper) = def.upper {
                    v = v.max(upper);
                }
                vars.add(v.name(def.name.clone()))
            })
            .collect();

        let objective = Self::to_expression(model.objective(), &handles);
        let mut problem = vars.minimise(objective).using(microlp);

        for c in model.constraints() {
            // `expr + k (rel) 0` is handed over as `expr (rel) -k`, with `>=` flipped to `<=`
            let (expr, relation) = match c.relation {
                Relation::Ge => (-c.expr.clone(), Relation::Le),
                r => (c.expr.clone(), r),
            };
            let lhs = Self::to_expression(&expr, &handles);
            let rhs = -expr.constant_part();
            problem = problem.with(match relation {
                Relation::Eq => constraint::eq(lhs, rhs),
                _ => constraint::leq(lhs, rhs),
            });
        }

        match problem.solve() {
            Ok(sol) => {
                let values: Vec<f64> = handles.iter().map(|&h| sol.value(h)).collect();
                let objective = model.objective().evaluate(&values);
                Ok(SolveOutcome::Optimal(Solution::new(values, objective)))
            }
            Err(ResolutionError::Infeasible) => Ok(SolveOutcome::Infeasible),
            Err(ResolutionError::Unbounded) => Ok(SolveOutcome::Unbounded),
            Err(e) => Err(SolverError::Backend(e.to_string())),
        }
    }
}
