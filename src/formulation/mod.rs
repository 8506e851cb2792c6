//! Mixed-integer formulations of the bar cutting problem.
//!
//! All four variants share one scaffold: assignment binaries, the coverage
//! constraints, length conservation and per-bar waste variables. A variant
//! only chooses its conservation policy and supplies the classification block
//! and the objective.

pub mod interpret;
mod model1;
mod model2;
mod model3;
mod model_o;

use std::ops::Range;
use std::time::Instant;

pub use model_o::ModelO;
pub use model1::Model1;
pub use model2::Model2;
pub use model3::Model3;

use crate::error::{FormulationError, SolverError, VariantError};
use crate::model::{LinExpr, ModelSpec, Relation, VarId};
use crate::solver::{SolveOutcome, Solver};
use crate::types::{CostParameters, ProblemInstance, VariantKind, VariantOutcome};

/// How a variant ties a bar's length to what is cut from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conservation {
    /// `assigned + leftover = length`
    Exact,
    /// `assigned <= length`; leftover is the unnamed slack
    Slack,
    /// `assigned + leftover = length * used`
    UsageScaled,
}

pub trait Formulation: Sync {
    fn kind(&self) -> VariantKind;

    fn conservation(&self) -> Conservation;

    /// Adds the variant's flags and leftover classification constraints.
    fn classify(&self, s: &mut Scaffold<'_>) -> Result<(), FormulationError>;

    fn objective(&self, s: &Scaffold<'_>) -> Result<LinExpr, FormulationError>;
}

/// A variable group an earlier build step must have created.
fn created<'v>(
    group: &'v Option<Vec<VarId>>,
    variant: VariantKind,
    name: &'static str,
) -> Result<&'v [VarId], FormulationError> {
    group
        .as_deref()
        .ok_or(FormulationError::MissingVariables { variant, group: name })
}

pub fn formulation_for(kind: VariantKind) -> &'static dyn Formulation {
    match kind {
        VariantKind::ModelO => &ModelO,
        VariantKind::Model1 => &Model1,
        VariantKind::Model2 => &Model2,
        VariantKind::Model3 => &Model3,
    }
}

/// Variable handles the post-solve pass reads back.
#[derive(Debug, Clone, Default)]
pub struct Handles {
    /// `assign[order][bar]`
    pub assign: Vec<Vec<VarId>>,
    pub leftover: Option<Vec<VarId>>,
    pub waste: Vec<VarId>,
    pub used: Option<Vec<VarId>>,
    pub leftover_flag: Option<Vec<VarId>>,
    pub reusable: Option<Vec<VarId>>,
    pub retail: Option<Vec<VarId>>,
}

/// A model under construction together with the instance it encodes.
pub struct Scaffold<'a> {
    pub instance: &'a ProblemInstance,
    pub params: &'a CostParameters,
    pub big_m: f64,
    pub model: ModelSpec,
    pub vars: Handles,
}

impl Scaffold<'_> {
    pub fn bars(&self) -> Range<usize> {
        0..self.instance.bar_count()
    }

    pub fn length(&self, bar: usize) -> f64 {
        self.instance.bars()[bar] as f64
    }

    /// Number of orders cut from `bar`.
    pub fn assigned_count(&self, bar: usize) -> LinExpr {
        self.vars.assign.iter().map(|row| row[bar]).sum()
    }

    /// Total order length cut from `bar`.
    pub fn assigned_length(&self, bar: usize) -> LinExpr {
        self.vars
            .assign
            .iter()
            .zip(self.instance.orders())
            .map(|(row, &len)| row[bar] * len as f64)
            .sum()
    }

    /// Explicit leftover variable, or the implicit slack for [`Conservation::Slack`].
    pub fn leftover(&self, bar: usize) -> LinExpr {
        match &self.vars.leftover {
            Some(vars) => vars[bar].into(),
            None => LinExpr::constant(self.length(bar)) - self.assigned_length(bar),
        }
    }

    pub fn binaries(&mut self, prefix: &str) -> Vec<VarId> {
        self.bars()
            .map(|j| self.model.binary(format!("{prefix}_{j}")))
            .collect()
    }

    pub fn continuous(&mut self, prefix: &str) -> Vec<VarId> {
        self.bars()
            .map(|j| self.model.continuous(format!("{prefix}_{j}")))
            .collect()
    }

    pub fn add(&mut self, name: String, constraint: (LinExpr, Relation)) {
        self.model.constrain(name, constraint);
    }
}

#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub kind: VariantKind,
    pub spec: ModelSpec,
    pub vars: Handles,
    pub big_m: f64,
}

/// Smallest Big-M that dominates every leftover, order count and threshold
/// the instance can produce. The strict reusability row needs `W + epsilon`.
pub fn required_big_m(instance: &ProblemInstance, params: &CostParameters) -> f64 {
    let max_bar = instance.max_bar() as f64;
    let orders = instance.order_count() as f64;
    let strict_threshold = (params.waste_threshold + params.epsilon).ceil();
    max_bar.max(orders).max(strict_threshold) + 1.0
}

pub fn resolve_big_m(
    instance: &ProblemInstance,
    params: &CostParameters,
) -> Result<f64, FormulationError> {
    let required = required_big_m(instance, params);
    match params.big_m {
        None => Ok(required),
        Some(big_m) if big_m >= required => Ok(big_m),
        Some(big_m) => Err(FormulationError::BigMTooSmall { big_m, required }),
    }
}

fn validate_params(params: &CostParameters) -> Result<(), FormulationError> {
    let checks = [
        ("waste_threshold", params.waste_threshold, params.waste_threshold >= 0.0),
        ("cut_cost", params.cut_cost, params.cut_cost.is_finite()),
        ("waste_unit_cost", params.waste_unit_cost, params.waste_unit_cost.is_finite()),
        ("retail_cost", params.retail_cost, params.retail_cost.is_finite()),
        ("epsilon", params.epsilon, params.epsilon > 0.0),
    ];
    for (name, value, ok) in checks {
        if !ok || !value.is_finite() {
            return Err(FormulationError::InvalidParameter { name, value });
        }
    }
    Ok(())
}

/// Builds the complete model of `form` for one instance.
pub fn build(
    form: &dyn Formulation,
    instance: &ProblemInstance,
    params: &CostParameters,
) -> Result<BuiltModel, FormulationError> {
    validate_params(params)?;
    let big_m = resolve_big_m(instance, params)?;
    let kind = form.kind();

    let mut s = Scaffold {
        instance,
        params,
        big_m,
        model: ModelSpec::new(kind.name()),
        vars: Handles::default(),
    };

    let n = instance.bar_count();
    s.vars.assign = (0..instance.order_count())
        .map(|i| {
            (0..n)
                .map(|j| s.model.binary(format!("x_{i}_{j}")))
                .collect()
        })
        .collect();

    for i in 0..instance.order_count() {
        let row: LinExpr = s.vars.assign[i].iter().copied().sum();
        s.add(format!("order_assigned_{i}"), row.equals(1.0));
    }

    match form.conservation() {
        Conservation::Exact => {
            s.vars.leftover = Some(s.continuous("leftover"));
            for j in s.bars() {
                let c = (s.assigned_length(j) + s.leftover(j)).equals(s.length(j));
                s.add(format!("bar_usage_{j}"), c);
            }
        }
        Conservation::Slack => {
            for j in s.bars() {
                let c = s.assigned_length(j).leq(s.length(j));
                s.add(format!("bar_capacity_{j}"), c);
            }
        }
        Conservation::UsageScaled => {
            let used = s.binaries("used");
            s.vars.leftover = Some(s.continuous("leftover"));
            for j in s.bars() {
                let c = (s.assigned_length(j) + s.leftover(j)).equals(used[j] * s.length(j));
                s.add(format!("bar_usage_{j}"), c);
            }
            s.vars.used = Some(used);
        }
    }

    s.vars.waste = s.continuous("waste");

    form.classify(&mut s)?;
    let objective = form.objective(&s)?;
    s.model.set_objective(objective);

    Ok(BuiltModel {
        kind,
        spec: s.model,
        vars: s.vars,
        big_m,
    })
}

/// Builds, solves and interprets one variant on one instance.
pub fn run_variant<S: Solver + ?Sized>(
    form: &dyn Formulation,
    solver: &S,
    instance: &ProblemInstance,
    params: &CostParameters,
    run_id: usize,
) -> Result<VariantOutcome, VariantError> {
    let built = build(form, instance, params)?;
    let kind = built.kind;
    tracing::debug!(
        variant = %kind,
        run_id,
        variables = built.spec.variables().len(),
        constraints = built.spec.constraints().len(),
        big_m = built.big_m,
        "model built"
    );

    let start = Instant::now();
    let outcome = solver.solve(&built.spec)?;
    let solve_seconds = start.elapsed().as_secs_f64();

    match outcome {
        SolveOutcome::Optimal(sol) => {
            let expected = built.spec.variables().len();
            if sol.values().len() != expected {
                return Err(SolverError::ValueCount {
                    expected,
                    got: sol.values().len(),
                }
                .into());
            }
            let result = interpret::summarize(
                run_id,
                kind,
                instance,
                params,
                &built.vars,
                &sol,
                solve_seconds,
            );
            tracing::debug!(
                variant = %kind,
                run_id,
                objective = result.objective,
                total_cost = result.total_cost,
                solve_seconds,
                "solved"
            );
            Ok(VariantOutcome::Solved(result))
        }
        SolveOutcome::Infeasible => {
            tracing::debug!(variant = %kind, run_id, "infeasible");
            Ok(VariantOutcome::Infeasible {
                run_id,
                variant: kind,
            })
        }
        SolveOutcome::Unbounded => {
            tracing::warn!(variant = %kind, run_id, "model reported unbounded");
            Ok(VariantOutcome::Unbounded {
                run_id,
                variant: kind,
            })
        }
    }
}
