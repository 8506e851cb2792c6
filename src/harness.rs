//! Drives repeated generate-solve-record iterations across all variants.

use std::panic::{AssertUnwindSafe, catch_unwind};

use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::ExperimentConfig;
use crate::error::{ConfigError, VariantError};
use crate::formulation::{formulation_for, run_variant};
use crate::generator::InstanceGenerator;
use crate::solver::Solver;
use crate::types::{ProblemInstance, VariantKind, VariantOutcome};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "row", rename_all = "snake_case")]
pub enum ReportRow {
    Outcome(VariantOutcome),
    /// Closes the rows of one successful run.
    Separator,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExperimentReport {
    pub rows: Vec<ReportRow>,
    /// Instance of each successful run; run `k` is at index `k - 1`.
    pub instances: Vec<ProblemInstance>,
    pub successful_runs: usize,
    /// Variant attempts that did not produce a solved result.
    pub failed_attempts: usize,
    /// Valid instances on which no variant solved.
    pub discarded_instances: usize,
    pub invalid_instances: usize,
}

impl ExperimentReport {
    pub fn instance(&self, run_id: usize) -> Option<&ProblemInstance> {
        run_id.checked_sub(1).and_then(|i| self.instances.get(i))
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &VariantOutcome> {
        self.rows.iter().filter_map(|row| match row {
            ReportRow::Outcome(o) => Some(o),
            ReportRow::Separator => None,
        })
    }
}

pub struct Harness<S> {
    config: ExperimentConfig,
    generator: InstanceGenerator,
    solver: S,
}

impl<S: Solver> Harness<S> {
    pub fn new(config: ExperimentConfig, solver: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let generator = InstanceGenerator::new(config.generator)?;
        Ok(Self {
            config,
            generator,
            solver,
        })
    }

    /// Runs until the configured number of runs succeeded, or the attempt
    /// limit is hit.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> ExperimentReport {
        let mut report = ExperimentReport::default();
        let mut attempts = 0usize;

        while report.successful_runs < self.config.runs {
            if let Some(max) = self.config.max_attempts
                && attempts >= max
            {
                tracing::warn!(
                    attempts,
                    successful_runs = report.successful_runs,
                    target = self.config.runs,
                    "attempt limit reached, stopping early"
                );
                break;
            }
            attempts += 1;

            let instance = match self.generator.generate(rng) {
                Ok(instance) => instance,
                Err(e) => {
                    tracing::warn!(attempt = attempts, error = %e, "discarding invalid instance");
                    report.invalid_instances += 1;
                    continue;
                }
            };

            let run_id = report.successful_runs + 1;
            let results = self.run_instance(&instance, run_id);

            let mut outcomes = Vec::new();
            for (kind, result) in VariantKind::ALL.into_iter().zip(results) {
                match result {
                    Ok(outcome) => {
                        if outcome.solved().is_none() {
                            report.failed_attempts += 1;
                        }
                        outcomes.push(outcome);
                    }
                    Err(e) => {
                        report.failed_attempts += 1;
                        tracing::warn!(variant = %kind, run_id, error = %e, "variant failed");
                    }
                }
            }

            let solved = outcomes.iter().filter(|o| o.solved().is_some()).count();
            if solved == 0 {
                report.discarded_instances += 1;
                match instance.infeasibility_hint() {
                    Some(hint) => tracing::debug!(attempt = attempts, %hint, "no variant solved"),
                    None => tracing::debug!(attempt = attempts, "no variant solved"),
                }
                continue;
            }

            tracing::info!(
                run_id,
                bars = instance.bar_count(),
                orders = instance.order_count(),
                solved,
                "run complete"
            );

            report.successful_runs += 1;
            let keep_failures = self.config.keep_failures;
            let rows = outcomes
                .into_iter()
                .filter(|o| keep_failures || o.solved().is_some())
                .map(ReportRow::Outcome);
            report.rows.extend(rows);
            report.rows.push(ReportRow::Separator);
            report.instances.push(instance);
        }

        report
    }

    /// Runs every variant on `instance`; results come back in `VariantKind::ALL` order.
    pub fn run_instance(
        &self,
        instance: &ProblemInstance,
        run_id: usize,
    ) -> Vec<Result<VariantOutcome, VariantError>> {
        if self.config.parallel {
            VariantKind::ALL
                .par_iter()
                .map(|&kind| self.run_guarded(kind, instance, run_id))
                .collect()
        } else {
            VariantKind::ALL
                .iter()
                .map(|&kind| self.run_guarded(kind, instance, run_id))
                .collect()
        }
    }

    fn run_guarded(
        &self,
        kind: VariantKind,
        instance: &ProblemInstance,
        run_id: usize,
    ) -> Result<VariantOutcome, VariantError> {
        let params = self.config.params_for(kind);
        let result = catch_unwind(AssertUnwindSafe(|| {
            run_variant(formulation_for(kind), &self.solver, instance, params, run_id)
        }));
        result.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::warn!(variant = %kind, run_id, panic = %message, "variant panicked");
            Err(VariantError::Panicked(message))
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;
    use crate::generator::GeneratorConfig;
    use crate::model::ModelSpec;
    use crate::solver::{MicroLpSolver, SolveOutcome, Solution};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    struct FailingSolver;

    impl Solver for FailingSolver {
        fn solve(&self, _model: &ModelSpec) -> Result<SolveOutcome, SolverError> {
            Err(SolverError::Backend("engine offline".to_string()))
        }
    }

    struct PanickingSolver;

    impl Solver for PanickingSolver {
        fn solve(&self, _model: &ModelSpec) -> Result<SolveOutcome, SolverError> {
            panic!("solver blew up")
        }
    }

    /// Returns an all-zero optimum for the named variants, infeasible for the rest.
    struct SelectiveSolver(Vec<VariantKind>);

    impl Solver for SelectiveSolver {
        fn solve(&self, model: &ModelSpec) -> Result<SolveOutcome, SolverError> {
            if self.0.iter().any(|k| k.name() == model.name()) {
                let values = vec![0.0; model.variables().len()];
                Ok(SolveOutcome::Optimal(Solution::new(values, 0.0)))
            } else {
                Ok(SolveOutcome::Infeasible)
            }
        }
    }

    /// Solves Model2 with all-zero values and reports every other model unbounded.
    struct UnboundedSolver;

    impl Solver for UnboundedSolver {
        fn solve(&self, model: &ModelSpec) -> Result<SolveOutcome, SolverError> {
            if model.name() == VariantKind::Model2.name() {
                let values = vec![0.0; model.variables().len()];
                Ok(SolveOutcome::Optimal(Solution::new(values, 0.0)))
            } else {
                Ok(SolveOutcome::Unbounded)
            }
        }
    }

    fn small_config(runs: usize) -> ExperimentConfig {
        ExperimentConfig {
            runs,
            seed: Some(3),
            generator: GeneratorConfig {
                min_bars: 2,
                max_bars: 4,
                min_orders: 2,
                max_orders: 4,
                min_length: 10,
                max_length: 120,
                waste_threshold: 45,
            },
            ..Default::default()
        }
    }

    fn separators(report: &ExperimentReport) -> usize {
        report
            .rows
            .iter()
            .filter(|r| matches!(r, ReportRow::Separator))
            .count()
    }

    #[test]
    fn test_stops_after_target_runs() {
        let harness = Harness::new(small_config(3), MicroLpSolver::new()).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        let report = harness.run(&mut rng);

        assert_eq!(report.successful_runs, 3);
        assert_eq!(separators(&report), 3);
        assert_eq!(report.instances.len(), 3);
        assert!(matches!(report.rows.last(), Some(ReportRow::Separator)));

        // run ids are consecutive and every solved row carries a plan
        let mut last_run = 0;
        for outcome in report.outcomes() {
            assert!(outcome.run_id() >= last_run);
            last_run = outcome.run_id();
            let solved = outcome.solved().unwrap();
            assert_eq!(solved.plan.len(), report.instance(last_run).unwrap().bar_count());
        }
        assert_eq!(last_run, 3);
    }

    #[test]
    fn test_parallel_matches_sequential_order() {
        let mut config = small_config(2);
        let sequential = Harness::new(config.clone(), MicroLpSolver::new()).unwrap();
        config.parallel = true;
        let parallel = Harness::new(config, MicroLpSolver::new()).unwrap();

        let a = sequential.run(&mut SmallRng::seed_from_u64(11));
        let b = parallel.run(&mut SmallRng::seed_from_u64(11));

        assert_eq!(a.instances, b.instances);
        let kinds = |r: &ExperimentReport| r.outcomes().map(|o| o.variant()).collect::<Vec<_>>();
        assert_eq!(kinds(&a), kinds(&b));
    }

    #[test]
    fn test_solver_errors_are_counted_not_raised() {
        let mut config = small_config(1);
        config.max_attempts = Some(5);
        let harness = Harness::new(config, FailingSolver).unwrap();
        let report = harness.run(&mut SmallRng::seed_from_u64(0));

        assert_eq!(report.successful_runs, 0);
        assert_eq!(report.failed_attempts, 20);
        assert_eq!(report.discarded_instances, 5);
        assert!(report.rows.is_empty());
    }

    #[test]
    fn test_panics_are_contained() {
        let mut config = small_config(1);
        config.max_attempts = Some(2);
        config.parallel = true;
        let harness = Harness::new(config, PanickingSolver).unwrap();
        let report = harness.run(&mut SmallRng::seed_from_u64(0));

        assert_eq!(report.failed_attempts, 8);
        assert_eq!(report.discarded_instances, 2);

        let instance = ProblemInstance::new(vec![100], vec![50]).unwrap();
        let results = harness.run_instance(&instance, 1);
        assert_eq!(results.len(), 4);
        for r in results {
            match r {
                Err(VariantError::Panicked(msg)) => assert_eq!(msg, "solver blew up"),
                other => panic!("expected panic error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_partial_success_counts_as_run() {
        let solver = SelectiveSolver(vec![VariantKind::Model2]);
        let harness = Harness::new(small_config(2), solver).unwrap();
        let report = harness.run(&mut SmallRng::seed_from_u64(5));

        assert_eq!(report.successful_runs, 2);
        assert_eq!(report.failed_attempts, 6);
        // failure markers are dropped by default
        assert_eq!(report.rows.len(), 4);
        assert!(report.outcomes().all(|o| o.variant() == VariantKind::Model2));
    }

    #[test]
    fn test_keep_failures_records_markers() {
        let solver = SelectiveSolver(vec![VariantKind::Model1]);
        let mut config = small_config(1);
        config.keep_failures = true;
        let harness = Harness::new(config, solver).unwrap();
        let report = harness.run(&mut SmallRng::seed_from_u64(5));

        let statuses: Vec<_> = report
            .outcomes()
            .map(|o| (o.variant(), o.status()))
            .collect();
        assert_eq!(
            statuses,
            vec![
                (VariantKind::ModelO, "infeasible"),
                (VariantKind::Model1, "optimal"),
                (VariantKind::Model2, "infeasible"),
                (VariantKind::Model3, "infeasible"),
            ]
        );
        assert_eq!(separators(&report), 1);
    }

    #[test]
    fn test_unbounded_counts_as_failed_attempt() {
        let mut config = small_config(1);
        config.keep_failures = true;
        let harness = Harness::new(config, UnboundedSolver).unwrap();
        let report = harness.run(&mut SmallRng::seed_from_u64(9));

        assert_eq!(report.successful_runs, 1);
        assert_eq!(report.failed_attempts, 3);
        let statuses: Vec<_> = report
            .outcomes()
            .map(|o| (o.variant(), o.status()))
            .collect();
        assert_eq!(
            statuses,
            vec![
                (VariantKind::ModelO, "unbounded"),
                (VariantKind::Model1, "unbounded"),
                (VariantKind::Model2, "optimal"),
                (VariantKind::Model3, "unbounded"),
            ]
        );

        let mut csv = Vec::new();
        crate::export::write_csv(&report, &mut csv).unwrap();
        let csv = String::from_utf8(csv).unwrap();
        assert_eq!(csv.lines().filter(|l| l.contains(",unbounded,")).count(), 3);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = small_config(0);
        assert!(matches!(
            Harness::new(config.clone(), FailingSolver),
            Err(ConfigError::NoRuns)
        ));
        config.runs = 1;
        config.generator.max_bars = config.generator.min_bars;
        assert!(matches!(
            Harness::new(config, FailingSolver),
            Err(ConfigError::EmptyRange { name: "bars", .. })
        ));
    }
}
