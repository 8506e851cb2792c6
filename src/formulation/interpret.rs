//! Turns solver values back into a cutting plan and its costs.

use super::Handles;
use crate::model::VarId;
use crate::solver::Solution;
use crate::types::{BarPlan, CostParameters, ProblemInstance, SolvedResult, VariantKind};

/// Binaries come back as floats; anything above this counts as set.
pub const BINARY_THRESHOLD: f64 = 0.5;

fn is_set(sol: &Solution, var: VarId) -> bool {
    sol.value(var) > BINARY_THRESHOLD
}

/// Cuts needed on a bar carrying `orders` pieces.
///
/// A perfectly filled bar needs one cut between each pair of pieces. Any
/// leftover takes one more cut to separate it. Untouched bars are not cut.
pub fn cuts_for_bar(orders: usize, perfect_fit: bool) -> u32 {
    match orders {
        0 => 0,
        k if perfect_fit => (k - 1) as u32,
        k => k as u32,
    }
}

pub fn bar_plans(instance: &ProblemInstance, vars: &Handles, sol: &Solution) -> Vec<BarPlan> {
    instance
        .bars()
        .iter()
        .enumerate()
        .map(|(j, &length)| {
            let orders: Vec<usize> = vars
                .assign
                .iter()
                .enumerate()
                .filter(|(_, row)| is_set(sol, row[j]))
                .map(|(i, _)| i)
                .collect();
            let assigned_length: u64 = orders.iter().map(|&i| instance.orders()[i] as u64).sum();
            let leftover = match &vars.leftover {
                Some(v) => sol.value(v[j]),
                None => length as f64 - assigned_length as f64,
            };
            let used = match &vars.used {
                Some(v) => is_set(sol, v[j]),
                None => !orders.is_empty(),
            };

            BarPlan {
                bar: j,
                length,
                orders,
                assigned_length,
                leftover,
                waste: sol.value(vars.waste[j]).max(0.0),
                used,
                reusable: vars.reusable.as_ref().map(|v| is_set(sol, v[j])),
                retail: vars.retail.as_ref().map(|v| is_set(sol, v[j])),
            }
        })
        .collect()
}

pub fn summarize(
    run_id: usize,
    variant: VariantKind,
    instance: &ProblemInstance,
    params: &CostParameters,
    vars: &Handles,
    sol: &Solution,
    solve_seconds: f64,
) -> SolvedResult {
    let plan = bar_plans(instance, vars, sol);

    let cut_count: u32 = plan
        .iter()
        .map(|b| cuts_for_bar(b.orders.len(), b.is_perfect_fit()))
        .sum();
    let waste_total: f64 = plan.iter().map(|b| b.waste).sum();
    let used_bar_count = plan.iter().filter(|b| b.used).count() as u32;
    let retail_bars = plan.iter().filter(|b| b.retail == Some(true)).count() as u32;

    let cuts_cost = cut_count as f64 * params.cut_cost;
    let waste_cost = waste_total * params.waste_unit_cost;

    SolvedResult {
        run_id,
        variant,
        cut_count,
        cuts_cost,
        waste_total,
        waste_cost,
        used_bar_count,
        retail_bars,
        total_cost: cuts_cost + waste_cost,
        objective: sol.objective(),
        solve_seconds,
        plan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelSpec;

    #[test]
    fn test_cut_derivation() {
        assert_eq!(cuts_for_bar(0, false), 0);
        assert_eq!(cuts_for_bar(0, true), 0);
        assert_eq!(cuts_for_bar(1, true), 0);
        assert_eq!(cuts_for_bar(1, false), 1);
        assert_eq!(cuts_for_bar(3, true), 2);
        assert_eq!(cuts_for_bar(3, false), 3);
    }

    /// Hand-built values for 2 bars x 3 orders, without an explicit leftover.
    fn handles_and_solution(assign: [[f64; 2]; 3], waste: [f64; 2]) -> (Handles, Solution) {
        let mut model = ModelSpec::new("t");
        let mut values = Vec::new();
        let mut vars = Handles::default();
        for (i, row) in assign.iter().enumerate() {
            let mut ids = Vec::new();
            for (j, &v) in row.iter().enumerate() {
                ids.push(model.binary(format!("x_{i}_{j}")));
                values.push(v);
            }
            vars.assign.push(ids);
        }
        for (j, &w) in waste.iter().enumerate() {
            vars.waste.push(model.continuous(format!("waste_{j}")));
            values.push(w);
        }
        (vars, Solution::new(values, 0.0))
    }

    #[test]
    fn test_plan_from_slack() {
        let instance = ProblemInstance::new(vec![200, 150], vec![100, 80, 150]).unwrap();
        // orders 0 and 1 on bar 0, order 2 fills bar 1
        let (vars, sol) = handles_and_solution(
            [[1.0, 0.0], [0.999_999, 1e-7], [0.0, 1.0]],
            [20.0, -1e-9],
        );
        let plan = bar_plans(&instance, &vars, &sol);

        assert_eq!(plan[0].orders, vec![0, 1]);
        assert_eq!(plan[0].assigned_length, 180);
        assert!((plan[0].leftover - 20.0).abs() < 1e-9);
        assert!(!plan[0].is_perfect_fit());
        assert!(plan[0].used);

        assert_eq!(plan[1].orders, vec![2]);
        assert!(plan[1].is_perfect_fit());
        assert_eq!(plan[1].waste, 0.0);
        assert_eq!(plan[1].reusable, None);
    }

    #[test]
    fn test_summary_costs() {
        let instance = ProblemInstance::new(vec![200, 150], vec![100, 80, 150]).unwrap();
        let (vars, sol) =
            handles_and_solution([[1.0, 0.0], [1.0, 0.0], [0.0, 1.0]], [20.0, 0.0]);
        let params = CostParameters::default();
        let r = summarize(4, VariantKind::Model2, &instance, &params, &vars, &sol, 0.5);

        // bar 0: two pieces plus the leftover -> 2 cuts; bar 1: exact fit -> 0 cuts
        assert_eq!(r.cut_count, 2);
        assert_eq!(r.used_bar_count, 2);
        assert!((r.cuts_cost - 800.0).abs() < 1e-9);
        assert!((r.waste_total - 20.0).abs() < 1e-9);
        assert!((r.waste_cost - 2000.0).abs() < 1e-9);
        assert!((r.total_cost - 2800.0).abs() < 1e-9);
        assert_eq!(r.run_id, 4);
        assert_eq!(r.solve_seconds, 0.5);
    }
}
