use serde::{Deserialize, Serialize};

use crate::error::InvalidInstance;

/// Stock bars and customer orders for one cutting-stock run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemInstance {
    bars: Vec<u32>,
    orders: Vec<u32>,
}

impl ProblemInstance {
    pub fn new(bars: Vec<u32>, orders: Vec<u32>) -> Result<Self, InvalidInstance> {
        if bars.is_empty() {
            return Err(InvalidInstance::NoBars);
        }
        if orders.is_empty() {
            return Err(InvalidInstance::NoOrders);
        }
        if let Some(index) = bars.iter().position(|&l| l == 0) {
            return Err(InvalidInstance::NonPositiveBar { index });
        }
        if let Some(index) = orders.iter().position(|&l| l == 0) {
            return Err(InvalidInstance::NonPositiveOrder { index });
        }
        Ok(Self { bars, orders })
    }

    pub fn bars(&self) -> &[u32] {
        &self.bars
    }

    pub fn orders(&self) -> &[u32] {
        &self.orders
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn max_bar(&self) -> u32 {
        self.bars.iter().copied().max().unwrap_or(0)
    }

    pub fn total_bar_length(&self) -> u64 {
        self.bars.iter().map(|&l| l as u64).sum()
    }

    pub fn total_order_length(&self) -> u64 {
        self.orders.iter().map(|&l| l as u64).sum()
    }

    /// Structural reason no assignment can exist, if one is obvious.
    pub fn infeasibility_hint(&self) -> Option<InfeasibilityHint> {
        let longest_bar = self.max_bar();
        if let Some((order, &length)) = self
            .orders
            .iter()
            .enumerate()
            .find(|&(_, &l)| l > longest_bar)
        {
            return Some(InfeasibilityHint::OrderExceedsEveryBar {
                order,
                length,
                longest_bar,
            });
        }
        let stock = self.total_bar_length();
        let demand = self.total_order_length();
        if stock < demand {
            return Some(InfeasibilityHint::StockShorterThanDemand { stock, demand });
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfeasibilityHint {
    OrderExceedsEveryBar {
        order: usize,
        length: u32,
        longest_bar: u32,
    },
    StockShorterThanDemand {
        stock: u64,
        demand: u64,
    },
}

impl std::fmt::Display for InfeasibilityHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrderExceedsEveryBar {
                order,
                length,
                longest_bar,
            } => write!(
                f,
                "order {order} ({length}) is longer than every bar (longest {longest_bar})"
            ),
            Self::StockShorterThanDemand { stock, demand } => write!(
                f,
                "total stock length {stock} is shorter than total order length {demand}"
            ),
        }
    }
}

/// Cost and linearization constants handed to a formulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostParameters {
    /// Shortest leftover that still counts as reusable retail material.
    pub waste_threshold: f64,
    pub cut_cost: f64,
    pub waste_unit_cost: f64,
    /// Cost of returning a reusable leftover to stock (priced by Model3 only).
    pub retail_cost: f64,
    /// Fixed Big-M. `None` derives the smallest safe value per instance.
    pub big_m: Option<f64>,
    pub epsilon: f64,
}

impl Default for CostParameters {
    fn default() -> Self {
        Self {
            waste_threshold: 45.0,
            cut_cost: 400.0,
            waste_unit_cost: 100.0,
            retail_cost: 200.0,
            big_m: None,
            epsilon: 1e-3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VariantKind {
    #[serde(rename = "modelO")]
    ModelO,
    #[serde(rename = "model1")]
    Model1,
    #[serde(rename = "model2")]
    Model2,
    #[serde(rename = "model3")]
    Model3,
}

impl VariantKind {
    /// Every variant, in the order the harness runs them.
    pub const ALL: [VariantKind; 4] = [
        VariantKind::ModelO,
        VariantKind::Model1,
        VariantKind::Model2,
        VariantKind::Model3,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VariantKind::ModelO => "modelO",
            VariantKind::Model1 => "model1",
            VariantKind::Model2 => "model2",
            VariantKind::Model3 => "model3",
        }
    }
}

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to one bar in a solved plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPlan {
    pub bar: usize,
    pub length: u32,
    /// Indices into the instance's orders.
    pub orders: Vec<usize>,
    pub assigned_length: u64,
    pub leftover: f64,
    pub waste: f64,
    pub used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reusable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retail: Option<bool>,
}

impl BarPlan {
    pub fn is_perfect_fit(&self) -> bool {
        self.assigned_length == self.length as u64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolvedResult {
    pub run_id: usize,
    pub variant: VariantKind,
    pub cut_count: u32,
    pub cuts_cost: f64,
    pub waste_total: f64,
    pub waste_cost: f64,
    pub used_bar_count: u32,
    pub retail_bars: u32,
    pub total_cost: f64,
    pub objective: f64,
    pub solve_seconds: f64,
    pub plan: Vec<BarPlan>,
}

/// The normalized result of running one variant on one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VariantOutcome {
    #[serde(rename = "optimal")]
    Solved(SolvedResult),
    Infeasible { run_id: usize, variant: VariantKind },
    Unbounded { run_id: usize, variant: VariantKind },
}

impl VariantOutcome {
    pub fn variant(&self) -> VariantKind {
        match self {
            VariantOutcome::Solved(r) => r.variant,
            VariantOutcome::Infeasible { variant, .. }
            | VariantOutcome::Unbounded { variant, .. } => *variant,
        }
    }

    pub fn run_id(&self) -> usize {
        match self {
            VariantOutcome::Solved(r) => r.run_id,
            VariantOutcome::Infeasible { run_id, .. }
            | VariantOutcome::Unbounded { run_id, .. } => *run_id,
        }
    }

    pub fn solved(&self) -> Option<&SolvedResult> {
        match self {
            VariantOutcome::Solved(r) => Some(r),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            VariantOutcome::Solved(_) => "optimal",
            VariantOutcome::Infeasible { .. } => "infeasible",
            VariantOutcome::Unbounded { .. } => "unbounded",
        }
    }
}
