use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InvalidInstance};
use crate::types::ProblemInstance;

/// Ranges random instances are drawn from. Upper bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub min_bars: u32,
    pub max_bars: u32,
    pub min_orders: u32,
    pub max_orders: u32,
    /// Shortest order length.
    pub min_length: u32,
    pub max_length: u32,
    /// Shortest bar length; bars are never drawn below the reuse threshold.
    pub waste_threshold: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_bars: 9,
            max_bars: 11,
            min_orders: 5,
            max_orders: 10,
            min_length: 1,
            max_length: 300,
            waste_threshold: 45,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("bars", self.min_bars, self.max_bars),
            ("orders", self.min_orders, self.max_orders),
            ("order_length", self.min_length, self.max_length),
            ("bar_length", self.waste_threshold, self.max_length),
        ];
        for (name, min, max) in ranges {
            if min >= max {
                return Err(ConfigError::EmptyRange { name, min, max });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    config: GeneratorConfig,
}

impl InstanceGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Draws one instance. Feasibility is not checked.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ProblemInstance, InvalidInstance> {
        let c = &self.config;
        let n = rng.random_range(c.min_bars..c.max_bars) as usize;
        let m = rng.random_range(c.min_orders..c.max_orders) as usize;
        let bars = (0..n)
            .map(|_| rng.random_range(c.waste_threshold..c.max_length))
            .collect();
        let orders = (0..m)
            .map(|_| rng.random_range(c.min_length..c.max_length))
            .collect();
        ProblemInstance::new(bars, orders)
    }
}
