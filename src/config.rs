use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::generator::GeneratorConfig;
use crate::types::{CostParameters, VariantKind};

/// Settings for one batch experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Successful runs to collect before stopping.
    pub runs: usize,
    /// Fixed seed for the instance generator. `None` seeds from entropy.
    pub seed: Option<u64>,
    pub generator: GeneratorConfig,
    pub params: CostParameters,
    /// Per-variant replacements for `params`.
    pub overrides: BTreeMap<VariantKind, CostParameters>,
    pub parallel: bool,
    /// Also record infeasible and unbounded outcomes in the report rows.
    pub keep_failures: bool,
    /// Upper bound on generated instances. `None` runs until `runs` succeed.
    pub max_attempts: Option<usize>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            runs: 100,
            seed: None,
            generator: GeneratorConfig::default(),
            params: CostParameters::default(),
            overrides: BTreeMap::new(),
            parallel: false,
            keep_failures: false,
            max_attempts: None,
        }
    }
}

impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Bars are drawn no shorter than the reuse threshold, so every variant
    /// must classify leftovers with that same threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runs == 0 {
            return Err(ConfigError::NoRuns);
        }
        self.generator.validate()?;

        let generator = self.generator.waste_threshold;
        for variant in VariantKind::ALL {
            let params = self.params_for(variant).waste_threshold;
            if params != generator as f64 {
                return Err(ConfigError::ThresholdMismatch {
                    variant,
                    generator,
                    params,
                });
            }
        }
        Ok(())
    }

    pub fn params_for(&self, variant: VariantKind) -> &CostParameters {
        self.overrides.get(&variant).unwrap_or(&self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExperimentConfig::default();
        assert_eq!(config.runs, 100);
        assert_eq!(config.generator.waste_threshold, 45);
        assert_eq!(config.params.cut_cost, 400.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ExperimentConfig::from_json(
            r#"{
                "runs": 5,
                "seed": 7,
                "generator": { "min_bars": 2, "max_bars": 4 },
                "params": { "cut_cost": 10.0 },
                "overrides": { "model3": { "retail_cost": 0.0 } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.runs, 5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.generator.min_bars, 2);
        assert_eq!(config.generator.max_orders, 10);
        assert_eq!(config.params.cut_cost, 10.0);
        assert_eq!(config.params.waste_unit_cost, 100.0);
        assert!(!config.parallel);
        assert_eq!(config.max_attempts, None);
    }

    #[test]
    fn test_overrides_apply_per_variant() {
        let config = ExperimentConfig::from_json(
            r#"{ "overrides": { "model3": { "retail_cost": 0.0 } } }"#,
        )
        .unwrap();

        assert_eq!(config.params_for(VariantKind::Model3).retail_cost, 0.0);
        // an override replaces the whole parameter set
        assert_eq!(config.params_for(VariantKind::Model3).cut_cost, 400.0);
        assert_eq!(config.params_for(VariantKind::Model1).retail_cost, 200.0);
    }

    #[test]
    fn test_rejects_zero_runs() {
        let result = ExperimentConfig::from_json(r#"{ "runs": 0 }"#);
        assert!(matches!(result, Err(ConfigError::NoRuns)));
    }

    #[test]
    fn test_rejects_split_threshold() {
        let result = ExperimentConfig::from_json(r#"{ "params": { "waste_threshold": 30.0 } }"#);
        assert!(matches!(
            result,
            Err(ConfigError::ThresholdMismatch {
                variant: VariantKind::ModelO,
                generator: 45,
                ..
            })
        ));

        let result = ExperimentConfig::from_json(
            r#"{ "overrides": { "model2": { "waste_threshold": 60.0 } } }"#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::ThresholdMismatch { variant: VariantKind::Model2, .. })
        ));

        let config = ExperimentConfig::from_json(
            r#"{
                "generator": { "waste_threshold": 30 },
                "params": { "waste_threshold": 30.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.params_for(VariantKind::Model3).waste_threshold, 30.0);
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            ExperimentConfig::from_json("{ runs: "),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ExperimentConfig::from_json(r#"{ "overrides": { "model9": {} } }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ExperimentConfig::load("/nonexistent/cutstock.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
