//! Reliance study - baseline vs. tooled conditions across noise levels.
//!
//! ```text
//!   <difficulty>_baseline          tool disabled        -> BSA
//!   <difficulty>_tool_<pct>pct     tool at noise level  -> CR (call rate), TSA, TA = 1 - noise
//!                                                          BRI + band
//! ```

use crate::error::SimError;
use crate::runner::{ExperimentConfig, ExperimentResult, ExperimentRunner};

use serde::{Deserialize, Serialize};
use tracing::info;
use trustmaze_core::metrics::tool_accuracy_from_noise;
use trustmaze_core::{blind_reliance_index, ConfigError, NoiseType, RelianceBand};

/// Configuration of a reliance study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Shared settings; `use_tool` and `noise_level` are set per condition
    pub base: ExperimentConfig,

    /// One tooled condition per level
    pub noise_levels: Vec<f64>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            base: ExperimentConfig {
                noise_type: NoiseType::Random,
                ..Default::default()
            },
            noise_levels: vec![0.0, 0.2, 0.4, 0.6],
        }
    }
}

/// One experimental condition and its results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionResult {
    pub name: String,
    /// `None` for the baseline
    pub noise_level: Option<f64>,
    pub result: ExperimentResult,
}

/// BRI for one tooled condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriRow {
    pub condition: String,
    pub noise_level: f64,
    pub tool_accuracy: f64,
    /// Tool queries per step in the tooled run
    pub call_rate: f64,
    pub baseline_stepwise_accuracy: f64,
    pub tool_stepwise_accuracy: f64,
    pub bri: f64,
    pub band: RelianceBand,
}

/// Everything a study produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyReport {
    pub seed: u64,
    /// Baseline first, then tooled conditions in level order
    pub conditions: Vec<ConditionResult>,
    pub bri: Vec<BriRow>,
}

impl StudyReport {
    pub fn baseline(&self) -> Option<&ConditionResult> {
        self.conditions.iter().find(|c| c.noise_level.is_none())
    }
}

/// Condition name for a tooled run, e.g. `medium_tool_20pct`.
pub fn condition_name(config: &ExperimentConfig, noise_level: Option<f64>) -> String {
    match noise_level {
        None => format!("{}_baseline", config.difficulty),
        Some(level) => format!("{}_tool_{}pct", config.difficulty, (level * 100.0).round() as u32),
    }
}

/// Runs a baseline and one tooled condition per noise level.
pub struct RelianceStudy {
    config: StudyConfig,
}

impl RelianceStudy {
    pub fn new(config: StudyConfig) -> Result<Self, SimError> {
        if config.noise_levels.is_empty() {
            return Err(SimError::invalid_study("at least one noise level is required"));
        }
        for &level in &config.noise_levels {
            ConfigError::check_probability("noise_level", level)?;
        }
        config.base.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn run(&self) -> Result<StudyReport, SimError> {
        let base = &self.config.base;
        info!(
            "Reliance study: {} {}x{}, strategy={}, noise={}, levels={:?}",
            base.difficulty, base.maze_size, base.maze_size, base.strategy, base.noise_type, self.config.noise_levels
        );

        let baseline_config = ExperimentConfig {
            use_tool: false,
            noise_level: 0.0,
            ..base.clone()
        };
        let baseline = ConditionResult {
            name: condition_name(base, None),
            noise_level: None,
            result: ExperimentRunner::new(baseline_config)?.run()?,
        };
        let baseline_sa = baseline.result.avg_stepwise_accuracy();
        info!("{}: stepwise accuracy {:.3}", baseline.name, baseline_sa);

        let mut conditions = vec![baseline];
        let mut bri = Vec::with_capacity(self.config.noise_levels.len());

        for &level in &self.config.noise_levels {
            let config = ExperimentConfig {
                use_tool: true,
                noise_level: level,
                ..base.clone()
            };
            let name = condition_name(base, Some(level));
            let result = ExperimentRunner::new(config)?.run()?;

            let tool_accuracy = tool_accuracy_from_noise(level);
            let call_rate = result.avg_tool_usage_rate();
            let tool_sa = result.avg_stepwise_accuracy();
            let value = blind_reliance_index(call_rate, baseline_sa, tool_sa, tool_accuracy);
            let band = RelianceBand::classify(value);
            info!("{}: BRI {:.3} ({})", name, value, band);

            bri.push(BriRow {
                condition: name.clone(),
                noise_level: level,
                tool_accuracy,
                call_rate,
                baseline_stepwise_accuracy: baseline_sa,
                tool_stepwise_accuracy: tool_sa,
                bri: value,
                band,
            });
            conditions.push(ConditionResult {
                name,
                noise_level: Some(level),
                result,
            });
        }

        Ok(StudyReport {
            seed: base.seed,
            conditions,
            bri,
        })
    }
}
