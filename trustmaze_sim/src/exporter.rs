//! JSON exporter for study results.
//!
//! Writes one document per study: every condition with its aggregate
//! metrics and per-episode summaries (maze included as rows of 0/1), plus
//! the BRI table.

use crate::error::SimError;
use crate::study::{BriRow, StudyReport};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use trustmaze_core::{EpisodeMetrics, PlannerStats};

/// One exported condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionExport {
    pub name: String,
    pub experiment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_level: Option<f64>,
    /// Flat aggregate metrics
    pub metrics: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planner_stats: Option<PlannerStats>,
    pub episodes: Vec<EpisodeMetrics>,
}

/// Complete study export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyExport {
    /// Seed shared by every condition
    pub seed: u64,

    pub difficulty: String,

    pub maze_size: usize,

    pub strategy: String,

    pub noise_type: String,

    pub conditions: Vec<ConditionExport>,

    pub bri: Vec<BriRow>,
}

impl StudyExport {
    /// Builds the export from a finished study.
    pub fn from_report(report: &StudyReport) -> Self {
        let base = report.conditions.first().map(|c| &c.result.config);

        let conditions = report
            .conditions
            .iter()
            .map(|c| ConditionExport {
                name: c.name.clone(),
                experiment_id: c.result.experiment_id.clone(),
                noise_level: c.noise_level,
                metrics: c
                    .result
                    .metrics
                    .as_ref()
                    .map(|m| m.to_map().into_iter().map(|(k, v)| (k.to_string(), v)).collect())
                    .unwrap_or_default(),
                planner_stats: c.result.planner_stats,
                episodes: c.result.episodes.clone(),
            })
            .collect();

        Self {
            seed: report.seed,
            difficulty: base.map(|c| c.difficulty.to_string()).unwrap_or_default(),
            maze_size: base.map_or(0, |c| c.maze_size),
            strategy: base.map(|c| c.strategy.to_string()).unwrap_or_default(),
            noise_type: report
                .conditions
                .get(1)
                .map(|c| c.result.config.noise_type.to_string())
                .unwrap_or_default(),
            conditions,
            bri: report.bri.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), SimError> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
