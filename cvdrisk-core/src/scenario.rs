//! Scenario files: a complete set of calculator inputs in one JSON document

use crate::profile::{Horizon, InterventionSelection, PatientProfile, TherapyPlan};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Inputs for one computation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub profile: PatientProfile,
    pub therapy: TherapyPlan,
    pub selection: InterventionSelection,
}

/// Scenario document as written on disk
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    profile: PatientProfile,
    therapy: TherapyPlan,
    #[serde(default)]
    selection: SelectionFile,
}

/// Selection block whose horizon may be left to the caller
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SelectionFile {
    #[serde(default)]
    interventions: BTreeSet<String>,
    horizon: Option<Horizon>,
}

impl Scenario {
    /// Parse a scenario; `default_horizon` applies when the file names none
    pub fn from_json(json: &str, default_horizon: Horizon) -> Result<Self> {
        let file: ScenarioFile = serde_json::from_str(json).context("failed to parse scenario")?;
        Ok(Scenario {
            profile: file.profile,
            therapy: file.therapy,
            selection: InterventionSelection {
                interventions: file.selection.interventions,
                horizon: file.selection.horizon.unwrap_or(default_horizon),
            },
        })
    }
}

/// Load a scenario from a JSON file
pub fn load_scenario(path: &Path, default_horizon: Horizon) -> Result<Scenario> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario file: {}", path.display()))?;
    Scenario::from_json(&content, default_horizon)
        .with_context(|| format!("invalid scenario in: {}", path.display()))
}
