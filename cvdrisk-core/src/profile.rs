//! Patient inputs for a single risk computation
//!
//! Global invariants enforced:
//! - Inputs are immutable once constructed
//! - Set-valued inputs use ordered sets so iteration order is deterministic

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Biological sex as used by the risk formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }

    /// Indicator used in the linear predictor (male = 1)
    pub fn indicator(&self) -> f64 {
        match self {
            Sex::Male => 1.0,
            Sex::Female => 0.0,
        }
    }
}

/// Time window over which risk is projected
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    FiveYear,
    #[default]
    TenYear,
    Lifetime,
}

impl Horizon {
    /// Short label used in reports and exports
    pub fn as_str(&self) -> &'static str {
        match self {
            Horizon::FiveYear => "5yr",
            Horizon::TenYear => "10yr",
            Horizon::Lifetime => "lifetime",
        }
    }
}

/// Affected vascular territory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VascularBed {
    Coronary,
    Cerebrovascular,
    Peripheral,
}

impl VascularBed {
    /// Count distinct territories (duplicates are ignored)
    pub fn count_distinct(beds: &[VascularBed]) -> u8 {
        let distinct: BTreeSet<VascularBed> = beds.iter().copied().collect();
        distinct.len() as u8
    }
}

/// Patient risk factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct PatientProfile {
    pub age: u32,
    pub sex: Sex,
    /// Current systolic blood pressure (mmHg)
    pub systolic_bp: f64,
    /// mmol/L
    pub total_cholesterol: f64,
    /// mmol/L
    pub hdl_cholesterol: f64,
    #[serde(default)]
    pub is_smoker: bool,
    #[serde(default)]
    pub has_diabetes: bool,
    /// mL/min/1.73m²
    pub egfr: f64,
    /// High-sensitivity CRP (mg/L); zero means no measurement
    pub crp: f64,
    #[serde(default)]
    pub vascular_bed_count: u8,
    /// Latest HbA1c (%); recorded for export, not used by the formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hba1c: Option<f64>,
}

/// Lipid and blood-pressure therapy plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct TherapyPlan {
    /// Pre-admission LDL-C (mmol/L)
    pub baseline_ldl: f64,
    #[serde(default)]
    pub pre_admission: BTreeSet<String>,
    #[serde(default)]
    pub add_on: BTreeSet<String>,
    /// Target systolic blood pressure (mmHg)
    pub target_sbp: f64,
}

/// Interventions chosen by the user and the projection horizon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct InterventionSelection {
    #[serde(default)]
    pub interventions: BTreeSet<String>,
    #[serde(default)]
    pub horizon: Horizon,
}

impl TherapyPlan {
    /// First therapy present in both the pre-admission and add-on sets
    pub fn overlap(&self) -> Option<&str> {
        self.pre_admission
            .intersection(&self.add_on)
            .next()
            .map(String::as_str)
    }
}
