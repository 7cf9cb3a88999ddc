//! cvdrisk core library - cardiovascular risk estimation and intervention composition

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Computation is a pure function of its inputs and the read-only catalogs
// - No global mutable state; catalogs are initialized once and never modified
// - No randomness, clocks, threads, async or I/O inside the computation
// - Risks stay within [0, 100] percent and never increase under an intervention
// - Identical input yields bit-identical output

pub mod catalog;
pub mod compose;
pub mod config;
pub mod error;
pub mod ldl;
pub mod profile;
pub mod report;
pub mod risk;
pub mod scenario;
pub mod validation;

pub use catalog::{Catalog, InterventionEffect, LdlTherapyEffect};
pub use compose::RiskResult;
pub use config::ResolvedConfig;
pub use error::{CoreResult, RiskError};
pub use profile::{Horizon, InterventionSelection, PatientProfile, Sex, TherapyPlan};
pub use report::{render_csv, render_json, render_text, ExportRecord};
pub use scenario::Scenario;

use compose::CompositionInput;
use risk::BaselineRisk;

/// Baseline breakdown together with the final result
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub baseline: BaselineRisk,
    pub result: RiskResult,
}

/// Compute the risk result with the built-in catalog and models
pub fn compute_risk(
    profile: &PatientProfile,
    plan: &TherapyPlan,
    selection: &InterventionSelection,
) -> CoreResult<RiskResult> {
    compute_risk_with_config(profile, plan, selection, &ResolvedConfig::default())
}

/// Compute the risk result with a resolved configuration
pub fn compute_risk_with_config(
    profile: &PatientProfile,
    plan: &TherapyPlan,
    selection: &InterventionSelection,
    config: &ResolvedConfig,
) -> CoreResult<RiskResult> {
    assess(profile, plan, selection, config).map(|assessment| assessment.result)
}

/// Run the estimator and the composer, keeping the baseline breakdown
///
/// Inputs are expected to be range-checked by the caller
/// (see [`validation::validate_inputs`]).
pub fn assess(
    profile: &PatientProfile,
    plan: &TherapyPlan,
    selection: &InterventionSelection,
    config: &ResolvedConfig,
) -> CoreResult<Assessment> {
    let baseline = risk::analyze_baseline(
        profile,
        selection.horizon,
        &config.coefficients,
        &config.caps,
    )?;
    tracing::debug!(
        ten_year = baseline.ten_year,
        five_year = baseline.five_year,
        capped = baseline.capped,
        horizon = selection.horizon.as_str(),
        "baseline risk"
    );

    let projected_ldl = ldl::adjust_ldl(
        plan.baseline_ldl,
        &plan.pre_admission,
        &plan.add_on,
        &config.catalog,
        &config.ldl,
    )?;

    let input = CompositionInput {
        baseline_risk: baseline.capped,
        horizon: selection.horizon,
        interventions: &selection.interventions,
        ldl_baseline: plan.baseline_ldl,
        ldl_final: projected_ldl,
        sbp_current: profile.systolic_bp,
        sbp_target: plan.target_sbp,
    };
    let result = compose::compose(&input, &config.catalog, &config.effects)?;

    Ok(Assessment { baseline, result })
}
