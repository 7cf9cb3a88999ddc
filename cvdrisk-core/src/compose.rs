//! Intervention composition
//!
//! Global invariants enforced:
//! - Every discount factor lies within [0, 1], so risk never increases
//! - Catalog interventions are applied before the LDL and BP effects
//! - RRR never exceeds the configured ceiling
//! - Identical input yields bit-identical output

use crate::catalog::Catalog;
use crate::error::CoreResult;
use crate::profile::Horizon;
use crate::risk::round1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Effect sizes of the LDL and blood-pressure models and the RRR ceiling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectModel {
    /// Relative reduction (%) per mmol/L of LDL-C lowered
    pub ldl_rrr_per_mmol: f64,
    pub ldl_rrr_max: f64,
    /// Relative reduction (%) per 10 mmHg of systolic BP lowered
    pub bp_rrr_per_10mmhg: f64,
    pub bp_rrr_max: f64,
    /// Upper bound on the reported RRR (%)
    pub rrr_ceiling: f64,
}

impl Default for EffectModel {
    fn default() -> Self {
        EffectModel {
            ldl_rrr_per_mmol: 22.0,
            ldl_rrr_max: 35.0,
            bp_rrr_per_10mmhg: 15.0,
            bp_rrr_max: 20.0,
            rrr_ceiling: 75.0,
        }
    }
}

impl EffectModel {
    /// Relative reduction (%) for an LDL drop, zero when LDL did not fall
    pub fn ldl_rrr(&self, ldl_baseline: f64, ldl_final: f64) -> f64 {
        if ldl_final < ldl_baseline {
            let drop = ldl_baseline - ldl_final;
            (self.ldl_rrr_per_mmol * drop).min(self.ldl_rrr_max)
        } else {
            0.0
        }
    }

    /// Relative reduction (%) for a systolic BP target, zero when target is not lower
    pub fn bp_rrr(&self, sbp_current: f64, sbp_target: f64) -> f64 {
        if sbp_target < sbp_current {
            let steps = (sbp_current - sbp_target) / 10.0;
            (self.bp_rrr_per_10mmhg * steps).min(self.bp_rrr_max)
        } else {
            0.0
        }
    }
}

/// Everything the composer needs besides the catalog
#[derive(Debug, Clone)]
pub struct CompositionInput<'a> {
    /// Capped baseline risk (%)
    pub baseline_risk: f64,
    pub horizon: Horizon,
    pub interventions: &'a BTreeSet<String>,
    pub ldl_baseline: f64,
    pub ldl_final: f64,
    pub sbp_current: f64,
    pub sbp_target: f64,
}

/// Kind of discount applied to the remaining risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Intervention,
    LdlLowering,
    BloodPressure,
}

/// One multiplicative step of the composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Discount {
    pub kind: DiscountKind,
    pub name: String,
    /// Percent removed from the remaining risk at this step
    pub reduction: f64,
}

impl Discount {
    pub fn factor(&self) -> f64 {
        1.0 - self.reduction / 100.0
    }
}

/// Outcome of a computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RiskResult {
    pub horizon: Horizon,
    /// Capped baseline risk (%)
    pub baseline_risk: f64,
    /// Risk after all discounts (%)
    pub final_risk: f64,
    /// Percentage points
    pub absolute_risk_reduction: f64,
    /// Percent of baseline
    pub relative_risk_reduction: f64,
    /// mmol/L, unrounded
    pub projected_ldl: f64,
    pub discounts: Vec<Discount>,
}

/// Apply intervention, LDL and BP discounts to a capped baseline
pub fn compose(
    input: &CompositionInput<'_>,
    catalog: &Catalog,
    model: &EffectModel,
) -> CoreResult<RiskResult> {
    let mut discounts: Vec<Discount> = catalog
        .select_interventions(input.interventions)?
        .into_iter()
        .map(|iv| Discount {
            kind: DiscountKind::Intervention,
            name: iv.name.clone(),
            reduction: iv.arr_for(input.horizon),
        })
        .collect();

    let ldl_rrr = model.ldl_rrr(input.ldl_baseline, input.ldl_final);
    if input.ldl_final < input.ldl_baseline {
        discounts.push(Discount {
            kind: DiscountKind::LdlLowering,
            name: "LDL-C lowering".to_string(),
            reduction: ldl_rrr,
        });
    }

    let bp_rrr = model.bp_rrr(input.sbp_current, input.sbp_target);
    if input.sbp_target < input.sbp_current {
        discounts.push(Discount {
            kind: DiscountKind::BloodPressure,
            name: "SBP lowering".to_string(),
            reduction: bp_rrr,
        });
    }

    let remaining = discounts
        .iter()
        .fold(input.baseline_risk / 100.0, |acc, d| acc * d.factor());

    let final_risk = round1(remaining * 100.0);
    let absolute_risk_reduction = round1(input.baseline_risk - final_risk);
    let relative_risk_reduction = if input.baseline_risk != 0.0 {
        let rrr = absolute_risk_reduction / input.baseline_risk * 100.0;
        round1(rrr.min(model.rrr_ceiling))
    } else {
        0.0
    };

    tracing::debug!(
        baseline = input.baseline_risk,
        final_risk,
        arr = absolute_risk_reduction,
        rrr = relative_risk_reduction,
        steps = discounts.len(),
        "composed interventions"
    );

    Ok(RiskResult {
        horizon: input.horizon,
        baseline_risk: input.baseline_risk,
        final_risk,
        absolute_risk_reduction,
        relative_risk_reduction,
        projected_ldl: input.ldl_final,
        discounts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiskError;

    fn set(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn input(baseline: f64, horizon: Horizon, ivs: &BTreeSet<String>) -> CompositionInput<'_> {
        CompositionInput {
            baseline_risk: baseline,
            horizon,
            interventions: ivs,
            ldl_baseline: 3.0,
            ldl_final: 3.0,
            sbp_current: 130.0,
            sbp_target: 130.0,
        }
    }

    fn run(input: &CompositionInput<'_>) -> RiskResult {
        compose(input, Catalog::standard(), &EffectModel::default()).unwrap()
    }

    #[test]
    fn test_no_discounts_leaves_baseline() {
        let none = set(&[]);
        let result = run(&input(85.0, Horizon::TenYear, &none));
        assert_eq!(result.final_risk, 85.0);
        assert_eq!(result.absolute_risk_reduction, 0.0);
        assert_eq!(result.relative_risk_reduction, 0.0);
        assert!(result.discounts.is_empty());
    }

    #[test]
    fn test_five_year_uses_five_year_column() {
        let ivs = set(&["Smoking cessation"]);
        let result = run(&input(20.0, Horizon::FiveYear, &ivs));
        assert_eq!(result.final_risk, 19.0);
        assert_eq!(result.absolute_risk_reduction, 1.0);
        assert_eq!(result.relative_risk_reduction, 5.0);
    }

    #[test]
    fn test_ten_year_and_lifetime_share_lifetime_column() {
        let ivs = set(&["Smoking cessation"]);
        let ten = run(&input(20.0, Horizon::TenYear, &ivs));
        let life = run(&input(20.0, Horizon::Lifetime, &ivs));
        assert_eq!(ten.final_risk, 16.6);
        assert_eq!(life.final_risk, 16.6);
    }

    #[test]
    fn test_ldl_effect_capped() {
        let none = set(&[]);
        let mut inp = input(50.0, Horizon::TenYear, &none);
        inp.ldl_baseline = 4.0;
        inp.ldl_final = 1.0;
        let result = run(&inp);
        // 22 * 3.0 = 66, capped at 35
        assert_eq!(result.discounts[0].reduction, 35.0);
        assert_eq!(result.final_risk, 32.5);
    }

    #[test]
    fn test_ldl_effect_proportional() {
        let none = set(&[]);
        let mut inp = input(50.0, Horizon::TenYear, &none);
        inp.ldl_baseline = 3.5;
        inp.ldl_final = 3.0;
        let result = run(&inp);
        assert!((result.discounts[0].reduction - 11.0).abs() < 1e-9);
        assert_eq!(result.final_risk, 44.5);
    }

    #[test]
    fn test_bp_effect_capped() {
        let none = set(&[]);
        let mut inp = input(80.0, Horizon::TenYear, &none);
        inp.sbp_current = 160.0;
        inp.sbp_target = 120.0;
        let result = run(&inp);
        assert_eq!(result.discounts[0].reduction, 20.0);
        assert_eq!(result.final_risk, 64.0);
        assert_eq!(result.absolute_risk_reduction, 16.0);
        assert_eq!(result.relative_risk_reduction, 20.0);
    }

    #[test]
    fn test_higher_targets_have_no_effect() {
        let none = set(&[]);
        let mut inp = input(40.0, Horizon::TenYear, &none);
        inp.sbp_target = 150.0;
        inp.ldl_final = 3.5;
        let result = run(&inp);
        assert!(result.discounts.is_empty());
        assert_eq!(result.final_risk, 40.0);
    }

    #[test]
    fn test_rrr_ceiling() {
        let all: BTreeSet<String> = Catalog::standard()
            .interventions()
            .iter()
            .map(|iv| iv.name.clone())
            .collect();
        let mut inp = input(85.0, Horizon::Lifetime, &all);
        inp.ldl_baseline = 6.0;
        inp.ldl_final = 1.0;
        inp.sbp_current = 220.0;
        inp.sbp_target = 120.0;
        let result = run(&inp);
        assert!(result.absolute_risk_reduction / 85.0 * 100.0 > 75.0);
        assert_eq!(result.relative_risk_reduction, 75.0);
    }

    #[test]
    fn test_zero_baseline_has_zero_rrr() {
        let ivs = set(&["Physical activity"]);
        let result = run(&input(0.0, Horizon::TenYear, &ivs));
        assert_eq!(result.final_risk, 0.0);
        assert_eq!(result.relative_risk_reduction, 0.0);
    }

    #[test]
    fn test_unknown_intervention_is_error() {
        let ivs = set(&["Cold showers"]);
        let err = compose(
            &input(30.0, Horizon::TenYear, &ivs),
            Catalog::standard(),
            &EffectModel::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RiskError::UnknownIntervention("Cold showers".to_string())
        );
    }
}
