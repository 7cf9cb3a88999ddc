//! Baseline risk estimation
//!
//! Global invariants enforced:
//! - Deterministic risk calculations
//! - Probabilities stay within [0, 100] percent
//! - Capping never increases risk

use crate::error::{CoreResult, RiskError};
use crate::profile::{Horizon, PatientProfile};
use serde::{Deserialize, Serialize};

/// Coefficients of the log-linear ten-year risk score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskCoefficients {
    pub age: f64,
    pub male: f64,
    pub systolic_bp: f64,
    pub total_cholesterol: f64,
    pub hdl_cholesterol: f64,
    pub smoker: f64,
    pub diabetes: f64,
    /// Applied per 10 mL/min/1.73m² of eGFR
    pub egfr_per_10: f64,
    /// Applied to ln(CRP + 1)
    pub crp_log: f64,
    pub vascular_bed: f64,
    /// Linear predictor centering constant
    pub centering: f64,
    /// Ten-year baseline survival
    pub baseline_survival: f64,
}

impl Default for RiskCoefficients {
    fn default() -> Self {
        RiskCoefficients {
            age: 0.064,
            male: 0.34,
            systolic_bp: 0.02,
            total_cholesterol: 0.25,
            hdl_cholesterol: -0.25,
            smoker: 0.44,
            diabetes: 0.51,
            egfr_per_10: -0.2,
            crp_log: 0.25,
            vascular_bed: 0.4,
            centering: 5.8,
            baseline_survival: 0.900,
        }
    }
}

/// Per-factor contributions to the linear predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LinearPredictor {
    pub age: f64,
    pub sex: f64,
    pub systolic_bp: f64,
    pub total_cholesterol: f64,
    pub hdl_cholesterol: f64,
    pub smoking: f64,
    pub diabetes: f64,
    pub egfr: f64,
    pub crp: f64,
    pub vascular_beds: f64,
}

impl LinearPredictor {
    /// Sum of all contributions
    pub fn total(&self) -> f64 {
        self.age
            + self.sex
            + self.systolic_bp
            + self.total_cholesterol
            + self.hdl_cholesterol
            + self.smoking
            + self.diabetes
            + self.egfr
            + self.crp
            + self.vascular_beds
    }

    /// Named contributions in formula order
    pub fn terms(&self) -> [(&'static str, f64); 10] {
        [
            ("age", self.age),
            ("sex", self.sex),
            ("systolic_bp", self.systolic_bp),
            ("total_cholesterol", self.total_cholesterol),
            ("hdl_cholesterol", self.hdl_cholesterol),
            ("smoking", self.smoking),
            ("diabetes", self.diabetes),
            ("egfr", self.egfr),
            ("crp", self.crp),
            ("vascular_beds", self.vascular_beds),
        ]
    }
}

/// Horizon-specific ceilings on the baseline risk (percent)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineCaps {
    pub five_year: f64,
    pub ten_year: f64,
    pub lifetime: f64,
}

impl Default for BaselineCaps {
    fn default() -> Self {
        BaselineCaps {
            five_year: 80.0,
            ten_year: 85.0,
            lifetime: 90.0,
        }
    }
}

impl BaselineCaps {
    pub fn ceiling(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::FiveYear => self.five_year,
            Horizon::TenYear => self.ten_year,
            Horizon::Lifetime => self.lifetime,
        }
    }
}

/// Baseline risk at every stage of estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BaselineRisk {
    pub linear_predictor: LinearPredictor,
    pub ten_year: f64,
    pub five_year: f64,
    pub horizon: Horizon,
    /// Risk for the horizon after capping
    pub capped: f64,
}

/// Round to one decimal place (half away from zero)
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places (half away from zero)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// CRP log term; zero CRP means no measurement and contributes nothing
fn crp_log(crp: f64) -> CoreResult<f64> {
    if !crp.is_finite() || crp <= -1.0 {
        return Err(RiskError::CrpDomain(crp));
    }
    if crp == 0.0 {
        Ok(0.0)
    } else {
        Ok((crp + 1.0).ln())
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Calculate per-factor linear predictor contributions
pub fn calculate_linear_predictor(
    profile: &PatientProfile,
    coefficients: &RiskCoefficients,
) -> CoreResult<LinearPredictor> {
    Ok(LinearPredictor {
        age: coefficients.age * profile.age as f64,
        sex: coefficients.male * profile.sex.indicator(),
        systolic_bp: coefficients.systolic_bp * profile.systolic_bp,
        total_cholesterol: coefficients.total_cholesterol * profile.total_cholesterol,
        hdl_cholesterol: coefficients.hdl_cholesterol * profile.hdl_cholesterol,
        smoking: coefficients.smoker * indicator(profile.is_smoker),
        diabetes: coefficients.diabetes * indicator(profile.has_diabetes),
        egfr: coefficients.egfr_per_10 * (profile.egfr / 10.0),
        crp: coefficients.crp_log * crp_log(profile.crp)?,
        vascular_beds: coefficients.vascular_bed * profile.vascular_bed_count as f64,
    })
}

/// Ten-year event probability in [0, 1]
///
/// Formula:
/// r10 = 1 - S0 ^ exp(lp - centering)
pub fn ten_year_probability(lp: f64, coefficients: &RiskCoefficients) -> f64 {
    1.0 - coefficients
        .baseline_survival
        .powf((lp - coefficients.centering).exp())
}

/// Ten-year risk percentage (one decimal) with default coefficients
pub fn estimate_ten_year_risk(profile: &PatientProfile) -> CoreResult<f64> {
    estimate_ten_year_risk_with_coefficients(profile, &RiskCoefficients::default())
}

/// Ten-year risk percentage (one decimal) with custom coefficients
pub fn estimate_ten_year_risk_with_coefficients(
    profile: &PatientProfile,
    coefficients: &RiskCoefficients,
) -> CoreResult<f64> {
    let lp = calculate_linear_predictor(profile, coefficients)?;
    Ok(round1(ten_year_probability(lp.total(), coefficients) * 100.0))
}

/// Five-year equivalent of a ten-year risk, assuming constant hazard
///
/// Formula:
/// r5 = 1 - (1 - r10)^0.5
pub fn convert_to_five_year(ten_year_percent: f64) -> f64 {
    let p = ten_year_percent / 100.0;
    round1((1.0 - (1.0 - p).powf(0.5)) * 100.0)
}

/// Baseline for a horizon; ten-year and lifetime both use the ten-year estimate
pub fn baseline_for_horizon(ten_year_percent: f64, horizon: Horizon) -> f64 {
    match horizon {
        Horizon::FiveYear => convert_to_five_year(ten_year_percent),
        Horizon::TenYear | Horizon::Lifetime => ten_year_percent,
    }
}

/// Apply the horizon ceiling
pub fn cap_baseline(risk: f64, horizon: Horizon, caps: &BaselineCaps) -> f64 {
    risk.min(caps.ceiling(horizon))
}

/// Run the full baseline pipeline for a profile and horizon
pub fn analyze_baseline(
    profile: &PatientProfile,
    horizon: Horizon,
    coefficients: &RiskCoefficients,
    caps: &BaselineCaps,
) -> CoreResult<BaselineRisk> {
    let linear_predictor = calculate_linear_predictor(profile, coefficients)?;
    let probability = ten_year_probability(linear_predictor.total(), coefficients);
    let ten_year = round1(probability * 100.0);
    let five_year = convert_to_five_year(ten_year);
    let capped = cap_baseline(baseline_for_horizon(ten_year, horizon), horizon, caps);

    Ok(BaselineRisk {
        linear_predictor,
        ten_year,
        five_year,
        horizon,
        capped,
    })
}
