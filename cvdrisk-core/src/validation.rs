//! Input range validation.
//!
//! The presentation layer calls [`validate_inputs`] before handing inputs to the
//! computation core. The core itself only asserts the CRP log domain.

use crate::error::{CoreResult, RiskError};
use crate::profile::{PatientProfile, TherapyPlan};

/// Inclusive physiological range of a numeric input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

impl Range {
    const fn new(field: &'static str, min: f64, max: f64) -> Self {
        Range { field, min, max }
    }

    /// Check a value, rejecting NaN
    pub fn check(&self, value: f64) -> CoreResult<()> {
        if (self.min..=self.max).contains(&value) {
            Ok(())
        } else {
            Err(RiskError::InvalidRange {
                field: self.field,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

pub const AGE: Range = Range::new("age", 30.0, 90.0);
pub const SYSTOLIC_BP: Range = Range::new("systolic_bp", 80.0, 220.0);
pub const TARGET_SBP: Range = Range::new("target_sbp", 80.0, 220.0);
pub const TOTAL_CHOLESTEROL: Range = Range::new("total_cholesterol", 2.0, 10.0);
pub const HDL_CHOLESTEROL: Range = Range::new("hdl_cholesterol", 0.5, 3.0);
pub const EGFR: Range = Range::new("egfr", 15.0, 120.0);
pub const CRP: Range = Range::new("crp", 0.1, 20.0);
pub const VASCULAR_BEDS: Range = Range::new("vascular_bed_count", 0.0, 3.0);
pub const HBA1C: Range = Range::new("hba1c", 4.0, 12.0);
pub const BASELINE_LDL: Range = Range::new("baseline_ldl", 0.5, 6.0);

/// Validate every numeric input against its declared range
///
/// A CRP of exactly zero is accepted and means "not measured".
///
/// # Errors
///
/// Returns `RiskError::InvalidRange` for the first input out of range.
pub fn validate_inputs(profile: &PatientProfile, plan: &TherapyPlan) -> CoreResult<()> {
    AGE.check(profile.age as f64)?;
    SYSTOLIC_BP.check(profile.systolic_bp)?;
    TOTAL_CHOLESTEROL.check(profile.total_cholesterol)?;
    HDL_CHOLESTEROL.check(profile.hdl_cholesterol)?;
    EGFR.check(profile.egfr)?;
    if profile.crp != 0.0 {
        CRP.check(profile.crp)?;
    }
    VASCULAR_BEDS.check(profile.vascular_bed_count as f64)?;
    if let Some(hba1c) = profile.hba1c {
        HBA1C.check(hba1c)?;
    }

    BASELINE_LDL.check(plan.baseline_ldl)?;
    TARGET_SBP.check(plan.target_sbp)?;

    Ok(())
}
