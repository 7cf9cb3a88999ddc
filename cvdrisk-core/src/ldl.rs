//! Pharmacologic LDL-C projection
//!
//! Pre-admission therapies apply their full effect; add-on therapies apply a
//! fraction of it. The projection is floored after each stage.

use crate::catalog::Catalog;
use crate::error::{CoreResult, RiskError};
use std::collections::BTreeSet;

/// Parameters of the LDL projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LdlModel {
    /// Physiological floor (mmol/L)
    pub floor: f64,
    /// Fraction of the nominal effect achieved by add-on therapy
    pub add_on_factor: f64,
}

impl Default for LdlModel {
    fn default() -> Self {
        LdlModel {
            floor: 1.0,
            add_on_factor: 0.5,
        }
    }
}

/// Project LDL-C (mmol/L) after pre-admission and add-on therapy
///
/// The result is unrounded. The two sets must be disjoint.
pub fn adjust_ldl(
    baseline_ldl: f64,
    pre_admission: &BTreeSet<String>,
    add_on: &BTreeSet<String>,
    catalog: &Catalog,
    model: &LdlModel,
) -> CoreResult<f64> {
    if let Some(both) = pre_admission.intersection(add_on).next() {
        return Err(RiskError::TherapyOverlap(both.clone()));
    }

    let mut adjusted = baseline_ldl;
    for name in pre_admission {
        adjusted *= 1.0 - catalog.ldl_reduction(name)? / 100.0;
    }
    adjusted = adjusted.max(model.floor);

    for name in add_on {
        adjusted *= 1.0 - (catalog.ldl_reduction(name)? / 100.0) * model.add_on_factor;
    }
    adjusted = adjusted.max(model.floor);

    tracing::debug!(baseline_ldl, projected_ldl = adjusted, "ldl projection");
    Ok(adjusted)
}
