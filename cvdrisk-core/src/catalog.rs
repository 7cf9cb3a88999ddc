//! Static effect catalogs for interventions and lipid-lowering therapies
//!
//! Global invariants enforced:
//! - Catalogs are read-only after construction
//! - Every effect size is non-negative (discount factors stay within [0, 1])
//! - Names are unique keys within each catalog
//! - Catalog order is the application order used by the composer

use crate::error::{CoreResult, RiskError};
use crate::profile::Horizon;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

/// Built-in interventions: (name, lifetime ARR, 5-year ARR) in percentage points
const BUILTIN_INTERVENTIONS: &[(&str, f64, f64)] = &[
    ("Smoking cessation", 17.0, 5.0),
    ("Antiplatelet (ASA or clopidogrel)", 6.0, 2.0),
    ("BP control (ACEi/ARB ± CCB)", 12.0, 4.0),
    ("Semaglutide 2.4 mg", 4.0, 1.0),
    ("Weight loss to ideal BMI", 10.0, 3.0),
    ("Empagliflozin", 6.0, 2.0),
    ("Icosapent ethyl (TG ≥1.5)", 5.0, 2.0),
    ("Mediterranean diet", 9.0, 3.0),
    ("Physical activity", 9.0, 3.0),
    ("Alcohol moderation", 5.0, 2.0),
    ("Stress reduction", 3.0, 1.0),
];

/// Built-in LDL-C lowering therapies: (name, percent reduction)
const BUILTIN_LDL_THERAPIES: &[(&str, f64)] = &[
    ("Atorvastatin 20 mg", 40.0),
    ("Atorvastatin 80 mg", 50.0),
    ("Rosuvastatin 10 mg", 40.0),
    ("Rosuvastatin 20–40 mg", 55.0),
    ("Simvastatin 40 mg", 35.0),
    ("Ezetimibe", 20.0),
    ("PCSK9 inhibitor", 60.0),
    ("Bempedoic acid", 18.0),
];

static STANDARD: OnceLock<Catalog> = OnceLock::new();

/// Absolute risk reduction of a single intervention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterventionEffect {
    pub name: String,
    /// Percentage points over the lifetime (also used for ten-year projections)
    pub arr_lifetime: f64,
    /// Percentage points over five years
    pub arr_5yr: f64,
}

impl InterventionEffect {
    /// ARR column for a horizon. Ten-year and lifetime share the lifetime column.
    pub fn arr_for(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::FiveYear => self.arr_5yr,
            Horizon::TenYear | Horizon::Lifetime => self.arr_lifetime,
        }
    }
}

/// LDL-C reduction achieved by a lipid-lowering therapy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LdlTherapyEffect {
    pub name: String,
    /// 0-100
    pub percent_reduction: f64,
}

/// Validated, read-only reference tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    interventions: Vec<InterventionEffect>,
    ldl_therapies: Vec<LdlTherapyEffect>,
}

impl Catalog {
    /// Build a catalog, rejecting negative effects, effects above 100% and duplicate names
    pub fn new(
        interventions: Vec<InterventionEffect>,
        ldl_therapies: Vec<LdlTherapyEffect>,
    ) -> CoreResult<Self> {
        let catalog = Catalog {
            interventions,
            ldl_therapies,
        };
        catalog.check()?;
        Ok(catalog)
    }

    /// The built-in catalog, initialized once and shared for the life of the process
    pub fn standard() -> &'static Catalog {
        STANDARD.get_or_init(|| {
            let catalog = builtin();
            debug_assert!(catalog.check().is_ok(), "built-in catalog must be valid");
            catalog
        })
    }

    pub fn interventions(&self) -> &[InterventionEffect] {
        &self.interventions
    }

    pub fn ldl_therapies(&self) -> &[LdlTherapyEffect] {
        &self.ldl_therapies
    }

    pub fn intervention(&self, name: &str) -> Option<&InterventionEffect> {
        self.interventions.iter().find(|iv| iv.name == name)
    }

    pub fn ldl_therapy(&self, name: &str) -> Option<&LdlTherapyEffect> {
        self.ldl_therapies.iter().find(|tx| tx.name == name)
    }

    /// Resolve selected intervention names, in catalog order
    ///
    /// Any name missing from the catalog is an error; it is never skipped.
    pub fn select_interventions(
        &self,
        selected: &BTreeSet<String>,
    ) -> CoreResult<Vec<&InterventionEffect>> {
        if let Some(unknown) = selected
            .iter()
            .find(|name| self.intervention(name).is_none())
        {
            return Err(RiskError::UnknownIntervention(unknown.clone()));
        }

        Ok(self
            .interventions
            .iter()
            .filter(|iv| selected.contains(&iv.name))
            .collect())
    }

    /// Percent reduction for a therapy name
    pub fn ldl_reduction(&self, name: &str) -> CoreResult<f64> {
        self.ldl_therapy(name)
            .map(|tx| tx.percent_reduction)
            .ok_or_else(|| RiskError::UnknownTherapy(name.to_string()))
    }

    /// Merge additional entries into a copy of this catalog
    ///
    /// An entry whose name already exists replaces the existing entry in place;
    /// new names are appended. The merged catalog is re-validated.
    pub fn extended(
        &self,
        interventions: &[InterventionEffect],
        ldl_therapies: &[LdlTherapyEffect],
    ) -> CoreResult<Catalog> {
        let mut merged_interventions = self.interventions.clone();
        for extra in interventions {
            match merged_interventions
                .iter_mut()
                .find(|iv| iv.name == extra.name)
            {
                Some(existing) => *existing = extra.clone(),
                None => merged_interventions.push(extra.clone()),
            }
        }

        let mut merged_tx = self.ldl_therapies.clone();
        for extra in ldl_therapies {
            match merged_tx.iter_mut().find(|tx| tx.name == extra.name) {
                Some(existing) => *existing = extra.clone(),
                None => merged_tx.push(extra.clone()),
            }
        }

        Catalog::new(merged_interventions, merged_tx)
    }

    /// Integrity check applied at load time
    fn check(&self) -> CoreResult<()> {
        let mut seen = HashSet::new();
        for iv in &self.interventions {
            if !seen.insert(iv.name.as_str()) {
                return Err(RiskError::DuplicateCatalogEntry(iv.name.clone()));
            }
            for value in [iv.arr_lifetime, iv.arr_5yr] {
                check_effect(&iv.name, value)?;
            }
        }

        let mut seen = HashSet::new();
        for tx in &self.ldl_therapies {
            if !seen.insert(tx.name.as_str()) {
                return Err(RiskError::DuplicateCatalogEntry(tx.name.clone()));
            }
            check_effect(&tx.name, tx.percent_reduction)?;
        }

        Ok(())
    }
}

fn check_effect(name: &str, value: f64) -> CoreResult<()> {
    if value.is_nan() || value < 0.0 {
        return Err(RiskError::NegativeEffect {
            name: name.to_string(),
            value,
        });
    }
    if value > 100.0 {
        return Err(RiskError::EffectOutOfRange {
            name: name.to_string(),
            value,
        });
    }
    Ok(())
}

fn builtin() -> Catalog {
    Catalog {
        interventions: BUILTIN_INTERVENTIONS
            .iter()
            .map(|&(name, arr_lifetime, arr_5yr)| InterventionEffect {
                name: name.to_string(),
                arr_lifetime,
                arr_5yr,
            })
            .collect(),
        ldl_therapies: BUILTIN_LDL_THERAPIES
            .iter()
            .map(|&(name, percent_reduction)| LdlTherapyEffect {
                name: name.to_string(),
                percent_reduction,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        builtin()
            .check()
            .expect("built-in catalog should pass integrity checks");
        let catalog = Catalog::standard();
        assert_eq!(catalog.interventions().len(), 11);
        assert_eq!(catalog.ldl_therapies().len(), 8);
    }

    #[test]
    fn test_standard_catalog_is_shared() {
        assert!(std::ptr::eq(Catalog::standard(), Catalog::standard()));
    }

    #[test]
    fn test_arr_column_by_horizon() {
        let iv = Catalog::standard()
            .intervention("Smoking cessation")
            .unwrap();
        assert_eq!(iv.arr_for(Horizon::FiveYear), 5.0);
        assert_eq!(iv.arr_for(Horizon::TenYear), 17.0);
        assert_eq!(iv.arr_for(Horizon::Lifetime), 17.0);
    }

    #[test]
    fn test_select_interventions_in_catalog_order() {
        let catalog = Catalog::standard();
        let selected = catalog
            .select_interventions(&names(&["Stress reduction", "Smoking cessation"]))
            .unwrap();
        let order: Vec<&str> = selected.iter().map(|iv| iv.name.as_str()).collect();
        assert_eq!(order, vec!["Smoking cessation", "Stress reduction"]);
    }

    #[test]
    fn test_unknown_intervention_is_error() {
        let err = Catalog::standard()
            .select_interventions(&names(&["Yoga"]))
            .unwrap_err();
        assert_eq!(err, RiskError::UnknownIntervention("Yoga".to_string()));
    }

    #[test]
    fn test_unknown_therapy_is_error() {
        assert_eq!(
            Catalog::standard().ldl_reduction("Ezetimibe").unwrap(),
            20.0
        );
        assert!(matches!(
            Catalog::standard().ldl_reduction("Niacin"),
            Err(RiskError::UnknownTherapy(_))
        ));
    }

    #[test]
    fn test_reject_negative_effect() {
        let result = Catalog::new(
            vec![InterventionEffect {
                name: "Harmful".to_string(),
                arr_lifetime: -2.0,
                arr_5yr: 1.0,
            }],
            vec![],
        );
        assert!(matches!(result, Err(RiskError::NegativeEffect { .. })));
    }

    #[test]
    fn test_reject_effect_over_100() {
        let result = Catalog::new(
            vec![],
            vec![LdlTherapyEffect {
                name: "Impossible".to_string(),
                percent_reduction: 120.0,
            }],
        );
        assert!(matches!(result, Err(RiskError::EffectOutOfRange { .. })));
    }

    #[test]
    fn test_reject_duplicate_names() {
        let tx = LdlTherapyEffect {
            name: "Ezetimibe".to_string(),
            percent_reduction: 20.0,
        };
        let result = Catalog::new(vec![], vec![tx.clone(), tx]);
        assert_eq!(
            result.unwrap_err(),
            RiskError::DuplicateCatalogEntry("Ezetimibe".to_string())
        );
    }

    #[test]
    fn test_extended_replaces_and_appends() {
        let extended = Catalog::standard()
            .extended(
                &[InterventionEffect {
                    name: "Smoking cessation".to_string(),
                    arr_lifetime: 15.0,
                    arr_5yr: 4.0,
                }],
                &[LdlTherapyEffect {
                    name: "Inclisiran".to_string(),
                    percent_reduction: 50.0,
                }],
            )
            .unwrap();

        assert_eq!(extended.interventions().len(), 11);
        assert_eq!(extended.interventions()[0].arr_lifetime, 15.0);
        assert_eq!(extended.ldl_reduction("Inclisiran").unwrap(), 50.0);
        // The shared catalog is untouched
        assert_eq!(Catalog::standard().interventions()[0].arr_lifetime, 17.0);
    }
}
