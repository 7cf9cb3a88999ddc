//! Configuration file support for cvdrisk
//!
//! Loads calculator configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.cvdriskrc.json` in the working directory
//! 3. `cvdrisk.config.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::catalog::{Catalog, InterventionEffect, LdlTherapyEffect};
use crate::compose::EffectModel;
use crate::ldl::LdlModel;
use crate::profile::Horizon;
use crate::risk::{BaselineCaps, RiskCoefficients};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Config file names checked during discovery, in priority order
const CONFIG_FILE_NAMES: &[&str] = &[".cvdriskrc.json", "cvdrisk.config.json"];

/// Calculator configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CvdConfig {
    /// Horizon-specific baseline ceilings
    #[serde(default)]
    pub caps: Option<CapConfig>,

    /// LDL and blood-pressure effect sizes, RRR ceiling
    #[serde(default)]
    pub effects: Option<EffectConfig>,

    /// LDL projection parameters
    #[serde(default)]
    pub ldl: Option<LdlConfig>,

    /// Interventions added to (or replacing entries of) the built-in catalog
    #[serde(default)]
    pub interventions: Vec<InterventionEffect>,

    /// LDL therapies added to (or replacing entries of) the built-in catalog
    #[serde(default)]
    pub ldl_therapies: Vec<LdlTherapyEffect>,

    /// Default horizon when none is given on the command line
    #[serde(default)]
    pub horizon: Option<Horizon>,
}

/// Custom baseline ceilings (percent)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapConfig {
    /// Five-year ceiling (default: 80)
    pub five_year: Option<f64>,
    /// Ten-year ceiling (default: 85)
    pub ten_year: Option<f64>,
    /// Lifetime ceiling (default: 90)
    pub lifetime: Option<f64>,
}

/// Custom effect sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectConfig {
    /// RRR per mmol/L of LDL-C lowered (default: 22)
    pub ldl_rrr_per_mmol: Option<f64>,
    /// Maximum LDL RRR (default: 35)
    pub ldl_rrr_max: Option<f64>,
    /// RRR per 10 mmHg of SBP lowered (default: 15)
    pub bp_rrr_per_10mmhg: Option<f64>,
    /// Maximum BP RRR (default: 20)
    pub bp_rrr_max: Option<f64>,
    /// Ceiling on the reported RRR (default: 75)
    pub rrr_ceiling: Option<f64>,
}

/// Custom LDL projection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LdlConfig {
    /// LDL-C floor in mmol/L (default: 1.0)
    pub floor: Option<f64>,
    /// Fraction of nominal effect for add-on therapy (default: 0.5)
    pub add_on_factor: Option<f64>,
}

/// Resolved configuration ready for use
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub caps: BaselineCaps,
    pub effects: EffectModel,
    pub ldl: LdlModel,
    pub coefficients: RiskCoefficients,
    /// Shared built-in catalog unless the config adds entries
    pub catalog: Cow<'static, Catalog>,
    pub horizon: Option<Horizon>,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl CvdConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref c) = self.caps {
            for (name, val) in [
                ("five_year", c.five_year),
                ("ten_year", c.ten_year),
                ("lifetime", c.lifetime),
            ] {
                if let Some(v) = val {
                    if v.is_nan() || v <= 0.0 || v > 100.0 {
                        anyhow::bail!("caps.{} must be within (0, 100] (got {})", name, v);
                    }
                }
            }
        }

        if let Some(ref e) = self.effects {
            for (name, val) in [
                ("ldl_rrr_per_mmol", e.ldl_rrr_per_mmol),
                ("ldl_rrr_max", e.ldl_rrr_max),
                ("bp_rrr_per_10mmhg", e.bp_rrr_per_10mmhg),
                ("bp_rrr_max", e.bp_rrr_max),
                ("rrr_ceiling", e.rrr_ceiling),
            ] {
                if let Some(v) = val {
                    if !(0.0..=100.0).contains(&v) {
                        anyhow::bail!("effects.{} must be within [0, 100] (got {})", name, v);
                    }
                }
            }
        }

        if let Some(ref l) = self.ldl {
            if let Some(floor) = l.floor {
                if !floor.is_finite() || floor < 0.0 {
                    anyhow::bail!("ldl.floor must be non-negative (got {})", floor);
                }
            }
            if let Some(factor) = l.add_on_factor {
                if !(0.0..=1.0).contains(&factor) {
                    anyhow::bail!("ldl.add_on_factor must be within [0, 1] (got {})", factor);
                }
            }
        }

        // Catalog entries must merge into a valid catalog
        Catalog::standard()
            .extended(&self.interventions, &self.ldl_therapies)
            .context("invalid catalog entries")?;

        Ok(())
    }

    /// Resolve config into a form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let defaults = BaselineCaps::default();
        let caps = match &self.caps {
            Some(c) => BaselineCaps {
                five_year: c.five_year.unwrap_or(defaults.five_year),
                ten_year: c.ten_year.unwrap_or(defaults.ten_year),
                lifetime: c.lifetime.unwrap_or(defaults.lifetime),
            },
            None => defaults,
        };

        let defaults = EffectModel::default();
        let effects = match &self.effects {
            Some(e) => EffectModel {
                ldl_rrr_per_mmol: e.ldl_rrr_per_mmol.unwrap_or(defaults.ldl_rrr_per_mmol),
                ldl_rrr_max: e.ldl_rrr_max.unwrap_or(defaults.ldl_rrr_max),
                bp_rrr_per_10mmhg: e.bp_rrr_per_10mmhg.unwrap_or(defaults.bp_rrr_per_10mmhg),
                bp_rrr_max: e.bp_rrr_max.unwrap_or(defaults.bp_rrr_max),
                rrr_ceiling: e.rrr_ceiling.unwrap_or(defaults.rrr_ceiling),
            },
            None => defaults,
        };

        let defaults = LdlModel::default();
        let ldl = match &self.ldl {
            Some(l) => LdlModel {
                floor: l.floor.unwrap_or(defaults.floor),
                add_on_factor: l.add_on_factor.unwrap_or(defaults.add_on_factor),
            },
            None => defaults,
        };

        let catalog = if self.interventions.is_empty() && self.ldl_therapies.is_empty() {
            Cow::Borrowed(Catalog::standard())
        } else {
            let base = Catalog::standard();
            Cow::Owned(base.extended(&self.interventions, &self.ldl_therapies)?)
        };

        Ok(ResolvedConfig {
            caps,
            effects,
            ldl,
            coefficients: RiskCoefficients::default(),
            catalog,
            horizon: self.horizon,
            config_path: None,
        })
    }
}

impl Default for ResolvedConfig {
    /// Built-in models and the shared catalog (no config file)
    fn default() -> Self {
        ResolvedConfig {
            caps: BaselineCaps::default(),
            effects: EffectModel::default(),
            ldl: LdlModel::default(),
            coefficients: RiskCoefficients::default(),
            catalog: Cow::Borrowed(Catalog::standard()),
            horizon: None,
            config_path: None,
        }
    }
}

/// Discover a config file in the project root
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(CvdConfig, PathBuf)>> {
    for name in CONFIG_FILE_NAMES {
        let path = project_root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<CvdConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: CvdConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (CvdConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}
