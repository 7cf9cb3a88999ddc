//! Error taxonomy for risk computation

/// Errors raised by the computation core and its catalogs
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskError {
    #[error("{field} out of range: {value} (expected {min}..={max})")]
    InvalidRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("hs-CRP must be greater than -1 mg/L (got {0})")]
    CrpDomain(f64),
    #[error("unknown intervention: {0}")]
    UnknownIntervention(String),
    #[error("unknown lipid-lowering therapy: {0}")]
    UnknownTherapy(String),
    #[error("therapy listed as both pre-admission and add-on: {0}")]
    TherapyOverlap(String),
    #[error("catalog entry {name} has negative effect size {value}")]
    NegativeEffect { name: String, value: f64 },
    #[error("catalog entry {name} has effect size {value} above 100%")]
    EffectOutOfRange { name: String, value: f64 },
    #[error("duplicate catalog entry: {0}")]
    DuplicateCatalogEntry(String),
}

pub type CoreResult<T> = std::result::Result<T, RiskError>;
