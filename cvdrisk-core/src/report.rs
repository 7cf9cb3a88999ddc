//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs
//! - Result fields map 1:1 into the export record

use crate::catalog::Catalog;
use crate::compose::RiskResult;
use crate::profile::{Horizon, InterventionSelection, PatientProfile, TherapyPlan};
use crate::risk::{round1, round2, BaselineRisk};
use serde::{Deserialize, Serialize};

/// Width of a 100% bar in the text chart
const CHART_WIDTH: usize = 50;

/// CSV header, in column order
const EXPORT_COLUMNS: &[&str] = &[
    "Age",
    "Sex",
    "Smoking",
    "Diabetes",
    "eGFR",
    "Vascular beds",
    "Total Chol",
    "HDL",
    "hsCRP",
    "HbA1c",
    "LDL baseline",
    "Pre-admission Tx",
    "Add-on Tx",
    "SBP current",
    "SBP target",
    "Other interventions",
    "Horizon",
    "Baseline risk (%)",
    "Final risk (%)",
    "ARR (pp)",
    "RRR (%)",
    "Expected LDL (mmol/L)",
];

/// Flat export row: raw inputs followed by results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExportRecord {
    pub age: u32,
    pub sex: String,
    pub smoking: bool,
    pub diabetes: bool,
    pub egfr: f64,
    pub vascular_beds: u8,
    pub total_cholesterol: f64,
    pub hdl_cholesterol: f64,
    pub crp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hba1c: Option<f64>,
    pub baseline_ldl: f64,
    pub pre_admission_therapies: Vec<String>,
    pub add_on_therapies: Vec<String>,
    pub sbp_current: f64,
    pub sbp_target: f64,
    pub interventions: Vec<String>,
    pub horizon: Horizon,
    pub baseline_risk: f64,
    pub final_risk: f64,
    pub absolute_risk_reduction: f64,
    pub relative_risk_reduction: f64,
    /// Two decimal places
    pub projected_ldl: f64,
}

impl ExportRecord {
    /// Build an export record from the inputs and the computed result
    pub fn new(
        profile: &PatientProfile,
        plan: &TherapyPlan,
        selection: &InterventionSelection,
        result: &RiskResult,
    ) -> Self {
        ExportRecord {
            age: profile.age,
            sex: profile.sex.as_str().to_string(),
            smoking: profile.is_smoker,
            diabetes: profile.has_diabetes,
            egfr: profile.egfr,
            vascular_beds: profile.vascular_bed_count,
            total_cholesterol: profile.total_cholesterol,
            hdl_cholesterol: profile.hdl_cholesterol,
            crp: profile.crp,
            hba1c: profile.hba1c,
            baseline_ldl: plan.baseline_ldl,
            pre_admission_therapies: plan.pre_admission.iter().cloned().collect(),
            add_on_therapies: plan.add_on.iter().cloned().collect(),
            sbp_current: profile.systolic_bp,
            sbp_target: plan.target_sbp,
            interventions: selection.interventions.iter().cloned().collect(),
            horizon: result.horizon,
            baseline_risk: result.baseline_risk,
            final_risk: result.final_risk,
            absolute_risk_reduction: result.absolute_risk_reduction,
            relative_risk_reduction: result.relative_risk_reduction,
            projected_ldl: round2(result.projected_ldl),
        }
    }

    /// Cell values in `EXPORT_COLUMNS` order
    fn csv_values(&self) -> Vec<String> {
        vec![
            self.age.to_string(),
            self.sex.clone(),
            self.smoking.to_string(),
            self.diabetes.to_string(),
            self.egfr.to_string(),
            self.vascular_beds.to_string(),
            self.total_cholesterol.to_string(),
            self.hdl_cholesterol.to_string(),
            self.crp.to_string(),
            self.hba1c.map(|v| v.to_string()).unwrap_or_default(),
            self.baseline_ldl.to_string(),
            self.pre_admission_therapies.join(";"),
            self.add_on_therapies.join(";"),
            self.sbp_current.to_string(),
            self.sbp_target.to_string(),
            self.interventions.join(";"),
            self.horizon.as_str().to_string(),
            self.baseline_risk.to_string(),
            self.final_risk.to_string(),
            self.absolute_risk_reduction.to_string(),
            self.relative_risk_reduction.to_string(),
            format!("{:.2}", self.projected_ldl),
        ]
    }
}

/// Render the results block followed by a before/after bar chart
pub fn render_text(result: &RiskResult) -> String {
    let mut output = String::new();
    let horizon = result.horizon.as_str();

    output.push_str("Results\n");
    output.push_str(&format!("Baseline {} risk: {}%\n", horizon, result.baseline_risk));
    output.push_str(&format!(
        "Post-intervention risk: {}% (ARR {} pp, RRR {}%)\n",
        result.final_risk, result.absolute_risk_reduction, result.relative_risk_reduction
    ));
    output.push_str(&format!(
        "Expected LDL-C: {:.2} mmol/L at 3 months following initiated lipid-lowering therapy\n",
        round2(result.projected_ldl)
    ));
    output.push('\n');
    output.push_str(&render_chart(result));

    output
}

/// Render a before/after bar chart of the risk
pub fn render_chart(result: &RiskResult) -> String {
    let mut output = format!("{} CVD risk (%)\n", result.horizon.as_str());
    for (label, value) in [
        ("Baseline", result.baseline_risk),
        ("After", result.final_risk),
    ] {
        output.push_str(&format!(
            "{:<9} |{:<width$}| {}\n",
            label,
            bar(value),
            value,
            width = CHART_WIDTH
        ));
    }
    output
}

fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * CHART_WIDTH as f64).round() as usize;
    "#".repeat(filled)
}

/// Render a plain-language summary for patients
pub fn render_patient_text(result: &RiskResult) -> String {
    let period = match result.horizon {
        Horizon::FiveYear => "in the next 5 years",
        Horizon::TenYear => "in the next 10 years",
        Horizon::Lifetime => "over their lifetime",
    };
    let before = result.baseline_risk.round() as i64;
    let after = result.final_risk.round() as i64;

    let mut output = format!(
        "Out of 100 people like you, about {} would have a heart attack or stroke {}.\n",
        before, period
    );
    if result.absolute_risk_reduction > 0.0 {
        output.push_str(&format!(
            "With the planned treatment, this falls to about {} out of 100.\n",
            after
        ));
        output.push_str(&format!(
            "That means about {} fewer people out of 100 would have an event.\n",
            before - after
        ));
    } else {
        output.push_str("The selected treatments do not change this estimate.\n");
    }
    output.push_str(&format!(
        "Your cholesterol (LDL-C) is expected to be about {:.1} mmol/L.\n",
        round1(result.projected_ldl)
    ));
    output
}

/// Render how the baseline and the final risk were reached
pub fn render_explain(baseline: &BaselineRisk, result: &RiskResult) -> String {
    let mut output = String::new();

    output.push_str("Linear predictor\n");
    for (name, value) in baseline.linear_predictor.terms() {
        output.push_str(&format!("  {:<18} {:>8.4}\n", name, value));
    }
    output.push_str(&format!(
        "  {:<18} {:>8.4}\n",
        "total",
        baseline.linear_predictor.total()
    ));
    output.push_str(&format!(
        "Ten-year risk: {}%  Five-year risk: {}%\n",
        baseline.ten_year, baseline.five_year
    ));
    output.push_str(&format!(
        "Baseline {} risk (capped): {}%\n",
        baseline.horizon.as_str(),
        baseline.capped
    ));

    output.push_str("\nDiscounts applied\n");
    if result.discounts.is_empty() {
        output.push_str("  none\n");
    }
    for discount in &result.discounts {
        output.push_str(&format!(
            "  {:<40} -{:.1}% (x{:.3})\n",
            discount.name,
            discount.reduction,
            discount.factor()
        ));
    }

    output
}

/// Render the export record as JSON
pub fn render_json(record: &ExportRecord) -> String {
    serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
}

/// Render the export record as a CSV header and a single row
pub fn render_csv(record: &ExportRecord) -> String {
    let header: Vec<String> = EXPORT_COLUMNS.iter().map(|c| csv_field(c)).collect();
    let row: Vec<String> = record.csv_values().iter().map(|v| csv_field(v)).collect();
    format!("{}\n{}\n", header.join(","), row.join(","))
}

/// Quote a CSV field when it contains a delimiter, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render the catalog as two text tables
pub fn render_catalog_text(catalog: &Catalog) -> String {
    let mut output = String::new();

    output.push_str(&format!("{:<40} {:>10} {:>8}\n", "INTERVENTION", "LIFETIME", "5YR"));
    for iv in catalog.interventions() {
        output.push_str(&format!(
            "{:<40} {:>10} {:>8}\n",
            iv.name, iv.arr_lifetime, iv.arr_5yr
        ));
    }

    output.push('\n');
    output.push_str(&format!("{:<40} {:>10}\n", "LDL THERAPY", "REDUCTION"));
    for tx in catalog.ldl_therapies() {
        output.push_str(&format!("{:<40} {:>9}%\n", tx.name, tx.percent_reduction));
    }

    output
}

/// Render the catalog as JSON
pub fn render_catalog_json(catalog: &Catalog) -> String {
    serde_json::to_string_pretty(catalog).unwrap_or_else(|_| "{}".to_string())
}
