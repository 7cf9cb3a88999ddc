//! Integration tests for end-to-end risk computation against scenario files

use cvdrisk_core::config::CvdConfig;
use cvdrisk_core::scenario::load_scenario;
use cvdrisk_core::validation::validate_inputs;
use cvdrisk_core::{
    assess, compute_risk, compute_risk_with_config, render_csv, render_json, ExportRecord,
    Horizon, ResolvedConfig, RiskError, Scenario,
};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join("scenarios")
        .join(name)
}

fn fixture(name: &str) -> Scenario {
    load_scenario(&fixture_path(name), Horizon::default()).unwrap()
}

#[test]
fn test_reference_patient_without_treatment() {
    let s = fixture("reference_no_treatment.json");
    validate_inputs(&s.profile, &s.therapy).unwrap();

    let assessment = assess(
        &s.profile,
        &s.therapy,
        &s.selection,
        &ResolvedConfig::default(),
    )
    .unwrap();

    let lp = assessment.baseline.linear_predictor.total();
    assert!((lp - 6.754653).abs() < 1e-5);
    assert_eq!(assessment.baseline.ten_year, 23.9);
    assert_eq!(assessment.baseline.five_year, 12.8);

    let result = assessment.result;
    assert_eq!(result.horizon, Horizon::TenYear);
    assert_eq!(result.baseline_risk, 23.9);
    assert_eq!(result.final_risk, 23.9);
    assert_eq!(result.absolute_risk_reduction, 0.0);
    assert_eq!(result.relative_risk_reduction, 0.0);
    assert_eq!(result.projected_ldl, 3.5);
    assert!(result.discounts.is_empty());
}

#[test]
fn test_reference_patient_full_plan_ten_year() {
    let s = fixture("reference_full_plan.json");
    validate_inputs(&s.profile, &s.therapy).unwrap();

    let result = compute_risk(&s.profile, &s.therapy, &s.selection).unwrap();

    assert_eq!(result.baseline_risk, 23.9);
    assert_eq!(result.final_risk, 10.3);
    assert_eq!(result.absolute_risk_reduction, 13.6);
    assert_eq!(result.relative_risk_reduction, 56.9);
    assert!((result.projected_ldl - 1.575).abs() < 1e-9);

    // Catalog interventions in catalog order, then LDL, then BP
    let names: Vec<&str> = result.discounts.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names.len(), 4);
    assert_eq!(names[0], "Mediterranean diet");
    assert_eq!(names[1], "Physical activity");
    assert_eq!(result.discounts[2].reduction, 35.0);
    assert_eq!(result.discounts[3].reduction, 20.0);
}

#[test]
fn test_reference_patient_full_plan_five_year() {
    let mut s = fixture("reference_full_plan.json");
    s.selection.horizon = Horizon::FiveYear;

    let result = compute_risk(&s.profile, &s.therapy, &s.selection).unwrap();

    assert_eq!(result.baseline_risk, 12.8);
    assert_eq!(result.final_risk, 6.3);
    assert_eq!(result.absolute_risk_reduction, 6.5);
    assert_eq!(result.relative_risk_reduction, 50.8);
    assert_eq!(result.discounts[0].reduction, 3.0);
}

#[test]
fn test_high_risk_patient_is_capped() {
    let s = fixture("high_risk_lifetime.json");
    validate_inputs(&s.profile, &s.therapy).unwrap();

    let assessment = assess(
        &s.profile,
        &s.therapy,
        &s.selection,
        &ResolvedConfig::default(),
    )
    .unwrap();

    assert_eq!(assessment.baseline.ten_year, 100.0);
    assert_eq!(assessment.baseline.five_year, 100.0);
    assert_eq!(assessment.baseline.capped, 90.0);

    let result = assessment.result;
    assert_eq!(result.horizon, Horizon::Lifetime);
    assert_eq!(result.baseline_risk, 90.0);
    assert!((result.projected_ldl - 1.89).abs() < 1e-9);
    assert_eq!(result.final_risk, 36.5);
    assert_eq!(result.absolute_risk_reduction, 53.5);
    assert_eq!(result.relative_risk_reduction, 59.4);
}

#[test]
fn test_high_risk_caps_per_horizon() {
    let mut s = fixture("high_risk_lifetime.json");
    s.selection.interventions.clear();
    s.therapy.pre_admission.clear();
    s.therapy.target_sbp = s.profile.systolic_bp;

    for (horizon, cap) in [
        (Horizon::FiveYear, 80.0),
        (Horizon::TenYear, 85.0),
        (Horizon::Lifetime, 90.0),
    ] {
        s.selection.horizon = horizon;
        let result = compute_risk(&s.profile, &s.therapy, &s.selection).unwrap();
        assert_eq!(result.baseline_risk, cap);
        assert_eq!(result.final_risk, cap);
    }
}

#[test]
fn test_low_risk_patient_without_crp() {
    let s = fixture("low_risk_no_crp.json");
    validate_inputs(&s.profile, &s.therapy).unwrap();

    let assessment = assess(
        &s.profile,
        &s.therapy,
        &s.selection,
        &ResolvedConfig::default(),
    )
    .unwrap();

    assert_eq!(assessment.baseline.linear_predictor.crp, 0.0);
    assert_eq!(assessment.baseline.ten_year, 1.7);
    assert_eq!(assessment.baseline.five_year, 0.9);
    assert_eq!(assessment.result.baseline_risk, 0.9);
    let result = assessment.result;
    assert!(result.final_risk <= result.baseline_risk);
}

#[test]
fn test_scenario_without_horizon_takes_default() {
    let path = fixture_path("overlapping_therapy.json");
    let s = load_scenario(&path, Horizon::Lifetime).unwrap();
    assert_eq!(s.selection.horizon, Horizon::Lifetime);

    // An explicit horizon in the file is kept
    let s = load_scenario(&fixture_path("low_risk_no_crp.json"), Horizon::Lifetime).unwrap();
    assert_eq!(s.selection.horizon, Horizon::FiveYear);
}

#[test]
fn test_overlapping_therapy_rejected() {
    let s = fixture("overlapping_therapy.json");
    let err = compute_risk(&s.profile, &s.therapy, &s.selection).unwrap_err();
    assert_eq!(err, RiskError::TherapyOverlap("Ezetimibe".to_string()));
}

#[test]
fn test_config_changes_caps_and_catalog() {
    let s = fixture("high_risk_lifetime.json");
    let config: CvdConfig = serde_json::from_str(
        r#"{
            "caps": { "lifetime": 70 },
            "interventions": [
                { "name": "Smoking cessation", "arr_lifetime": 0, "arr_5yr": 0 }
            ]
        }"#,
    )
    .unwrap();
    let resolved = config.resolve().unwrap();

    let result = compute_risk_with_config(&s.profile, &s.therapy, &s.selection, &resolved).unwrap();
    assert_eq!(result.baseline_risk, 70.0);
    assert_eq!(result.discounts[0].name, "Smoking cessation");
    assert_eq!(result.discounts[0].reduction, 0.0);
}

#[test]
fn test_export_record_matches_result() {
    let s = fixture("reference_full_plan.json");
    let result = compute_risk(&s.profile, &s.therapy, &s.selection).unwrap();
    let record = ExportRecord::new(&s.profile, &s.therapy, &s.selection, &result);

    assert_eq!(record.final_risk, result.final_risk);
    assert_eq!(record.projected_ldl, 1.58);
    assert_eq!(record.hba1c, Some(6.1));

    let json: serde_json::Value = serde_json::from_str(&render_json(&record)).unwrap();
    assert_eq!(json["horizon"], "ten_year");
    assert_eq!(json["final_risk"], 10.3);

    let csv = render_csv(&record);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Age,Sex,Smoking"));
    assert!(lines[1].starts_with("60,Male,false,false,80,0,5,1,2,6.1,3.5,"));
    assert!(lines[1].ends_with(",10yr,23.9,10.3,13.6,56.9,1.58"));
}

#[test]
fn test_rendering_is_deterministic() {
    let s = fixture("reference_full_plan.json");
    let first = compute_risk(&s.profile, &s.therapy, &s.selection).unwrap();
    let second = compute_risk(&s.profile, &s.therapy, &s.selection).unwrap();

    let record = |result| ExportRecord::new(&s.profile, &s.therapy, &s.selection, result);
    let a = render_json(&record(&first));
    let b = render_json(&record(&second));
    assert_eq!(a, b);
}
