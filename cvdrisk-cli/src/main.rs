//! cvdrisk CLI - cardiovascular risk and risk-reduction calculator

#![deny(warnings)]

// Global invariants enforced:
// - Inputs are range-checked before they reach the computation core
// - Identical input yields byte-for-byte identical output
// - Diagnostics go to stderr; stdout carries only the report

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use cvdrisk_core::config::{self, ResolvedConfig};
use cvdrisk_core::profile::VascularBed;
use cvdrisk_core::report::{
    render_catalog_json, render_catalog_text, render_explain, render_patient_text,
};
use cvdrisk_core::scenario::{load_scenario, Scenario};
use cvdrisk_core::validation::validate_inputs;
use cvdrisk_core::{
    assess, render_csv, render_json, render_text, ExportRecord, Horizon, InterventionSelection,
    PatientProfile, Sex, TherapyPlan,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cvdrisk")]
#[command(about = "Cardiovascular risk estimation and projected risk reduction")]
#[command(version = env!("CVDRISK_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute baseline and post-intervention risk for one patient
    Calc {
        /// Scenario file with profile, therapy and selection (JSON)
        #[arg(long)]
        scenario: Option<PathBuf>,

        #[command(flatten)]
        patient: PatientArgs,

        /// Projection horizon (overrides scenario and config file)
        #[arg(long)]
        horizon: Option<HorizonArg>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Show the linear predictor and every discount applied (text only)
        #[arg(long)]
        explain: bool,

        /// Plain-language summary for patients (text only)
        #[arg(long)]
        patient_view: bool,

        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List interventions and LDL-C therapies of the effective catalog
    Catalog {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate or show the configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without computing anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

/// Patient inputs given as flags instead of a scenario file
#[derive(Args)]
struct PatientArgs {
    /// Age in years (30-90)
    #[arg(long)]
    age: Option<u32>,

    #[arg(long)]
    sex: Option<SexArg>,

    /// Current systolic blood pressure (mmHg)
    #[arg(long)]
    sbp: Option<f64>,

    /// Total cholesterol (mmol/L)
    #[arg(long)]
    total_chol: Option<f64>,

    /// HDL cholesterol (mmol/L)
    #[arg(long)]
    hdl: Option<f64>,

    #[arg(long)]
    smoker: bool,

    #[arg(long)]
    diabetes: bool,

    /// eGFR (mL/min/1.73m²)
    #[arg(long)]
    egfr: Option<f64>,

    /// hs-CRP (mg/L); omit when not measured
    #[arg(long)]
    crp: Option<f64>,

    /// Affected vascular territory (repeatable)
    #[arg(long = "vascular-bed")]
    vascular_beds: Vec<BedArg>,

    /// Latest HbA1c (%), recorded in exports only
    #[arg(long)]
    hba1c: Option<f64>,

    /// Pre-admission LDL-C (mmol/L)
    #[arg(long)]
    ldl: Option<f64>,

    /// Lipid-lowering therapy taken before admission (repeatable)
    #[arg(long = "pre-admission")]
    pre_admission: Vec<String>,

    /// Lipid-lowering therapy added now (repeatable)
    #[arg(long = "add-on")]
    add_on: Vec<String>,

    /// Target systolic blood pressure (mmHg, default: current)
    #[arg(long)]
    target_sbp: Option<f64>,

    /// Catalog intervention to apply (repeatable)
    #[arg(long = "intervention")]
    interventions: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum HorizonArg {
    #[value(name = "5yr")]
    FiveYear,
    #[value(name = "10yr")]
    TenYear,
    Lifetime,
}

impl From<HorizonArg> for Horizon {
    fn from(arg: HorizonArg) -> Self {
        match arg {
            HorizonArg::FiveYear => Horizon::FiveYear,
            HorizonArg::TenYear => Horizon::TenYear,
            HorizonArg::Lifetime => Horizon::Lifetime,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SexArg {
    Male,
    Female,
}

impl From<SexArg> for Sex {
    fn from(arg: SexArg) -> Self {
        match arg {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum BedArg {
    Coronary,
    Cerebrovascular,
    Peripheral,
}

impl From<BedArg> for VascularBed {
    fn from(arg: BedArg) -> Self {
        match arg {
            BedArg::Coronary => VascularBed::Coronary,
            BedArg::Cerebrovascular => VascularBed::Cerebrovascular,
            BedArg::Peripheral => VascularBed::Peripheral,
        }
    }
}

impl PatientArgs {
    fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.sex.is_none()
            && self.sbp.is_none()
            && self.total_chol.is_none()
            && self.hdl.is_none()
            && !self.smoker
            && !self.diabetes
            && self.egfr.is_none()
            && self.crp.is_none()
            && self.vascular_beds.is_empty()
            && self.hba1c.is_none()
            && self.ldl.is_none()
            && self.pre_admission.is_empty()
            && self.add_on.is_empty()
            && self.target_sbp.is_none()
            && self.interventions.is_empty()
    }

    /// Build the calculator inputs; every measurement without a default is required
    fn into_scenario(self, horizon: Horizon) -> anyhow::Result<Scenario> {
        let sbp = required(self.sbp, "--sbp")?;
        let beds: Vec<VascularBed> = self.vascular_beds.into_iter().map(Into::into).collect();

        let profile = PatientProfile {
            age: required(self.age, "--age")?,
            sex: required(self.sex, "--sex")?.into(),
            systolic_bp: sbp,
            total_cholesterol: required(self.total_chol, "--total-chol")?,
            hdl_cholesterol: required(self.hdl, "--hdl")?,
            is_smoker: self.smoker,
            has_diabetes: self.diabetes,
            egfr: required(self.egfr, "--egfr")?,
            crp: self.crp.unwrap_or(0.0),
            vascular_bed_count: VascularBed::count_distinct(&beds),
            hba1c: self.hba1c,
        };
        let therapy = TherapyPlan {
            baseline_ldl: required(self.ldl, "--ldl")?,
            pre_admission: self.pre_admission.into_iter().collect(),
            add_on: self.add_on.into_iter().collect(),
            target_sbp: self.target_sbp.unwrap_or(sbp),
        };
        let selection = InterventionSelection {
            interventions: self.interventions.into_iter().collect(),
            horizon,
        };

        Ok(Scenario {
            profile,
            therapy,
            selection,
        })
    }
}

fn required<T>(value: Option<T>, flag: &str) -> anyhow::Result<T> {
    value.ok_or_else(|| anyhow::anyhow!("{} is required when --scenario is not given", flag))
}

/// Filter used when `RUST_LOG` is unset, empty or unparseable
const DEFAULT_LOG_FILTER: &str = "cvdrisk=warn";

fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> anyhow::Result<()> {
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Calc {
            scenario,
            patient,
            horizon,
            format,
            config: config_path,
            explain,
            patient_view,
            output,
        } => {
            if scenario.is_some() && !patient.is_empty() {
                anyhow::bail!("--scenario cannot be combined with patient flags");
            }
            if patient_view && format != OutputFormat::Text {
                anyhow::bail!("--patient-view is only valid with --format text");
            }
            if explain && format != OutputFormat::Text {
                anyhow::bail!("--explain is only valid with --format text");
            }

            let resolved_config = load_config(config_path.as_deref())?;
            let default_horizon = resolved_config.horizon.unwrap_or_default();

            let mut inputs = match scenario {
                Some(path) => load_scenario(&path, default_horizon)?,
                None => patient.into_scenario(default_horizon)?,
            };
            if let Some(h) = horizon {
                inputs.selection.horizon = h.into();
            }

            let report = run_calc(&inputs, &resolved_config, format, explain, patient_view)?;
            emit(&report, output.as_deref())?;
        }
        Commands::Catalog {
            format,
            config: config_path,
        } => {
            let resolved_config = load_config(config_path.as_deref())?;
            let catalog = &resolved_config.catalog;
            let rendered = match format {
                OutputFormat::Text => render_catalog_text(catalog),
                OutputFormat::Json => format!("{}\n", render_catalog_json(catalog)),
                OutputFormat::Csv => anyhow::bail!("CSV format is not supported for the catalog"),
            };
            print!("{}", rendered);
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let resolved = load_config(path.as_deref())?;
                print!("{}", render_config(&resolved));
            }
        },
    }

    Ok(())
}

fn load_config(config_path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let project_root = std::env::current_dir()?;
    let resolved = config::load_and_resolve(&project_root, config_path)
        .context("failed to load configuration")?;

    if let Some(path) = &resolved.config_path {
        tracing::info!(path = %path.display(), "using config");
    }
    Ok(resolved)
}

/// Validate, compute and render one scenario
fn run_calc(
    inputs: &Scenario,
    config: &ResolvedConfig,
    format: OutputFormat,
    explain: bool,
    patient_view: bool,
) -> anyhow::Result<String> {
    let Scenario {
        profile,
        therapy,
        selection,
    } = inputs;
    validate_inputs(profile, therapy).context("invalid input")?;

    let assessment =
        assess(profile, therapy, selection, config).context("risk computation failed")?;
    let result = &assessment.result;

    let rendered = match format {
        OutputFormat::Text => {
            let mut text = if patient_view {
                render_patient_text(result)
            } else {
                render_text(result)
            };
            if explain {
                text.push('\n');
                text.push_str(&render_explain(&assessment.baseline, result));
            }
            text
        }
        OutputFormat::Json => {
            let record = ExportRecord::new(profile, therapy, selection, result);
            format!("{}\n", render_json(&record))
        }
        OutputFormat::Csv => render_csv(&ExportRecord::new(profile, therapy, selection, result)),
    };

    Ok(rendered)
}

fn render_config(resolved: &ResolvedConfig) -> String {
    let mut out = String::from("Configuration:\n");
    match &resolved.config_path {
        Some(p) => out.push_str(&format!("  Source: {}\n", p.display())),
        None => out.push_str("  Source: defaults (no config file found)\n"),
    }

    out.push_str("\nBaseline caps (%):\n");
    out.push_str(&format!("  five_year: {}\n", resolved.caps.five_year));
    out.push_str(&format!("  ten_year: {}\n", resolved.caps.ten_year));
    out.push_str(&format!("  lifetime: {}\n", resolved.caps.lifetime));

    let effects = &resolved.effects;
    out.push_str("\nEffects:\n");
    out.push_str(&format!("  ldl_rrr_per_mmol: {}\n", effects.ldl_rrr_per_mmol));
    out.push_str(&format!("  ldl_rrr_max: {}\n", effects.ldl_rrr_max));
    out.push_str(&format!("  bp_rrr_per_10mmhg: {}\n", effects.bp_rrr_per_10mmhg));
    out.push_str(&format!("  bp_rrr_max: {}\n", effects.bp_rrr_max));
    out.push_str(&format!("  rrr_ceiling: {}\n", effects.rrr_ceiling));

    out.push_str("\nLDL-C projection:\n");
    out.push_str(&format!("  floor: {}\n", resolved.ldl.floor));
    out.push_str(&format!("  add_on_factor: {}\n", resolved.ldl.add_on_factor));

    out.push_str("\nCatalog:\n");
    out.push_str(&format!(
        "  interventions: {}\n",
        resolved.catalog.interventions().len()
    ));
    out.push_str(&format!(
        "  ldl_therapies: {}\n",
        resolved.catalog.ldl_therapies().len()
    ));
    out.push_str(&format!(
        "  default horizon: {}\n",
        resolved.horizon.unwrap_or_default().as_str()
    ));
    out
}

/// Print the report, or write it to `output` (temp + rename)
fn emit(report: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = output else {
        print!("{}", report);
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, report)
        .with_context(|| format!("failed to write temporary file: {}", temp_path.display()))?;
    std::fs::rename(&temp_path, path)
        .with_context(|| format!("failed to rename temporary file to: {}", path.display()))?;

    tracing::info!(path = %path.display(), "report written");
    Ok(())
}
