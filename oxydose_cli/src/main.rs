use clap::{Parser, Subcommand};
use oxydose_core::body_metrics::BmiCategory;
use oxydose_core::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxydose")]
#[command(about = "Post-operative opioid dose recommendation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the reference catalog (TOML)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Log calculation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a recommended dose
    Calc {
        /// Procedure id (see `oxydose procedures`)
        #[arg(long)]
        procedure: String,

        /// Age in years
        #[arg(long)]
        age: f64,

        /// Biological sex (male, female)
        #[arg(long)]
        sex: Sex,

        /// Weight in kg
        #[arg(long)]
        weight: f64,

        /// Height in cm
        #[arg(long)]
        height: f64,

        /// ASA physical status class (1-5)
        #[arg(long)]
        asa: u8,

        #[arg(long)]
        opioid_tolerant: bool,

        /// Impaired renal function (GFR < 35)
        #[arg(long)]
        renal_impairment: bool,

        /// Administered adjuvant id (repeatable)
        #[arg(long = "adjuvant")]
        adjuvants: Vec<String>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List procedures in the catalog
    Procedures {
        /// Only show this specialty
        #[arg(long)]
        specialty: Option<String>,
    },

    /// List adjuvants in the catalog
    Adjuvants,

    /// Validate the active catalog
    CheckCatalog,

    /// Write a config file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Everything `calc --json` prints
#[derive(Serialize)]
struct Report<'a> {
    procedure_id: &'a str,
    adjuvant_ids: &'a BTreeSet<String>,
    result: &'a CalculationResult,
    bmi_category: BmiCategory,
    alerts: &'a [SafetyAlert],
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        oxydose_core::logging::init_with_level("debug");
    } else {
        oxydose_core::logging::init();
    }

    let config_path = cli.config.as_ref();
    let catalog_path = cli.catalog.as_ref();

    match cli.command {
        Commands::Calc {
            procedure,
            age,
            sex,
            weight,
            height,
            asa,
            opioid_tolerant,
            renal_impairment,
            adjuvants,
            json,
        } => {
            let request = DoseRequest {
                patient: Patient {
                    age,
                    sex,
                    weight_kg: weight,
                    height_cm: height,
                    asa,
                    opioid_tolerant,
                    impaired_renal_function: renal_impairment,
                },
                procedure_id: procedure,
                adjuvant_ids: adjuvants.into_iter().collect(),
            };
            let config = load_config(config_path)?;
            let catalog = load_catalog(catalog_path, &config)?;
            cmd_calc(&catalog, &config, &request, json)
        }
        Commands::Procedures { specialty } => {
            let config = load_config(config_path)?;
            let catalog = load_catalog(catalog_path, &config)?;
            cmd_procedures(&catalog, specialty.as_deref());
            Ok(())
        }
        Commands::Adjuvants => {
            let config = load_config(config_path)?;
            let catalog = load_catalog(catalog_path, &config)?;
            cmd_adjuvants(&catalog);
            Ok(())
        }
        Commands::CheckCatalog => {
            let config = load_config(config_path)?;
            let catalog = load_catalog(catalog_path, &config)?;
            println!(
                "✓ Catalog OK ({} procedures, {} adjuvants)",
                catalog.procedures.len(),
                catalog.adjuvants.len()
            );
            Ok(())
        }
        // The config file may not exist yet, so it is not loaded here
        Commands::InitConfig { force } => cmd_init_config(cli.config.clone(), force),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Catalog from --catalog, then the config file, then the built-in default
fn load_catalog(override_path: Option<&PathBuf>, config: &Config) -> Result<Catalog> {
    let path = override_path.or(config.catalog.path.as_ref());

    let catalog = match path {
        Some(path) => Catalog::load_from(path),
        None => {
            tracing::debug!("Using built-in catalog");
            Ok(get_default_catalog().clone())
        }
    };

    if let Err(Error::CatalogValidation(ref message)) = catalog {
        eprintln!("Catalog validation errors:");
        for error in message.split("; ") {
            eprintln!("  - {}", error);
        }
    }
    catalog
}

fn cmd_calc(catalog: &Catalog, config: &Config, request: &DoseRequest, json: bool) -> Result<()> {
    let resolved = match resolve_request(catalog, request, &config.limits) {
        Ok(resolved) => resolved,
        Err(Error::Validation(errors)) => {
            eprintln!("Invalid patient data:");
            for error in &errors {
                eprintln!("  - {}", error);
            }
            return Err(Error::Validation(errors));
        }
        Err(e) => return Err(e),
    };

    let engine = DoseEngine::new(catalog).with_config(config.engine.clone());
    let result = engine.calculate_dose(
        &resolved.patient,
        resolved.procedure,
        &resolved.adjuvant_ids,
    );
    result.ensure_finite()?;

    let alerts = assess(
        &resolved.patient,
        &result,
        &resolved.adjuvants,
        &config.safety,
    );

    if json {
        let report = Report {
            procedure_id: &resolved.procedure.id,
            adjuvant_ids: &resolved.adjuvant_ids,
            result: &result,
            bmi_category: BmiCategory::from_bmi(result.bmi),
            alerts: &alerts,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_result(&resolved, &result, &alerts);
    }

    Ok(())
}

fn cmd_procedures(catalog: &Catalog, specialty: Option<&str>) {
    let procedures: Vec<&Procedure> = match specialty {
        Some(s) => catalog.procedures_by_specialty(s).collect(),
        None => catalog.procedures.iter().collect(),
    };

    if procedures.is_empty() {
        println!("No procedures found.");
        return;
    }

    for p in procedures {
        println!(
            "{:<20} {:<32} {:<16} {:>5.1} MME  (S{} V{} N{})",
            p.id,
            p.name,
            p.specialty,
            p.base_mme,
            p.pain_profile.somatic,
            p.pain_profile.visceral,
            p.pain_profile.neuropathic
        );
    }
}

fn cmd_adjuvants(catalog: &Catalog) {
    for a in &catalog.adjuvants {
        let input = match &a.modality {
            InputModality::Checkbox => "checkbox".to_string(),
            InputModality::Number { unit } => format!("number ({})", unit),
            InputModality::Select { options } => format!("select ({})", options.join("/")),
        };
        println!(
            "{:<14} {:<28} {:>4.0}%  {}",
            a.id,
            a.name,
            a.potency_percent * 100.0,
            input
        );
    }
}

fn cmd_init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path
        .or_else(Config::default_config_path)
        .ok_or_else(|| Error::Config("No config directory available; pass --config".into()))?;

    if path.exists() && !force {
        println!("Config already exists at {} (use --force to overwrite)", path.display());
        return Ok(());
    }

    Config::default().save_to(&path)?;
    println!("✓ Wrote default config to {}", path.display());
    Ok(())
}

fn display_result(resolved: &ResolvedRequest, result: &CalculationResult, alerts: &[SafetyAlert]) {
    let b = &result.breakdown;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  DOSE RECOMMENDATION");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {}", resolved.procedure.name);
    println!("  Recommended dose:     {:.2} mg", result.rule_based_dose);
    println!("  Secondary estimate:   {:.2} mg", result.ml_dose);
    println!();
    println!(
        "  BMI {:.1} ({})  IBW {:.1} kg  ABW {:.1} kg",
        result.bmi,
        BmiCategory::from_bmi(result.bmi),
        result.ibw,
        result.abw
    );
    println!();
    println!("  Breakdown");
    println!("  → Base:                {:.2} MME", b.base_mme);
    println!("  → Age factor:          ×{:.3}", b.age_factor);
    println!("  → ASA factor:          ×{:.2}", b.asa_factor);
    println!("  → Opioid tolerance:    ×{:.2}", b.opioid_factor);
    println!("  → Renal function:      ×{:.2}", b.renal_factor);
    println!("  → Before adjuvants:    {:.2} MME", b.mme_before_adjuvants);
    println!("  → Adjuvant reduction:  −{:.2} MME", b.adjuvant_reduction);
    println!("  → Final:               {:.2} MME", b.final_mme);

    if !resolved.adjuvants.is_empty() {
        let names: Vec<&str> = resolved.adjuvants.iter().map(|a| a.name.as_str()).collect();
        println!();
        println!("  Adjuvants: {}", names.join(", "));
    }

    if !alerts.is_empty() {
        println!();
        for alert in alerts {
            println!("  ⚠ [{}] {}", alert.severity, alert.message);
        }
    }

    println!();
}
