use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use skywell_risk::config::Config;
use skywell_risk::scoring::{HealthProfile, RiskEngine};
use skywell_risk::series::{DataLoader, DirectoryLoader};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_NO_DATA: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assess risk for one date (default if no subcommand)
    Assess {
        /// Date to assess, YYYY-MM-DD (defaults to today, UTC)
        #[arg(short, long)]
        date: Option<String>,

        /// Profile to assess; repeat for several (defaults to config, then all)
        #[arg(short, long = "profile")]
        profiles: Vec<String>,

        /// Directory with <date>_<variable>.json files (overrides config)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Print a JSON report instead of the table
        #[arg(long, conflicts_with = "tsv")]
        json: bool,

        /// Print tab-separated values for scripting
        #[arg(long)]
        tsv: bool,

        /// Also write the JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List health profiles and their weighted variables
    Profiles,
    /// Show the threshold and alert tables in effect
    Thresholds,
    /// Write a starter config file
    Init {
        /// Where to write (defaults to ~/.config/skywell/config.yaml)
        path: Option<PathBuf>,

        /// Data directory recorded in the config
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Default profile; repeat for several
        #[arg(short, long = "profile")]
        profiles: Vec<String>,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "skywell")]
#[command(about = "Health risk scores from environmental forecasts", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/skywell/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "skywell_risk=debug,skywell=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_profiles(values: &[String]) -> Vec<HealthProfile> {
    let mut profiles = Vec::new();
    for value in values {
        match HealthProfile::parse(value) {
            Ok(p) if !profiles.contains(&p) => profiles.push(p),
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}", e);
                eprintln!("Run `skywell profiles` to see the available profiles.");
                std::process::exit(EXIT_CONFIG);
            }
        }
    }
    profiles
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Assess {
        date: None,
        profiles: Vec::new(),
        data_dir: None,
        json: false,
        tsv: false,
        output: None,
    });

    let config_path = cli.config.map(PathBuf::from);

    // Init runs before loading so it can replace a broken config
    if let Commands::Init {
        path,
        data_dir,
        profiles,
        force,
    } = &command
    {
        let profiles = parse_profiles(profiles);
        let path = path.clone().or_else(|| config_path.clone());
        match skywell_risk::config::write_starter_config(path, data_dir.clone(), profiles, *force) {
            Ok(written) => {
                println!("Wrote starter config to {}", written.display());
                std::process::exit(EXIT_SUCCESS);
            }
            Err(e) => {
                eprintln!("Failed to write config: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
    }

    let config = match skywell_risk::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config and catalog at startup
    if let Err(errors) = skywell_risk::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    match command {
        Commands::Profiles => print_profiles(&config),
        Commands::Thresholds => print_thresholds(&config),
        Commands::Assess {
            date,
            profiles,
            data_dir,
            json,
            tsv,
            output,
        } => {
            let code = run_assess(&config, cli.verbose, date, profiles, data_dir, json, tsv, output).await;
            std::process::exit(code);
        }
        Commands::Init { .. } => {}
    }

    std::process::exit(EXIT_SUCCESS);
}

#[allow(clippy::too_many_arguments)]
async fn run_assess(
    config: &Config,
    verbose: bool,
    date: Option<String>,
    profiles: Vec<String>,
    data_dir: Option<PathBuf>,
    json: bool,
    tsv: bool,
    output: Option<PathBuf>,
) -> i32 {
    let start_time = Instant::now();

    let date = match date {
        Some(s) => match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                eprintln!("Invalid date '{}': {} (expected YYYY-MM-DD)", s, e);
                return EXIT_CONFIG;
            }
        },
        None => Utc::now().date_naive(),
    };

    let Some(data_dir) = data_dir.or_else(|| config.data_dir.clone()) else {
        eprintln!("No data directory configured.");
        eprintln!("Pass --data-dir or add it to ~/.config/skywell/config.yaml:");
        eprintln!("  data_dir: /path/to/forecasts");
        return EXIT_CONFIG;
    };

    let mut profiles = parse_profiles(&profiles);
    if profiles.is_empty() {
        profiles = config
            .profiles
            .clone()
            .unwrap_or_else(|| HealthProfile::ALL.to_vec());
    }

    let options = match config.engine_options() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            return EXIT_CONFIG;
        }
    };
    let engine = RiskEngine::new(Arc::new(config.build_catalog())).with_options(options);
    let loader: Arc<dyn DataLoader> = Arc::new(DirectoryLoader::new(data_dir));

    tracing::debug!("Assessing {} profiles for {}", profiles.len(), date);
    let outcomes = skywell_risk::fetch::assess_profiles(&engine, loader, date, &profiles).await;

    // No data for the date fails every profile the same way
    if outcomes.iter().all(|(_, r)| matches!(r, Err(e) if e.is_no_data())) {
        eprintln!("No environmental data found for {}.", date);
        return EXIT_NO_DATA;
    }

    if let Some(ref path) = output {
        if let Err(e) = skywell_risk::output::write_json_report(path, &outcomes) {
            eprintln!("Failed to write report: {:#}", e);
            return EXIT_FAILURE;
        }
    }

    let use_colors = skywell_risk::output::should_use_colors();

    if json {
        match skywell_risk::output::format_json(&outcomes) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                return EXIT_FAILURE;
            }
        }
    } else if tsv {
        println!("{}", skywell_risk::output::format_tsv(&outcomes));
    } else if verbose {
        // Verbose mode: full breakdown per profile
        for (profile, result) in &outcomes {
            match result {
                Ok(assessment) => println!(
                    "{}",
                    skywell_risk::output::format_assessment(assessment, engine.catalog(), use_colors)
                ),
                Err(e) => println!("{}\n  Error: {}", profile.label(), e),
            }
            println!();
        }
    } else {
        println!(
            "{}",
            skywell_risk::output::format_summary_table(&outcomes, use_colors)
        );
    }

    if verbose {
        eprintln!();
        eprintln!("Total: {} profiles in {:?}", outcomes.len(), start_time.elapsed());
    }

    EXIT_SUCCESS
}

fn print_profiles(config: &Config) {
    let catalog = config.build_catalog();
    for profile in HealthProfile::ALL {
        let Some(spec) = catalog.profile(profile) else {
            continue;
        };
        println!("{:<28} {}", profile.id(), spec.description);
        let weights: Vec<_> = spec
            .weights
            .iter()
            .map(|w| format!("{} {}", w.variable, w.weight))
            .collect();
        println!("{:<28} {}", "", weights.join(", "));
        if spec.hazard_multiplier != 1.0 {
            println!("{:<28} hazard x{}", "", spec.hazard_multiplier);
        }
    }
}

fn print_thresholds(config: &Config) {
    let catalog = config.build_catalog();
    println!(
        "{:<32} {:>8} {:>8}  {:<10} {:<8} {:<8} {:>8}",
        "variable", "safe", "danger", "unit", "window", "curve", "alert"
    );
    for (var, threshold) in &catalog.thresholds {
        let alert = catalog
            .alert(*var)
            .map(|a| format!("{} @ {}", a.alert_threshold, a.window))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<32} {:>8} {:>8}  {:<10} {:<8} {:<8} {:>8}",
            var.id(),
            threshold.safe,
            threshold.danger,
            threshold.unit,
            threshold.window.to_string(),
            threshold.curve.to_string(),
            alert
        );
    }
    for family in &catalog.pollen_families {
        let members: Vec<_> = family.members.iter().map(|m| m.id()).collect();
        println!("family {:<25} {}", family.name, members.join(", "));
    }
}
