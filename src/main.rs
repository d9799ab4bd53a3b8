use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

use jobtech_cleaner::config::Config;
use jobtech_cleaner::constants::{get_supported_sources, parse_source_list};
use jobtech_cleaner::observability::{self, init_logging};
use jobtech_cleaner::pipeline::processing::validation::{write_seed, CompanyValidator};
use jobtech_cleaner::pipeline::{Pipeline, RunReport};

#[derive(Parser)]
#[command(name = "jobtech_cleaner")]
#[command(about = "Cleans and normalizes European tech job-market extracts")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cleaning pipeline over the raw extracts
    Run {
        /// Specific sources to clean (comma-separated). Available: jobs, github, trends, surveys
        #[arg(long)]
        sources: Option<String>,
    },
    /// Look up a single company in the registry
    Validate {
        /// Company name as it appears in a posting
        #[arg(long)]
        company: String,
        /// Registry identifier (SIRET), checked before the name
        #[arg(long)]
        siret: Option<String>,
    },
    /// Write the bundled company registry sample
    SeedRegistry {
        /// Overwrite an existing registry file
        #[arg(long)]
        force: bool,
    },
}

fn print_summary(report: &RunReport) {
    println!("\n📊 Cleaning run {}", report.run_id);
    for source in report.sources.iter().filter(|s| s.rows == 0) {
        println!("   ⚠️  {}: no rows produced", source.source);
    }
    for dataset in &report.datasets {
        match (&dataset.location, &dataset.error) {
            (_, Some(err)) => println!("   ❌ {}: {} rows, write failed: {}", dataset.artifact, dataset.rows, err),
            (Some(location), None) if dataset.rows == 0 => {
                println!("   ⚠️  {}: 0 rows -> {}", dataset.artifact, location)
            }
            (Some(location), None) => println!("   ✅ {}: {} rows -> {}", dataset.artifact, dataset.rows, location),
            (None, None) => println!("   ✅ {}: {} rows", dataset.artifact, dataset.rows),
        }
    }
    if report.validation.evaluated > 0 {
        println!(
            "   🏢 Verified companies: {}/{}",
            report.validation.verified, report.validation.evaluated
        );
    }
    if !report.failed_sources.is_empty() {
        println!("\n⚠️  Failed sources: {}", report.failed_sources.join(", "));
    }
    println!("   Total rows: {}", report.total_rows());
}

fn run(config: &Config, sources: Option<String>) -> Result<()> {
    let selected = sources.map(|list| parse_source_list(&list));
    if let Some(names) = &selected {
        let supported = get_supported_sources();
        for unknown in names.iter().filter(|n| !supported.contains(&n.as_str())) {
            warn!("Unknown source ignored: {}", unknown);
            println!("⚠️  Unknown source: {}", unknown);
        }
    }

    println!("🔄 Running cleaning pipeline...");
    let pipeline = Pipeline::from_config(config).context("cannot start the cleaning pipeline")?;
    let report = pipeline.run(selected.as_deref());

    let clean_root = config.paths.clean_root();
    let report_path = clean_root.join("run_report.json");
    report
        .write_json(&report_path)
        .with_context(|| format!("cannot write {}", report_path.display()))?;
    info!("Run report written to {}", report_path.display());

    if let Some(snapshot) = observability::render() {
        let metrics_path = clean_root.join("metrics.prom");
        if let Err(e) = fs::write(&metrics_path, snapshot) {
            warn!("Cannot write metrics snapshot {}: {}", metrics_path.display(), e);
        }
    }

    print_summary(&report);
    if report.has_errors() {
        error!("Run {} finished with errors", report.run_id);
    }
    Ok(())
}

fn validate(config: &Config, company: &str, siret: Option<&str>) -> Result<()> {
    let validator = CompanyValidator::new(&config.paths.registry_file, &config.validation);
    if let Err(e) = validator.registry() {
        anyhow::bail!("company registry unavailable: {}", e);
    }
    let result = validator.validate(Some(company), siret);

    println!("🔎 {}", company);
    println!(
        "   verified: {}",
        result
            .is_verified_company
            .map(|v| v.to_string())
            .unwrap_or_else(|| "null".to_string())
    );
    println!(
        "   score:    {}",
        result
            .match_score
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "null".to_string())
    );
    println!(
        "   method:   {}",
        result
            .match_method
            .map(|m| m.to_string())
            .unwrap_or_else(|| "null".to_string())
    );
    Ok(())
}

fn seed_registry(config: &Config, force: bool) -> Result<()> {
    let path = &config.paths.registry_file;
    if path.exists() && !force {
        println!("⏭️  {} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }
    let count = write_seed(path).with_context(|| format!("cannot write {}", path.display()))?;
    println!("🌱 Wrote {} companies to {}", count, path.display());
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging();
    if let Err(e) = observability::init() {
        warn!("Metrics recorder not installed: {}", e);
    }

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("cannot load configuration")?;

    match cli.command {
        Commands::Run { sources } => run(&config, sources),
        Commands::Validate { company, siret } => validate(&config, &company, siret.as_deref()),
        Commands::SeedRegistry { force } => seed_registry(&config, force),
    }
}
