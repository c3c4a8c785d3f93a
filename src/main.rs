use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use pagewright::batch::{BatchJob, jobs_from_pool, run_batch};
use pagewright::config::EngineConfig;
use pagewright::domain::{BusinessRecord, LoopResult, related_records};
use pagewright::engine::RepairEngine;
use pagewright::llm::{AnthropicClient, AnthropicConfig};
use pagewright::trace::JsonlTraceRecorder;
use pagewright::validate::{ParseOutcome, SeoValidator, parse_content_spec};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pagewright")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("pagewright.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn load_record(path: &PathBuf) -> Result<BusinessRecord> {
    let content =
        fs::read_to_string(path).context(format!("Failed to read record from {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse business record")
}

fn load_pool(path: &PathBuf) -> Result<Vec<BusinessRecord>> {
    let content =
        fs::read_to_string(path).context(format!("Failed to read records from {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse business records")
}

fn build_engine(
    config: EngineConfig,
    traces: &PathBuf,
) -> Result<RepairEngine<AnthropicClient, JsonlTraceRecorder>> {
    let llm_config = AnthropicConfig {
        model: config.llm.model.clone(),
        timeout: std::time::Duration::from_millis(config.timeout_ms),
    };
    let generator = Arc::new(AnthropicClient::new(llm_config)?);
    let recorder = Arc::new(JsonlTraceRecorder::new(traces)?);
    Ok(RepairEngine::new(config, generator, recorder)?)
}

fn report_failure(reason: &str, violations: &[pagewright::domain::Violation]) {
    eprintln!("{} {}", "Generation failed:".red().bold(), reason);
    for violation in violations {
        eprintln!("  {} {}", "-".red(), violation);
    }
}

async fn handle_generate(
    config: EngineConfig,
    record_path: &PathBuf,
    pool_path: Option<&PathBuf>,
    traces: &PathBuf,
    out: Option<&PathBuf>,
) -> Result<()> {
    let record = load_record(record_path)?;

    let candidates = match pool_path {
        Some(path) => {
            let pool = load_pool(path)?;
            related_records(&record, &pool).iter().map(|r| r.slug()).collect()
        }
        None => Vec::new(),
    };

    let engine = build_engine(config, traces)?;

    info!("Generating content for {} ({})", record.name, record.business_id);
    let result = engine.run(&record, candidates).await;

    match result {
        LoopResult::Accepted { spec, attempts } => {
            println!(
                "{} {} ({} round{})",
                "Accepted:".green().bold(),
                record.name,
                attempts.len(),
                if attempts.len() == 1 { "" } else { "s" }
            );
            let json = serde_json::to_string_pretty(&spec)?;
            match out {
                Some(path) => {
                    fs::write(path, json).context("Failed to write spec")?;
                    println!("Spec written to {}", path.display());
                }
                None => println!("{}", json),
            }
            Ok(())
        }
        LoopResult::Failed { reason, violations, .. } => {
            report_failure(reason.as_str(), &violations);
            bail!("content generation failed: {}", reason)
        }
    }
}

async fn handle_batch(
    config: EngineConfig,
    records_path: &PathBuf,
    concurrency: usize,
    traces: &PathBuf,
    out: &PathBuf,
) -> Result<()> {
    let pool = load_pool(records_path)?;
    let jobs: Vec<BatchJob> = jobs_from_pool(&pool);

    let engine = Arc::new(build_engine(config, traces)?);
    fs::create_dir_all(out).context("Failed to create output directory")?;

    println!(
        "Processing {} records with up to {} in flight",
        jobs.len(),
        concurrency
    );

    let results = run_batch(engine, jobs, concurrency).await;

    let mut accepted = 0;
    let mut failed = 0;
    for (business_id, result) in &results {
        match result {
            LoopResult::Accepted { spec, .. } => {
                accepted += 1;
                let path = out.join(format!("{}.json", business_id));
                fs::write(&path, serde_json::to_string_pretty(spec)?)
                    .context(format!("Failed to write {}", path.display()))?;
            }
            LoopResult::Failed { reason, .. } => {
                failed += 1;
                eprintln!("{} {}: {}", "Failed".red(), business_id, reason);
            }
        }
    }

    println!(
        "{} {} accepted, {} failed",
        "Done:".bold(),
        accepted.to_string().green(),
        failed.to_string().red()
    );
    Ok(())
}

fn handle_check(config: EngineConfig, spec_path: &PathBuf, slug: &str) -> Result<()> {
    let raw = fs::read_to_string(spec_path)
        .context(format!("Failed to read spec from {}", spec_path.display()))?;

    let violations = match parse_content_spec(&raw) {
        ParseOutcome::Parsed(spec) => SeoValidator::new(&config.seo).validate(&spec, slug),
        ParseOutcome::Invalid(violations) => violations,
    };

    if violations.is_empty() {
        println!("{}", "Spec is compliant".green().bold());
        Ok(())
    } else {
        for violation in &violations {
            eprintln!("  {} {}", "-".red(), violation);
        }
        bail!("{} violation(s) found", violations.len())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_ref())?;

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
        println!("max-rounds: {}, fault-budget: {}", config.max_rounds, config.fault_budget);
    }

    match &cli.command {
        Commands::Generate { record, pool, traces, out } => {
            handle_generate(config, record, pool.as_ref(), traces, out.as_ref()).await
        }
        Commands::Batch { records, concurrency, traces, out } => {
            handle_batch(config, records, *concurrency, traces, out).await
        }
        Commands::Check { spec, slug } => handle_check(config, spec, slug),
    }
}
