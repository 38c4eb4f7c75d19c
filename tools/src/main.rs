//! maturity-runner: headless runner for the digital maturity simulator.
//!
//! Usage:
//!   maturity-runner --seed 42 --companies 1000
//!   maturity-runner --config config.json --db run.db --json report.json
//!   maturity-runner --target delta --top 5

use anyhow::Result;
use maturity_core::{
    config::AssessmentConfig,
    error::MaturityError,
    impact::ImpactTarget,
    pipeline::{AssessmentPipeline, RunOutput, DEFAULT_LEADERBOARD_SIZE},
    store::AssessmentStore,
};
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<MaturityError>() {
                Some(err) => eprintln!("error [{}]: {}", err.kind(), describe(err)),
                None => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut config = match flag_value(&args, "--config")? {
        Some(path) => AssessmentConfig::load(path)?,
        None => AssessmentConfig::default(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed)?;
    config.company_count = parse_arg(&args, "--companies", config.company_count)?;
    config.alpha = parse_arg(&args, "--alpha", config.alpha)?;
    if args.iter().any(|a| a == "--strategic-weights") {
        config = config.with_strategic_weights();
    }

    let target = match flag_value(&args, "--target")? {
        Some(name) => ImpactTarget::parse(name)
            .ok_or_else(|| MaturityError::invalid(format!("unknown target '{name}'")))?,
        None => ImpactTarget::AfterAggregate,
    };
    let top = parse_arg(&args, "--top", DEFAULT_LEADERBOARD_SIZE)?;
    let db = flag_value(&args, "--db")?;
    let json = flag_value(&args, "--json")?;

    let pipeline = AssessmentPipeline::new(config)?
        .with_target(target)
        .with_leaderboard_size(top);

    let config = pipeline.config();
    println!("Digital Maturity Assessment: maturity-runner");
    println!("  seed:      {}", config.seed);
    println!("  companies: {}", config.company_count);
    println!("  alpha:     {}", config.alpha);
    println!("  target:    {target:?}");
    println!();

    let output = pipeline.run()?;

    if let Some(path) = db {
        let run_id = format!("run-{}", uuid::Uuid::new_v4());
        let store = AssessmentStore::open(path)?;
        store.migrate()?;
        store.insert_run(
            &run_id,
            output.report.seed,
            output.report.company_count,
            env!("CARGO_PKG_VERSION"),
        )?;
        store.insert_dataset(&run_id, &output.dataset)?;
        store.save_report(&run_id, &output.report)?;
        log::info!("wrote {run_id} to {path}");
        println!("  stored run {run_id} in {path}");
    }
    if let Some(path) = json {
        std::fs::write(path, serde_json::to_string_pretty(&output.report)?)?;
        println!("  wrote report to {path}");
    }

    print_summary(&output);
    Ok(())
}

fn print_summary(output: &RunOutput) {
    let report = &output.report;
    let summary = &report.summary;
    let test = &report.significance;
    let fit = &report.regression;

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  companies:      {}", summary.companies);
    println!("  mean before:    {:.2}", summary.mean_before);
    println!("  mean after:     {:.2}", summary.mean_after);
    println!("  mean growth:    {:.2}", summary.mean_growth);

    println!();
    println!("=== PAIRED T-TEST ===");
    println!("  t = {:.3}  df = {}  p = {:.3e}", test.statistic, test.degrees_of_freedom, test.p_value);
    println!("  effect size d_z = {:.2}", test.effect_size);
    println!(
        "  significant at alpha {}: {}",
        test.alpha_used,
        if test.significant { "yes" } else { "no" }
    );

    println!();
    println!("=== IMPACT (standardized, R² = {:.4}) ===", fit.r_squared);
    for impact in fit.ranking() {
        if impact.defined {
            println!(
                "  {:<16} {:>8.4}  (raw {:.4})",
                impact.category, impact.standardized_coefficient, impact.coefficient
            );
        } else {
            println!("  {:<16} undefined (no variance)", impact.category);
        }
    }

    println!();
    println!("=== GROWTH BY SECTOR ===");
    for sector in &summary.sector_growth {
        println!("  {:<14} n={:<5} growth {:.2}", sector.sector, sector.companies, sector.mean_growth);
    }

    println!();
    println!("=== TOP {} (final) ===", summary.top.len());
    for entry in &summary.top {
        println!("  {:<20} {:<14} {:.2}", entry.company_name, entry.sector, entry.after_aggregate);
    }
    println!("=== BOTTOM {} (final) ===", summary.bottom.len());
    for entry in &summary.bottom {
        println!("  {:<20} {:<14} {:.2}", entry.company_name, entry.sector, entry.after_aggregate);
    }
}

fn describe(err: &MaturityError) -> String {
    match err {
        MaturityError::InvalidInput { reason } => format!("check the configuration: {reason}"),
        MaturityError::InsufficientData { rows, required } => {
            format!("{rows} companies is too few to fit the impact model (need {required})")
        }
        MaturityError::MismatchedLength { before, after } => {
            format!("before/after series differ in length ({before} vs {after})")
        }
        MaturityError::DegenerateInput { reason } => format!("cannot run the paired test: {reason}"),
        other => other.to_string(),
    }
}

/// Value following `flag`, if the flag was given. A flag with nothing
/// after it is an error.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>, MaturityError> {
    match args.iter().position(|a| a == flag) {
        None => Ok(None),
        Some(i) => args
            .get(i + 1)
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| MaturityError::invalid(format!("{flag} needs a value"))),
    }
}

/// Parsed value of `flag`, or `default` when the flag is absent. A value
/// that does not parse is rejected.
fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> Result<T, MaturityError> {
    match flag_value(args, flag)? {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| MaturityError::invalid(format!("{flag} got unparsable value '{raw}'"))),
    }
}
