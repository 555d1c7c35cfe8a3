//! assa-report: headless ASSA scoring runner.
//!
//! Usage:
//!   assa-report --db stores.db [--config scoring.json] [--json]
//!   assa-report --seed 12345 --stores 20 --days 90 [--export-db out.db]

use anyhow::Result;
use assa_core::{
    config::ScoringConfig,
    dataset::Dataset,
    generator::{self, SyntheticConfig},
    profile::{build_profiles, StoreProfile},
    report::AggregateReport,
    scorer::{score_stores, AssaScore},
    store::DataStore,
    types::StoreId,
};
use std::collections::BTreeMap;
use std::env;

#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    profiles: &'a BTreeMap<StoreId, StoreProfile>,
    scores: &'a BTreeMap<StoreId, AssaScore>,
    report: &'a AggregateReport,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json_mode = args.iter().any(|a| a == "--json");
    let db = find_arg(&args, "--db");
    let export_db = find_arg(&args, "--export-db");

    let config = match find_arg(&args, "--config") {
        Some(path) => ScoringConfig::load(path)?,
        None => ScoringConfig::default(),
    };

    let dataset = match db {
        Some(path) => {
            let store = DataStore::open(path)?;
            store.load_dataset()?
        }
        None => {
            let defaults = SyntheticConfig::default();
            let synthetic = SyntheticConfig {
                seed: parse_arg(&args, "--seed", defaults.seed),
                store_count: parse_arg(&args, "--stores", defaults.store_count),
                days: parse_arg(&args, "--days", defaults.days),
                ..defaults
            };
            if !json_mode {
                println!("ASSA report — synthetic dataset");
                println!("  seed:    {}", synthetic.seed);
                println!("  stores:  {}", synthetic.store_count);
                println!("  days:    {}", synthetic.days);
                println!();
            }
            generator::generate(&synthetic)?
        }
    };

    if let Some(path) = export_db {
        export(&dataset, path)?;
    }

    let profiles = build_profiles(&dataset);
    let outcome = score_stores(&dataset, &config)?;
    let report = AggregateReport::from_outcome(&outcome);

    if json_mode {
        let out = JsonOutput {
            profiles: &profiles,
            scores: &outcome.scores,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_scores(&profiles, &outcome.scores);
        print_summary(&report);
    }
    Ok(())
}

fn export(dataset: &Dataset, path: &str) -> Result<()> {
    let store = DataStore::open(path)?;
    store.migrate()?;
    store.save_dataset(dataset)?;
    log::info!("Dataset exported to {path}");
    Ok(())
}

fn print_scores(profiles: &BTreeMap<StoreId, StoreProfile>, scores: &BTreeMap<StoreId, AssaScore>) {
    println!("=== STORE SCORES ===");
    println!(
        "  {:<12} {:>6} {:>9} {:>5} {:>8} {:>8} {:>8} {:>7}  level",
        "store", "txns", "avg €", "peak", "expo", "vuln", "crit", "total"
    );
    for (store_id, score) in scores {
        let profile = profiles.get(store_id);
        let txns = profile.map(|p| p.transaction_count).unwrap_or(0);
        let avg = profile
            .and_then(|p| p.mean_amount)
            .map(|m| format!("{m:.2}"))
            .unwrap_or_else(|| "n/a".into());
        let peak = profile
            .and_then(|p| p.peak_hour)
            .map(|h| format!("{h:02}h"))
            .unwrap_or_else(|| "n/a".into());
        println!(
            "  {:<12} {:>6} {:>9} {:>5} {:>8.2} {:>8.2} {:>8.2} {:>7.2}  {}",
            store_id,
            txns,
            avg,
            peak,
            score.exposure,
            score.vulnerability,
            score.criticality,
            score.total,
            score.risk_level
        );
    }
    println!();
}

fn print_summary(report: &AggregateReport) {
    println!("=== SUMMARY ===");
    println!("  stores scored:  {}", report.store_count);
    match &report.totals {
        Some(t) => {
            println!("  mean total:     {:.2}", t.mean);
            println!("  min / max:      {:.2} / {:.2}", t.min, t.max);
            match t.std_dev {
                Some(sd) => println!("  std dev:        {sd:.2}"),
                None => println!("  std dev:        n/a (single store)"),
            }
        }
        None => println!("  (no stores scored)"),
    }
    for (level, count) in &report.risk_distribution {
        println!("  {:<14}  {count}", format!("{level}:"));
    }
    match report.incident_correlation {
        Some(r) => println!("  incidents ~ total (pearson r): {r:.3}"),
        None => println!("  incidents ~ total: undefined (zero-variance input)"),
    }

    if !report.failures.is_empty() {
        println!();
        println!("=== NOT SCORED ({}) ===", report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.store_id, failure.reason);
        }
    }
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
