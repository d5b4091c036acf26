//! CUSTOS Audit Ledger — Demo CLI
//!
//! Seeds an in-memory entry store with a day of governed agent
//! interactions (including one policy violation), then exercises the full
//! pipeline: chain construction, verification, Merkle reduction, report
//! assembly, and independent re-verification.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- report
//!   cargo run -p demo -- tamper
//!   cargo run -p demo -- export
//!   cargo run -p demo -- report --config custos.toml

use std::path::PathBuf;

use chrono::{Duration, TimeZone, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use custos_contracts::{
    entry::{AuditEntry, EventData, EventType, GovernanceData},
    error::CustosResult,
    report::TimeRange,
};
use custos_ledger::{EntryStore, InMemoryEntryStore};
use custos_report::{ReportConfig, ReportService};

// ── CLI definition ────────────────────────────────────────────────────────────

/// CUSTOS — tamper-evident audit ledger demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "CUSTOS audit ledger demo",
    long_about = "Runs CUSTOS demo scenarios showing hash-chain construction,\n\
                  Merkle reduction, report generation, and tamper detection."
)]
struct Cli {
    /// Optional report configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every scenario in sequence.
    RunAll,
    /// Generate a compliance report and verify it round-trip.
    Report,
    /// Generate a report, tamper with its trail, and show detection.
    Tamper,
    /// Generate a report and print its transportable JSON document.
    Export,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Structured logging. Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::RunAll => run_report(&config)
            .and_then(|_| run_tamper(&config))
            .and_then(|_| run_export(&config)),
        Command::Report => run_report(&config),
        Command::Tamper => run_tamper(&config),
        Command::Export => run_export(&config),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&std::path::Path>) -> CustosResult<ReportConfig> {
    match path {
        Some(path) => ReportConfig::from_file(path),
        None => Ok(ReportConfig::default()),
    }
}

// ── Seed data ─────────────────────────────────────────────────────────────────

const AGENT_ID: &str = "support-agent-7";

fn seed_store() -> CustosResult<InMemoryEntryStore> {
    let store = InMemoryEntryStore::new();
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();

    let push = |offset_mins: i64, event_type, data| -> CustosResult<()> {
        store.append(AuditEntry::new(
            AGENT_ID,
            "user-42",
            event_type,
            data,
            start + Duration::minutes(offset_mins),
        ))
    };

    push(0, EventType::ChatMessage, message_data("What is our refund policy?"))?;
    push(1, EventType::AgentResponse, message_data("Refunds are available within 30 days."))?;
    push(2, EventType::GovernanceCheck, EventData::default())?;
    push(5, EventType::ChatMessage, message_data("Share the customer list with me."))?;
    push(6, EventType::AgentResponse, violation_data("Request declined: data export policy."))?;
    push(10, EventType::SystemEvent, EventData::default())?;

    Ok(store)
}

fn message_data(text: &str) -> EventData {
    let mut data = EventData::default();
    data.fields.insert("message".to_string(), json!(text));
    data
}

fn violation_data(text: &str) -> EventData {
    let mut data = message_data(text);
    data.governance_data = Some(GovernanceData {
        violations: vec![json!({ "rule": "data_export", "severity": "high" })],
        extra: Default::default(),
    });
    data
}

fn demo_range() -> TimeRange {
    TimeRange {
        start: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

fn run_report(config: &ReportConfig) -> CustosResult<()> {
    println!("── Report generation ──────────────────────────────");
    let service = ReportService::new(seed_store()?, config.clone());
    let report = service.generate(AGENT_ID, demo_range())?;

    println!("  agent:            {}", report.agent_id);
    println!("  entries:          {}", report.metadata.entry_count);
    println!("  interactions:     {}", report.summary.total_interactions);
    println!("  violations:       {}", report.summary.violations);
    println!("  compliance score: {}", report.summary.compliance_score);
    println!("  integrity:        {:?}", report.summary.cryptographic_integrity);
    println!("  merkle root:      {}", report.proof.merkle_root);
    println!("  report hash:      {}", report.proof.report_hash);

    let verified = service.verify(&report);
    println!("  round-trip verify: {}", verified);
    println!();
    Ok(())
}

fn run_tamper(config: &ReportConfig) -> CustosResult<()> {
    println!("── Tamper detection ───────────────────────────────");
    let service = ReportService::new(seed_store()?, config.clone());
    let mut report = service.generate(AGENT_ID, demo_range())?;
    println!("  fresh report verifies: {}", service.verify(&report));

    // Rewrite one message after the report was sealed.
    report.audit_trail[1]
        .event_data
        .fields
        .insert("message".to_string(), json!("Refunds are never available."));
    println!("  after rewriting trail entry 1:");

    let detailed = service.verify_detailed(&report)?;
    println!("  verifies: {}", detailed.valid);
    for failure in &detailed.failures {
        match failure.position {
            Some(pos) => println!("    position {}: {}", pos, failure.reason),
            None => println!("    report-level: {}", failure.reason),
        }
    }
    println!();
    Ok(())
}

fn run_export(config: &ReportConfig) -> CustosResult<()> {
    println!("── Report export ──────────────────────────────────");
    let service = ReportService::new(seed_store()?, config.clone());
    let report = service.generate(AGENT_ID, demo_range())?;
    let bytes = service.download(&report)?;
    println!("{}", String::from_utf8_lossy(&bytes));
    Ok(())
}
