//! `checkout` CLI: synthetic scenario runs, replay of session logs, and
//! processing of recorded document dumps.

use anyhow::{Context, Result};
use checkout_core::association::AssociationKind;
use checkout_core::cashier::EventOutcome;
use checkout_core::metrics::{GroundTruthEvent, ReceiptMetrics};
use checkout_core::session::{SessionConfig, SessionOutput, SessionPipeline};
use clap::{Parser, Subcommand};
use sim::replay::{load_log, save_log, SessionLog};
use sim::scenarios::{Scenario, ScenarioKind};
use std::path::{Path, PathBuf};
use store_models::{SessionDump, StoreMeta};

#[derive(Parser)]
#[command(name = "checkout", about = "Weight-event receipt attribution CLI")]
struct Cli {
    /// Partial JSON session config; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the customer association strategy
    #[arg(long, global = true, value_enum)]
    association: Option<AssociationKind>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a named scenario, run it and report receipts and metrics.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Output receipts and metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the full session log
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Re-run a previously saved session log.
    Replay {
        /// Path to session log JSON file
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Process a recorded session dump against store metadata.
    Process {
        /// Directory holding Gondolas.json, Shelves.json and Plates.json
        #[arg(long)]
        store_meta: PathBuf,
        /// Session dump JSON file
        dump: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.association)?;

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            output,
            save,
        } => {
            run_scenario(scenario, seed, config, output.as_deref(), save.as_deref())?;
        }
        Commands::Replay { input, output } => {
            run_replay(&input, config, output.as_deref())?;
        }
        Commands::Process {
            store_meta,
            dump,
            output,
        } => {
            run_process(&store_meta, &dump, config, output.as_deref())?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, association: Option<AssociationKind>) -> Result<SessionConfig> {
    let mut config = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading config {}", p.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", p.display()))?
        }
        None => SessionConfig::default(),
    };
    if let Some(kind) = association {
        config.cashier.association = kind;
    }
    Ok(config)
}

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    config: SessionConfig,
    output_path: Option<&Path>,
    save_path: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::build(kind, seed);
    println!(
        "Running scenario '{}' (seed={}, duration={:.0}s)...",
        scenario.name, seed, scenario.duration
    );
    let log = scenario.simulate();

    if let Some(spath) = save_path {
        save_log(&log, spath)?;
        println!("Session log saved to {}", spath.display());
    }

    evaluate_log(&log, config, output_path)
}

fn run_replay(input: &Path, config: SessionConfig, output_path: Option<&Path>) -> Result<()> {
    let log = load_log(input).with_context(|| format!("loading {}", input.display()))?;
    println!(
        "Replaying '{}' ({} readings, {} frames)...",
        log.scenario_name,
        log.readings.len(),
        log.frames.len()
    );
    evaluate_log(&log, config, output_path)
}

fn evaluate_log(log: &SessionLog, config: SessionConfig, output_path: Option<&Path>) -> Result<()> {
    let out = log.run(config)?;
    report(&out, &log.ground_truth, output_path)
}

fn run_process(
    store_meta: &Path,
    dump_path: &Path,
    mut config: SessionConfig,
    output_path: Option<&Path>,
) -> Result<()> {
    let meta = StoreMeta::load_dir(store_meta)
        .with_context(|| format!("loading store metadata from {}", store_meta.display()))?;
    let dump = SessionDump::load(dump_path)
        .with_context(|| format!("loading session dump {}", dump_path.display()))?;
    if dump.video_start_time.is_some() {
        config.video_start_time = dump.video_start_time;
    }

    let (catalog, planogram) = dump.store();
    println!(
        "Processing {} plate messages, {} target frames, {} products...",
        dump.plate_data.len(),
        dump.targets.len(),
        catalog.len()
    );
    let pipeline = SessionPipeline::new(config, catalog, planogram, meta.to_geometry());
    let out = pipeline.run(&dump.readings(), &dump.target_frames())?;
    report(&out, &dump.ground_truth, output_path)
}

fn report(out: &SessionOutput, ground_truth: &[GroundTruthEvent], output_path: Option<&Path>) -> Result<()> {
    let count = |f: fn(&EventOutcome) -> bool| out.events.iter().filter(|e| f(&e.outcome)).count();
    let purchases = count(|o| matches!(o, EventOutcome::Purchase(_)));
    let putbacks = count(|o| matches!(o, EventOutcome::Putback(_)));
    let dropped = out.events.len() - purchases - putbacks;

    println!(
        "Done: {} events ({} purchases, {} putbacks, {} dropped), elapsed={} µs",
        out.events.len(),
        purchases,
        putbacks,
        dropped,
        out.timings.total_us
    );
    for (customer, receipt) in &out.receipts {
        println!("Customer {customer}:");
        for entry in &receipt.purchases {
            println!(
                "  {} x{} ({})",
                entry.product.barcode, entry.quantity, entry.product.name
            );
        }
    }

    let metrics = (!ground_truth.is_empty()).then(|| {
        let mut m = ReceiptMetrics::default();
        m.accumulate(&out.receipts, ground_truth);
        m
    });
    if let Some(m) = &metrics {
        println!(
            "Precision {:.3}, recall {:.3}, F1 {:.3}",
            m.precision(),
            m.recall(),
            m.f1()
        );
    }

    if let Some(opath) = output_path {
        let json = serde_json::json!({
            "receipts": out.receipts,
            "events": out.events,
            "test_start_time": out.test_start_time,
            "skipped_readings": out.skipped_readings,
            "timings": out.timings,
            "metrics": metrics.as_ref().map(|m| serde_json::json!({
                "true_positives": m.true_positives,
                "false_positives": m.false_positives,
                "false_negatives": m.false_negatives,
                "precision": m.precision(),
                "recall": m.recall(),
                "f1": m.f1(),
            })),
        });
        std::fs::write(opath, serde_json::to_string_pretty(&json)?)?;
        println!("Results saved to {}", opath.display());
    }

    Ok(())
}
