use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use paged_listing::config::{ListingConfig, ListingSection};
use paged_listing::error::{ListError, Result};
use paged_listing::replay::{self, Script, StepReport};

/// Replay a scripted listing session against an in-memory backend.
#[derive(Parser, Debug)]
#[command(name = "listing-replay", version, about)]
struct Cli {
    /// Replay script (TOML)
    script: PathBuf,

    /// Explicit config file, layered over the discovered ones
    #[arg(long)]
    config: Option<PathBuf>,

    /// Items per page (overrides config and script)
    #[arg(long)]
    page_size: Option<usize>,

    /// Print one JSON report per step instead of text
    #[arg(long)]
    json: bool,
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_text(report: &StepReport) {
    let snap = &report.snapshot;
    let cursor = snap
        .cursor
        .as_ref()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".into());
    println!(
        "[{}] {:<10} cursor={} more={} loading={}",
        report.index, report.action, cursor, snap.has_more, snap.loading
    );
    let (ordered, tail) = snap.items.split_at(snap.ordered.min(snap.items.len()));
    let fmt = |items: &[paged_listing::Item]| {
        items
            .iter()
            .map(|i| format!("{} ({})", i.sort_keys.name, i.id))
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("    window: {}", fmt(ordered));
    if !tail.is_empty() {
        println!("    tail:   {}", fmt(tail));
    }
    if let Some(ref err) = report.error {
        println!("    error:  {}", err);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let script = Script::from_path(&cli.script)?;
    let overrides = ListingConfig {
        listing: ListingSection {
            page_size: cli.page_size.or(script.page_size),
            ..Default::default()
        },
        ..Default::default()
    };
    let config = ListingConfig::load(cli.config.as_deref(), Some(&overrides));
    init_tracing(config.log_filter());

    let spec = config.sort_spec()?;
    let reports = replay::run(&script, spec, config.page_size()).await?;

    for report in &reports {
        if cli.json {
            let line = serde_json::to_string(report)
                .map_err(|e| ListError::Script(format!("cannot encode report: {}", e)))?;
            println!("{}", line);
        } else {
            print_text(report);
        }
    }
    Ok(())
}
