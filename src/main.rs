//! valkey-diag - slow-log and client-connection diagnostics for Valkey
//!
//! `-c slowlog` discovers every node behind the target and prints each
//! node's slow log; `-c clientlist` counts the target's client connections
//! per source IP.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use valkey_diag::analyzer::{self, ClientListAnalyzer};
use valkey_diag::config::{CliArgs, DiagCommand, DiagConfig};
use valkey_diag::report::Reporter;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn open_output(config: &DiagConfig) -> Result<Box<dyn Write>> {
    match config.output_path {
        Some(ref path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {:?}", path))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse_args();
    setup_logging(args.verbose, args.quiet);

    let config = DiagConfig::from_cli(&args)?;
    let factory = config.connection_factory();
    let mut reporter = Reporter::new(open_output(&config)?, config.output_format);

    match config.command {
        DiagCommand::Slowlog => {
            let summary = analyzer::collect_slow_logs(
                &factory,
                &config.address,
                config.collect_options(),
                &mut reporter,
            )
            .context("Slowlog fetch failed")?;

            info!(
                "Collected {} slow-log entries from {} nodes",
                summary.total_entries(),
                summary.outcomes.len()
            );
            if summary.has_failures() {
                let failed: Vec<String> = summary.failed().map(|o| o.address.to_string()).collect();
                anyhow::bail!("Slowlog fetch failed on {}", failed.join(", "));
            }
        }
        DiagCommand::Clientlist => {
            let mut stats = ClientListAnalyzer::new(&factory)
                .analyze(&config.address)
                .context("Client list fetch failed")?;
            analyzer::sort_stats(&mut stats, config.sort);
            reporter.client_stats(&stats)?;
        }
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
