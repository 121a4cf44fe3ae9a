//! cs-e2e - End-to-end tests for Containership Kubernetes Engine clusters
//!
//! Runs one of the provision, scale or cleanup suites against the
//! Containership Cloud API. `scripts/run-e2e.sh` runs all three in order.

mod cli;
mod context;
mod output;
mod runner;
mod suites;

use anyhow::Result;
use clap::Parser;
use cs_e2e_core::ConfigLoader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use context::HarnessContext;
use suites::provision::ProvisionOptions;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config = ConfigLoader::load(cli.config.as_deref())?;
    debug!(?config, "loaded harness config");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, aborting");
            on_interrupt.cancel();
        }
    });

    let summary = match cli.command {
        Commands::Provision(args) => {
            let options = ProvisionOptions::from_args(&args)?;
            let ctx = HarnessContext::new(config, &args.env, args.debug, cancel)?;
            suites::provision::run(&ctx, &options).await?
        }
        Commands::Scale(args) => {
            let ctx = HarnessContext::new(config, &args.env, args.debug, cancel)?;
            suites::scale::run(&ctx).await?
        }
        Commands::Cleanup(args) => {
            let ctx = HarnessContext::new(config, &args.env, args.debug, cancel)?;
            suites::cleanup::run(&ctx).await?
        }
    };

    summary.print();
    Ok(())
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
