//! Seismic swipe demo
//!
//! Simulates a handful of wallets liking and disliking each other. Every swipe
//! is first shared with Seismic for a data availability signature, then posted
//! on-chain as a hiding commitment. Finally the confirmed matches of one
//! wallet are fetched and printed.

mod backend;
mod config;
mod contract;
mod davail;
mod demo;
mod error;
mod matches;
mod orchestrator;
mod registrar;
mod signer;
mod typed_data;
mod types;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use crate::config::Config;
use crate::demo::DemoDriver;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "swipe-demo.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    dotenv::dotenv().ok();

    // Load configuration (file first, environment on top)
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config file {}: {}. Using environment variables.", args.config, e);
            Config::from_env()?
        }
    };
    info!("Configuration loaded successfully");

    let driver = DemoDriver::new(config)?;
    let matches = driver.run().await?;

    println!("{}", serde_json::to_string_pretty(&matches)?);
    info!("==");

    Ok(())
}
