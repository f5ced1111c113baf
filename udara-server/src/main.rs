use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tokio::net::TcpListener;

mod config;
mod service;

use config::Args;
use service::{spawn_pulse, PredictionService};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    info!("Starting Udara prediction server...");

    // 1. Load reference tables and bounds once; every connection shares them.
    let predictor = Arc::new(args.build_predictor()?);
    info!(
        "Model ready: {} reference rows, k={}",
        predictor.classifier().dataset().len(),
        predictor.classifier().k()
    );

    ctrlc::set_handler(|| {
        info!("Shutdown requested, exiting.");
        std::process::exit(0);
    })
    .context("Error setting Ctrl-C handler")?;

    // 2. Bind and serve
    let listener = TcpListener::bind(args.addr())
        .await
        .with_context(|| format!("Failed to bind {}", args.addr()))?;
    let svc = Arc::new(PredictionService::new(predictor, args.row_limit()));
    spawn_pulse(svc.stats(), Duration::from_secs(args.pulse_secs.max(1)));

    svc.serve(listener).await.context("Prediction service stopped")
}
