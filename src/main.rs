//! bins-webhook CLI
//!
//! Aggregates streaming radio-decoding events and POSTs the identifiers of
//! detected bins to a remote webhook on each heartbeat.

use anyhow::Context;
use bins_webhook::{
    create_shared_aggregator, BinsReporter, Config, ProcessSignalOutput, RaddecSource,
    SignalAppearance, SignalOutput, BINS_PATH, VERSION,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bins-webhook")]
#[command(version = VERSION)]
#[command(about = "Forwards the identifiers of detected bins to a webhook", long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the UDP port on which raddecs are received
    #[arg(long)]
    listen_port: Option<u16>,

    /// Override the webhook target hostname
    #[arg(long)]
    hostname: Option<String>,

    /// Override the webhook target port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(listen_port) = cli.listen_port {
        config.listen_port = listen_port;
    }
    if let Some(hostname) = cli.hostname {
        config.hostname = hostname;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let aggregator = create_shared_aggregator(config.number_of_decodings_threshold);

    // The signal-appearance timer is optional; when disabled, new-device
    // detections are simply not forwarded anywhere.
    let signal_appearance = if config.enable_signal_appearance {
        let output: Arc<dyn SignalOutput> = Arc::new(ProcessSignalOutput::new(
            config.signal_command.clone(),
            config.signal_channel,
        ));
        Some(SignalAppearance::spawn(
            output,
            Duration::from_millis(config.signal_appearance_milliseconds),
        ))
    } else {
        None
    };

    let reporter = BinsReporter::new(&config, aggregator.clone())
        .context("Failed to create webhook reporter")?;
    info!(
        "bins-webhook POSTing updates every {} seconds to {}:{}{}",
        config.heartbeat_milliseconds / 1000,
        config.hostname,
        config.port,
        BINS_PATH
    );
    tokio::spawn(reporter.run());

    let source = RaddecSource::bind(config.listen_port)
        .await
        .with_context(|| format!("Failed to bind UDP port {}", config.listen_port))?;
    info!(
        "Listening for raddecs on udp://{} (mixing delay {} ms upstream)",
        source.local_addr()?,
        config.mixing_delay_milliseconds
    );

    let (raddec_tx, mut raddec_rx) = mpsc::channel(256);
    tokio::spawn(source.run(raddec_tx));

    // Ingest loop: accumulate decodings and forward new-device appearances
    // to the signal timer. HTTP dispatch happens on the reporter task, so
    // ingestion is never stalled by a slow webhook.
    loop {
        tokio::select! {
            raddec = raddec_rx.recv() => match raddec {
                Some(raddec) => {
                    let is_new = aggregator.lock().await.record(&raddec);
                    if is_new {
                        debug!("New bin appearance: {}", raddec.transmitter_id);
                        if let Some(ref signal) = signal_appearance {
                            signal.trigger();
                        }
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
