//! CLI entry point.
//!
//! Wires the pipeline together: layered configuration, tracing, a device
//! registry, the UDP/OSC sender, and the controller loop, then runs until
//! ctrl-c.
//!
//! The binary ships with the simulated registry backend so the broadcast
//! path can be exercised without a tracking runtime; a real deployment
//! embeds the library and supplies its own [`DeviceRegistry`] adapter.
//! In demo mode each simulated device is pre-assigned to the slot matching
//! its index and batteries drain a little every tick.

use anyhow::Result;
use battery_osc::app::App;
use battery_osc::config::AppConfig;
use battery_osc::mock::MockDeviceRegistry;
use battery_osc::sender::OscUdpSender;
use battery_osc::{logging, DeviceRegistry, ParameterSender};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "battery-osc")]
#[command(about = "Broadcast tracked-device battery levels over OSC/UDP", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the destination host.
    #[arg(long)]
    host: Option<String>,

    /// Override the destination UDP port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the steady update interval in seconds.
    #[arg(long)]
    interval: Option<f64>,

    /// Number of simulated devices for the demo registry.
    #[arg(long, default_value_t = 3)]
    devices: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.destination_host = host;
    }
    if let Some(port) = cli.port {
        config.destination_port = port;
    }
    if let Some(interval) = cli.interval {
        config.update_interval_secs = interval;
    }
    config.validate()?;
    logging::init(&config)?;

    let destination = config.destination()?;
    info!(
        %destination,
        slots = config.slot_count,
        interval_secs = config.update_interval_secs,
        "starting battery broadcast"
    );

    let registry = MockDeviceRegistry::simulated(cli.devices);
    let sender = Arc::new(OscUdpSender::bind(destination).await?);
    let (app, handle) = App::new(
        &config,
        Arc::new(registry.clone()) as Arc<dyn DeviceRegistry>,
        sender as Arc<dyn ParameterSender>,
    );
    let controller = tokio::spawn(app.run());

    // Demo wiring: slot i feeds from simulated device i, batteries drain.
    // Unknown ids are accepted and resolve lazily, so this works before the
    // first snapshot exists.
    for index in 0..cli.devices.min(config.slot_count) {
        handle.slot_selection_requested(index).await;
        handle.device_picked(format!("SIM-{:03}", index)).await;
    }
    let drain_interval = config.update_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(drain_interval);
        loop {
            ticker.tick().await;
            registry.drain_batteries(0.01);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    handle.shutdown().await;
    controller.await?;
    Ok(())
}
