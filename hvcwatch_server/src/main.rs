//! HVC Watch alert server.
//!
//! Receives mailbox messages over TCP, extracts ticker symbols from their
//! subjects and notifies every configured channel about each symbol while the
//! NYSE window is open. Wiring:
//!
//! - `IntakeReceiver`: accepts one JSON `InboundMessage` per TCP connection on its
//!   own thread and forwards it over a `crossbeam_channel`.
//! - `AlertPipeline`: runs on the main thread, one message at a time: extraction,
//!   weekly/monthly repeat suppression, then `Dispatcher::dispatch` per symbol.
//! - `Dispatcher`: market window gate, one enrichment call, fan-out to the
//!   channel registry with per-channel failure isolation.
//!
//! Configuration comes from command line flags or their environment variables
//! (see `Settings`). A missing or invalid channel configuration stops startup.
//!
//! Shutdown: Ctrl+C sets a flag that the main loop polls; sends that are in
//! flight at that moment may be abandoned.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{RecvTimeoutError, unbounded};
use hvcwatch_common::{InboundMessage, Result, WatchError};
use hvcwatch_server::channels::{Senders, http_client};
use hvcwatch_server::enrichment::HttpEnrichment;
use hvcwatch_server::model::calendar::NyseCalendar;
use hvcwatch_server::model::dispatcher::Dispatcher;
use hvcwatch_server::model::gate::MarketWindowGate;
use hvcwatch_server::model::registry::ChannelRegistry;
use hvcwatch_server::pipeline::AlertPipeline;
use hvcwatch_server::receiver::IntakeReceiver;
use hvcwatch_server::settings::Settings;
use hvcwatch_server::version::version_info;
use log::{error, info};

/// How often the main loop checks the shutdown flag while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    let settings = Settings::parse();
    init_logger(&settings);
    info!("Starting hvcwatch {}", version_info());

    let registry = ChannelRegistry::build(settings.endpoints(), &settings.registry_rules())?;
    for endpoint in registry.iter() {
        info!("Channel {} {} {}", endpoint.id(), endpoint.kind(), endpoint.redacted());
    }

    let client = http_client(Duration::from_secs(settings.http_timeout_secs))
        .map_err(|e| WatchError::Configuration(format!("cannot build HTTP client: {}", e)))?;
    let senders = Senders::http(client.clone(), &settings.transparent_png);
    let enrichment = HttpEnrichment::new(client, &settings.enrichment_url)?;
    let calendar = NyseCalendar::default();
    let dispatcher = Dispatcher::new(&registry, &senders, &enrichment, &calendar)
        .with_gate(MarketWindowGate::new(settings.window_buffer()))
        .with_concurrent_fanout(!settings.sequential_fanout);
    let mut pipeline = AlertPipeline::new(dispatcher);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down server...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| WatchError::Configuration(format!("cannot install Ctrl+C handler: {}", e)))?;
    }

    let (msg_tx, msg_rx) = unbounded::<InboundMessage>();
    let intake = IntakeReceiver::bind(&settings.bind)?
        .with_read_timeout(Duration::from_secs(settings.intake_read_timeout_secs));
    thread::spawn(move || {
        if let Err(e) = intake.receive_loop_with_channel(msg_tx) {
            error!("Intake loop failed: {}", e);
        }
    });

    while !shutdown.load(Ordering::SeqCst) {
        match msg_rx.recv_timeout(POLL_INTERVAL) {
            Ok(message) => {
                for (symbol, outcomes) in pipeline.process_message(&message) {
                    let delivered = outcomes.iter().filter(|o| o.success).count();
                    info!(
                        "Alert processed ticker={} delivered={}/{}",
                        symbol,
                        delivered,
                        outcomes.len()
                    );
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(WatchError::ChannelRecv("intake receiver stopped".to_string()));
            }
        }
    }
    info!("Server stopped");
    Ok(())
}

fn init_logger(settings: &Settings) {
    env_logger::Builder::new()
        .filter_level(settings.level_filter())
        .parse_default_env()
        .init();
}
