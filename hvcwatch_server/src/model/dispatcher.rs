//! Alert dispatcher: gate, enrich once, fan out.
//!
//! For one alert the dispatcher
//! 1. asks the market window gate whether the alert is still actionable;
//! 2. calls the enrichment provider exactly once (a single call site per
//!    invocation, no cache);
//! 3. hands the same borrowed `EnrichedTicker` to the sender of every registered
//!    channel, in registry order, and records one `DispatchOutcome` per channel.
//!
//! Failure semantics:
//! - gate rejection and an empty registry produce no outcomes and are not errors;
//! - an enrichment failure produces a single pipeline-level failed outcome and no
//!   channel is contacted;
//! - a channel failure, including a panicking sender in either fan-out mode,
//!   only affects that channel's outcome.
//!
//! Sends may run concurrently on scoped threads; outcomes are joined back in
//! registry order before returning.
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use chrono::NaiveDate;
use hvcwatch_common::{Alert, EnrichedTicker, EnrichmentError};
use log::{error, info, warn};

use crate::channels::Senders;
use crate::enrichment::EnrichmentProvider;
use crate::model::calendar::TradingCalendar;
use crate::model::gate::MarketWindowGate;
use crate::model::registry::{ChannelEndpoint, ChannelId, ChannelKind, ChannelRegistry};

/// What an outcome refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeTarget {
    /// The alert as a whole (enrichment failed before any channel was tried).
    Pipeline,
    /// One delivery channel.
    Channel {
        /// Channel identifier.
        id: ChannelId,
        /// Channel kind.
        kind: ChannelKind,
        /// Redacted address, safe to log.
        label: String,
    },
}

/// Result of delivering one alert to one channel, or of the pipeline itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Channel or pipeline the outcome is about.
    pub target: OutcomeTarget,
    /// Whether delivery succeeded.
    pub success: bool,
    /// Failure description when `success` is false.
    pub error: Option<String>,
}

impl DispatchOutcome {
    fn delivered(endpoint: &ChannelEndpoint) -> Self {
        DispatchOutcome {
            target: channel_target(endpoint),
            success: true,
            error: None,
        }
    }

    fn failed(endpoint: &ChannelEndpoint, error: String) -> Self {
        DispatchOutcome {
            target: channel_target(endpoint),
            success: false,
            error: Some(error),
        }
    }

    fn pipeline_failure(error: &EnrichmentError) -> Self {
        DispatchOutcome {
            target: OutcomeTarget::Pipeline,
            success: false,
            error: Some(error.to_string()),
        }
    }

    /// Channel identifier, `None` for pipeline outcomes.
    pub fn channel_id(&self) -> Option<&ChannelId> {
        match &self.target {
            OutcomeTarget::Channel { id, .. } => Some(id),
            OutcomeTarget::Pipeline => None,
        }
    }
}

fn channel_target(endpoint: &ChannelEndpoint) -> OutcomeTarget {
    OutcomeTarget::Channel {
        id: endpoint.id().clone(),
        kind: endpoint.kind(),
        label: endpoint.redacted(),
    }
}

/// Gate, enrichment and fan-out for single alerts. Borrows everything it uses;
/// all of it is read-only during dispatch.
pub struct Dispatcher<'a> {
    registry: &'a ChannelRegistry,
    senders: &'a Senders,
    enrichment: &'a dyn EnrichmentProvider,
    calendar: &'a dyn TradingCalendar,
    gate: MarketWindowGate,
    concurrent_fanout: bool,
}

impl<'a> Dispatcher<'a> {
    /// Dispatcher with the default one-hour gate and concurrent fan-out.
    pub fn new(
        registry: &'a ChannelRegistry,
        senders: &'a Senders,
        enrichment: &'a dyn EnrichmentProvider,
        calendar: &'a dyn TradingCalendar,
    ) -> Self {
        Dispatcher {
            registry,
            senders,
            enrichment,
            calendar,
            gate: MarketWindowGate::default(),
            concurrent_fanout: true,
        }
    }

    /// Replaces the admission gate.
    pub fn with_gate(mut self, gate: MarketWindowGate) -> Self {
        self.gate = gate;
        self
    }

    /// Chooses between concurrent and sequential channel sends.
    pub fn with_concurrent_fanout(mut self, concurrent: bool) -> Self {
        self.concurrent_fanout = concurrent;
        self
    }

    /// Exchange-local trading date of the alert.
    pub fn exchange_date(&self, alert: &Alert) -> NaiveDate {
        alert
            .observed_at
            .with_timezone(&self.calendar.timezone())
            .date_naive()
    }

    /// Runs one alert through gate, enrichment and fan-out.
    pub fn dispatch(&self, alert: &Alert) -> Vec<DispatchOutcome> {
        if !self.gate.admit(&alert.observed_at, self.calendar) {
            info!(
                "Alert outside trading window ticker={} observed_at={}",
                alert.symbol,
                alert.observed_at.to_rfc3339()
            );
            return Vec::new();
        }

        if self.registry.is_empty() {
            warn!("No notifications sent - no channels configured ticker={}", alert.symbol);
            return Vec::new();
        }

        let ticker = match self.enrich(alert) {
            Ok(ticker) => ticker,
            Err(e) => {
                error!("Failed to fetch ticker data ticker={} error={}", alert.symbol, e);
                return vec![DispatchOutcome::pipeline_failure(&e)];
            }
        };
        info!("Ticker data fetched successfully ticker={}", alert.symbol);

        if self.concurrent_fanout && self.registry.len() > 1 {
            self.fan_out_concurrent(&ticker)
        } else {
            self.fan_out_sequential(&ticker)
        }
    }

    fn enrich(&self, alert: &Alert) -> Result<EnrichedTicker, EnrichmentError> {
        let ticker = self.enrichment.enrich(&alert.symbol)?;
        if ticker.symbol != alert.symbol {
            return Err(EnrichmentError::Malformed(format!(
                "asked for {} but received {}",
                alert.symbol, ticker.symbol
            )));
        }
        Ok(ticker)
    }

    fn fan_out_sequential(&self, ticker: &EnrichedTicker) -> Vec<DispatchOutcome> {
        self.registry
            .iter()
            .map(|endpoint| {
                panic::catch_unwind(AssertUnwindSafe(|| self.deliver(endpoint, ticker)))
                    .unwrap_or_else(|_| sender_panicked(endpoint, ticker))
            })
            .collect()
    }

    fn fan_out_concurrent(&self, ticker: &EnrichedTicker) -> Vec<DispatchOutcome> {
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .registry
                .iter()
                .map(|endpoint| (endpoint, scope.spawn(move || self.deliver(endpoint, ticker))))
                .collect();
            handles
                .into_iter()
                .map(|(endpoint, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| sender_panicked(endpoint, ticker))
                })
                .collect()
        })
    }

    fn deliver(&self, endpoint: &ChannelEndpoint, ticker: &EnrichedTicker) -> DispatchOutcome {
        match self.senders.for_kind(endpoint.kind()).send(endpoint, ticker) {
            Ok(()) => {
                info!(
                    "Notification sent successfully ticker={} platform={} channel={}",
                    ticker.symbol,
                    endpoint.kind(),
                    endpoint.redacted()
                );
                DispatchOutcome::delivered(endpoint)
            }
            Err(e) => {
                error!(
                    "Failed to send notification ticker={} platform={} channel={} error={}",
                    ticker.symbol,
                    endpoint.kind(),
                    endpoint.redacted(),
                    e
                );
                DispatchOutcome::failed(endpoint, e.to_string())
            }
        }
    }
}

fn sender_panicked(endpoint: &ChannelEndpoint, ticker: &EnrichedTicker) -> DispatchOutcome {
    error!(
        "Sender panicked ticker={} platform={} channel={}",
        ticker.symbol,
        endpoint.kind(),
        endpoint.redacted()
    );
    DispatchOutcome::failed(endpoint, "sender panicked".to_string())
}
