//! Per-message processing: subject → alerts → dispatch.
use hvcwatch_common::tickers::extract_tickers;
use hvcwatch_common::{Alert, InboundMessage, TickerSymbol};
use log::{debug, info};

use crate::model::alert_ledger::AlertLedger;
use crate::model::dispatcher::{DispatchOutcome, Dispatcher};

/// Turns inbound messages into dispatched alerts, suppressing repeated weekly
/// and monthly alerts.
pub struct AlertPipeline<'a> {
    dispatcher: Dispatcher<'a>,
    ledger: AlertLedger,
}

impl<'a> AlertPipeline<'a> {
    /// Pipeline with an empty ledger.
    pub fn new(dispatcher: Dispatcher<'a>) -> Self {
        AlertPipeline {
            dispatcher,
            ledger: AlertLedger::new(),
        }
    }

    /// Processes one message and returns the outcomes per dispatched symbol.
    /// Symbols suppressed by the ledger are not part of the result.
    pub fn process_message(&mut self, message: &InboundMessage) -> Vec<(TickerSymbol, Vec<DispatchOutcome>)> {
        let Some(subject) = message.subject.as_deref() else {
            info!("Email has no subject");
            return Vec::new();
        };
        info!("Processing email subject={:?}", subject);

        let tickers = extract_tickers(subject);
        if tickers.is_empty() {
            info!("No tickers found in subject={:?}", subject);
            return Vec::new();
        }

        let mut results = Vec::with_capacity(tickers.len());
        for symbol in tickers {
            let alert = Alert::new(symbol, message.received_at, subject);
            let date = self.dispatcher.exchange_date(&alert);
            if !self.ledger.should_alert(&alert.symbol, alert.timeframe, date) {
                info!(
                    "Skipping repeated {} alert ticker={} date={}",
                    alert.timeframe, alert.symbol, date
                );
                continue;
            }

            let outcomes = self.dispatcher.dispatch(&alert);
            if outcomes.iter().any(|o| o.success) {
                self.ledger.record(&alert.symbol, alert.timeframe, date);
            } else {
                debug!("Nothing delivered for ticker={}, ledger untouched", alert.symbol);
            }
            results.push((alert.symbol, outcomes));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, FixedOffset};
    use hvcwatch_common::{ChannelSendError, EnrichedTicker, EnrichmentError};

    use super::*;
    use crate::channels::{ChannelSender, Senders};
    use crate::model::calendar::NyseCalendar;
    use crate::model::registry::{ChannelEndpoint, ChannelKind, ChannelRegistry, RawEndpoint, RegistryRules};

    struct Accepting;

    impl ChannelSender for Accepting {
        fn send(&self, _: &ChannelEndpoint, _: &EnrichedTicker) -> Result<(), ChannelSendError> {
            Ok(())
        }
    }

    fn record(symbol: &TickerSymbol) -> EnrichedTicker {
        EnrichedTicker {
            symbol: symbol.clone(),
            company_name: format!("{} Corp", symbol),
            logo_url: String::new(),
            price: 10.0,
            current_volume: 1_000,
            volume_20d_average: None,
        }
    }

    fn message(subject: Option<&str>, at: &str) -> InboundMessage {
        InboundMessage::new(
            subject.map(str::to_string),
            DateTime::<FixedOffset>::parse_from_rfc3339(at).unwrap(),
        )
    }

    fn registry() -> ChannelRegistry {
        ChannelRegistry::build(
            vec![RawEndpoint::new(ChannelKind::Discord, "https://discord.com/api/webhooks/1/a")],
            &RegistryRules::default(),
        )
        .unwrap()
    }

    #[test]
    fn every_extracted_symbol_is_dispatched() {
        let registry = registry();
        let senders = Senders::new(Box::new(Accepting), Box::new(Accepting));
        let calendar = NyseCalendar::default();
        let enrichment = |s: &TickerSymbol| -> Result<EnrichedTicker, EnrichmentError> { Ok(record(s)) };
        let mut pipeline = AlertPipeline::new(Dispatcher::new(&registry, &senders, &enrichment, &calendar));

        let results = pipeline.process_message(&message(
            Some("Alert: New symbols: ATAI, DFSU were added to HVC."),
            "2024-06-03T10:05:00-04:00",
        ));

        let symbols: Vec<&str> = results.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(symbols, vec!["ATAI", "DFSU"]);
        assert!(results.iter().all(|(_, outcomes)| outcomes.len() == 1 && outcomes[0].success));
    }

    #[test]
    fn message_without_subject_is_skipped() {
        let registry = registry();
        let senders = Senders::new(Box::new(Accepting), Box::new(Accepting));
        let calendar = NyseCalendar::default();
        let calls = AtomicUsize::new(0);
        let enrichment = |s: &TickerSymbol| -> Result<EnrichedTicker, EnrichmentError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(record(s))
        };
        let mut pipeline = AlertPipeline::new(Dispatcher::new(&registry, &senders, &enrichment, &calendar));

        assert!(pipeline.process_message(&message(None, "2024-06-03T10:05:00-04:00")).is_empty());
        assert!(
            pipeline
                .process_message(&message(Some("hello there"), "2024-06-03T10:05:00-04:00"))
                .is_empty()
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn weekly_alert_is_sent_once_per_week() {
        let registry = registry();
        let senders = Senders::new(Box::new(Accepting), Box::new(Accepting));
        let calendar = NyseCalendar::default();
        let enrichment = |s: &TickerSymbol| -> Result<EnrichedTicker, EnrichmentError> { Ok(record(s)) };
        let mut pipeline = AlertPipeline::new(Dispatcher::new(&registry, &senders, &enrichment, &calendar));
        let subject = Some("Weekly HVC: New symbol: NVDA was added to HVC weekly.");

        assert_eq!(pipeline.process_message(&message(subject, "2024-06-03T11:00:00-04:00")).len(), 1);
        assert!(pipeline.process_message(&message(subject, "2024-06-05T11:00:00-04:00")).is_empty());
        assert_eq!(pipeline.process_message(&message(subject, "2024-06-10T11:00:00-04:00")).len(), 1);
    }

    #[test]
    fn failed_delivery_does_not_consume_the_period() {
        let registry = registry();
        let senders = Senders::new(Box::new(Accepting), Box::new(Accepting));
        let calendar = NyseCalendar::default();
        let calls = AtomicUsize::new(0);
        let enrichment = |s: &TickerSymbol| -> Result<EnrichedTicker, EnrichmentError> {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(EnrichmentError::Unreachable("timeout".to_string()))
            } else {
                Ok(record(s))
            }
        };
        let mut pipeline = AlertPipeline::new(Dispatcher::new(&registry, &senders, &enrichment, &calendar));
        let subject = Some("Monthly HVC: New symbol: AMD was added to HVC monthly.");

        let first = pipeline.process_message(&message(subject, "2024-06-03T11:00:00-04:00"));
        assert!(!first[0].1[0].success);
        let second = pipeline.process_message(&message(subject, "2024-06-04T11:00:00-04:00"));
        assert!(second[0].1[0].success);
    }
}
