//! HVC Watch alert server library.
//!
//! Turns inbound alert messages into per-symbol alerts, gates them to the NYSE
//! trading window, enriches each admitted alert once and delivers the same
//! enriched record to every configured channel:
//!
//! - `receiver`: TCP intake of `InboundMessage`s.
//! - `pipeline`: subject extraction, repeat suppression and dispatch per message.
//! - `model`: calendar, gate, channel registry, dispatcher and alert ledger.
//! - `enrichment`: the `EnrichmentProvider` seam and its HTTP implementation.
//! - `channels`: Discord and Mastodon senders.
//! - `settings`: clap/env configuration.
#![warn(missing_docs)]
pub mod channels;
pub mod enrichment;
pub mod model;
pub mod pipeline;
pub mod receiver;
pub mod settings;
pub mod version;
