//!
//! Common types and utilities shared by the hvcwatch server and client.
//!
//! This crate aggregates:
//! - `error`: unified error type `WatchError` plus the enrichment and channel-send errors.
//! - `result`: handy `Result<T, WatchError>` alias.
//! - `tickers`: ticker symbols and extraction of symbols from alert subjects.
//! - `alert`: alert, timeframe and enriched ticker records.
//! - `message`: intake payload pushed from the mailbox side to the server.
//! - `format`: compact number formatting used by notification text.
//! - `net`: networking constants and small helpers.
#![warn(missing_docs)]
pub mod alert;
pub mod error;
pub mod format;
pub mod message;
pub mod net;
pub mod result;
pub mod tickers;

pub use alert::{Alert, EnrichedTicker, Timeframe};
pub use error::{ChannelSendError, EnrichmentError, WatchError};
pub use message::InboundMessage;
pub use result::Result;
pub use tickers::TickerSymbol;
