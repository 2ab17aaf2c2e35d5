//! Error types shared between client and server.
//!
//! `WatchError` unifies I/O, serialization, channel and configuration failures so
//! crates can propagate a single error type. Two narrower enums describe the
//! failures of the external collaborators the dispatcher talks to:
//! `EnrichmentError` aborts a whole alert, `ChannelSendError` is scoped to one
//! delivery channel.
use std::io;

use thiserror::Error;

/// Unified error type shared by client and server.
#[derive(Error, Debug)]
pub enum WatchError {
    /// I/O error originating from the standard library or sockets/files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// A string that does not have the shape of a ticker symbol.
    #[error("Invalid ticker symbol: {0:?}")]
    InvalidSymbol(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Crossbeam channel send failed (receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Crossbeam channel receive failed (sender closed); contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),

    /// Invalid or insufficient startup configuration. Fatal to process start.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The enrichment provider could not produce a ticker record.
    #[error("Enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    /// A single delivery channel rejected or failed to receive a notification.
    #[error("Channel delivery error: {0}")]
    Delivery(#[from] ChannelSendError),
}

/// Failure of the enrichment collaborator for one symbol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    /// The provider could not be reached (connect error, timeout, 5xx).
    #[error("enrichment provider unreachable: {0}")]
    Unreachable(String),

    /// The provider does not know the symbol.
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider answered with a document that could not be understood.
    #[error("malformed enrichment response: {0}")]
    Malformed(String),
}

/// Failure of one channel send.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelSendError {
    /// Network-level failure before a response was received.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The destination answered with a non-success status.
    #[error("rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code returned by the destination.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The endpoint cannot be used by this sender (wrong kind, missing credential).
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
