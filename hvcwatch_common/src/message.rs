//! Intake payload exchanged between the mailbox side and the server.
//!
//! One `InboundMessage` is sent per TCP connection, JSON-encoded. The subject is
//! optional because mail without a subject still has to be acknowledged and
//! skipped by the server.
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A message that arrived in the watched mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Subject line, if the message had one.
    pub subject: Option<String>,
    /// Arrival time as reported by the mailbox, with its original offset.
    pub received_at: DateTime<FixedOffset>,
}

impl InboundMessage {
    /// Creates a message with the given subject and arrival time.
    pub fn new(subject: Option<String>, received_at: DateTime<FixedOffset>) -> Self {
        InboundMessage {
            subject,
            received_at,
        }
    }

    /// Encode the message to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a message from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
