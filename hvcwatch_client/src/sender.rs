//! Sending intake messages to the server over TCP.
use std::io::{BufRead, Write};
use std::net::TcpStream;

use hvcwatch_common::{InboundMessage, Result};
use log::info;

/// Helper type for sending messages to the server.
pub struct MessageSender;

impl MessageSender {
    /// Writes one JSON-encoded message and closes the write half so the server
    /// sees the end of the payload.
    pub fn send_message(stream: &mut TcpStream, message: &InboundMessage) -> Result<()> {
        let payload = message.to_json_bytes()?;
        info!(
            "Sending subject {:?} received at {}",
            message.subject.as_deref().unwrap_or_default(),
            message.received_at.to_rfc3339()
        );
        stream.write_all(&payload)?;
        stream.shutdown(std::net::Shutdown::Write)?;
        Ok(())
    }
}

/// Reads subjects from `reader`, one per non-empty line.
pub fn read_subjects<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut subjects = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            subjects.push(trimmed.to_string());
        }
    }
    Ok(subjects)
}
