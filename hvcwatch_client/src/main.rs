//! HVC Watch client. Pushes alert subjects to the server's intake port, one TCP
//! connection per subject. Stands in for the mailbox side when testing a
//! deployment by hand.
//!
//! Usage example (CLI):
//! ```bash
//! hvcwatch_client --server-ip 127.0.0.1 --subject "Alert: New symbols: ATAI, DFSU were added to HVC."
//! hvcwatch_client --server-ip 127.0.0.1 --path ./subjects.txt --received-at 2024-06-03T09:45:00-04:00
//! ```
#![warn(missing_docs)]
mod args;
mod sender;

use crate::args::Args;
use crate::sender::{MessageSender, read_subjects};
use chrono::Local;
use clap::Parser;
use hvcwatch_common::net::{INTAKE_PORT, addr};
use hvcwatch_common::{InboundMessage, Result, WatchError};
use log::{error, info};
use std::fs::File;
use std::io::BufReader;
use std::net::TcpStream;
use std::path::PathBuf;

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let server_ip = args.server_ip.trim().replace('"', "");
    let server_address = addr(&server_ip, args.port.unwrap_or(INTAKE_PORT));
    let received_at = args
        .received_at
        .unwrap_or_else(|| Local::now().fixed_offset());

    let subjects = match (&args.subject, &args.path) {
        (Some(subject), _) => vec![subject.clone()],
        (None, Some(path)) => {
            let file = File::open(normalize_path(path))?;
            read_subjects(BufReader::new(file))?
        }
        (None, None) => Vec::new(),
    };
    info!("Sending {} subject(s) to {}", subjects.len(), server_address);

    let mut failed = 0;
    for subject in subjects {
        let message = InboundMessage::new(Some(subject), received_at);
        let sent = TcpStream::connect(&server_address)
            .map_err(|e| WatchError::Format(format!("Failed to connect to server: {}", e)))
            .and_then(|mut stream| MessageSender::send_message(&mut stream, &message));
        if let Err(e) = sent {
            error!("Sending error to server: {}", e);
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(WatchError::Format(format!("{} message(s) could not be sent", failed)));
    }
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}
