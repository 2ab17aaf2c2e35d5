//! Command line arguments of the intake client.
use chrono::{DateTime, FixedOffset};
use clap::{ArgGroup, Parser};

/// Pushes alert subjects to the HVC Watch server.
#[derive(Parser, Debug)]
#[command(name = "hvcwatch_client")]
#[command(group(ArgGroup::new("input").required(true).args(["subject", "path"])))]
pub struct Args {
    /// Server IP address or host name.
    #[arg(long)]
    pub server_ip: String,

    /// Server intake port; defaults to the standard intake port.
    #[arg(long)]
    pub port: Option<u16>,

    /// A single subject line to send.
    #[arg(long)]
    pub subject: Option<String>,

    /// File with one subject per line.
    #[arg(long)]
    pub path: Option<String>,

    /// Arrival time to report (RFC 3339); defaults to now.
    #[arg(long)]
    pub received_at: Option<DateTime<FixedOffset>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_or_path_is_required() {
        assert!(Args::try_parse_from(["hvcwatch_client", "--server-ip", "127.0.0.1"]).is_err());
        let args = Args::try_parse_from([
            "hvcwatch_client",
            "--server-ip",
            "127.0.0.1",
            "--subject",
            "Alert: AAPL breakout",
            "--received-at",
            "2024-06-03T09:15:00-04:00",
        ])
        .unwrap();
        assert_eq!(args.subject.as_deref(), Some("Alert: AAPL breakout"));
        assert_eq!(args.received_at.unwrap().offset().local_minus_utc(), -4 * 3600);
    }
}
