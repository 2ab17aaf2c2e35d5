//! Mastodon status sender.
//!
//! Posts a public status through `POST /api/v1/statuses` on the configured server
//! using the account's access token. Status text is capped at
//! `MAX_STATUS_CHARS` characters; longer text is cut and suffixed with `...`.
use hvcwatch_common::format::format_number;
use hvcwatch_common::{ChannelSendError, EnrichedTicker};
use log::{error, info, warn};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;

use super::{ChannelSender, rejected, transport_error};
use crate::model::registry::ChannelEndpoint;

/// Recommended maximum status length, in characters.
pub const MAX_STATUS_CHARS: usize = 450;

#[derive(Debug, Deserialize)]
struct PostedStatus {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

/// Posts ticker statuses to Mastodon.
pub struct MastodonSender {
    client: Client,
}

impl MastodonSender {
    /// Creates a sender using `client` for all servers.
    pub fn new(client: Client) -> Self {
        MastodonSender { client }
    }
}

impl ChannelSender for MastodonSender {
    fn send(&self, endpoint: &ChannelEndpoint, ticker: &EnrichedTicker) -> Result<(), ChannelSendError> {
        info!("Sending to Mastodon ticker={} channel={}", ticker.symbol, endpoint.redacted());
        let token = endpoint.credential().ok_or_else(|| {
            ChannelSendError::InvalidEndpoint(format!("{} has no access token", endpoint.redacted()))
        })?;
        let url = statuses_url(endpoint.address())?;
        let status = build_status(ticker);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .form(&[("status", status.as_str()), ("visibility", "public")])
            .send()
            .map_err(|e| {
                error!("Failed to post Mastodon status ticker={} error={}", ticker.symbol, e);
                transport_error(e)
            })?;

        if !response.status().is_success() {
            let err = rejected(response);
            error!("Failed to post Mastodon status ticker={} error={}", ticker.symbol, err);
            return Err(err);
        }

        match response.json::<PostedStatus>() {
            Ok(posted) => info!(
                "Mastodon status posted ticker={} status_id={} url={}",
                ticker.symbol,
                posted.id,
                posted.url.unwrap_or_default()
            ),
            Err(e) => warn!("Mastodon status posted but response was unreadable ticker={} error={}", ticker.symbol, e),
        }
        Ok(())
    }
}

/// Statuses endpoint under `server`. A server installed below a path prefix keeps
/// its last segment even when configured without a trailing slash.
pub fn statuses_url(server: &Url) -> Result<Url, ChannelSendError> {
    let mut base = server.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("api/v1/statuses")
        .map_err(|e| ChannelSendError::InvalidEndpoint(e.to_string()))
}

/// Status text for one ticker, truncated to `MAX_STATUS_CHARS` plus `...` if needed.
pub fn build_status(ticker: &EnrichedTicker) -> String {
    let volume = format_number(ticker.current_volume as f64);
    let volume_line = match (ticker.volume_20d_average, ticker.volume_ratio()) {
        (Some(average), Some(ratio)) => format!(
            "📊 Volume: {} (avg: {}, {:.2}x)",
            volume,
            format_number(average),
            ratio
        ),
        (Some(average), None) => format!("📊 Volume: {} (avg: {})", volume, format_number(average)),
        (None, _) => format!("📊 Volume: {}", volume),
    };
    let status = [
        format!("🔔 {} (${})", ticker.company_name, ticker.symbol),
        String::new(),
        format!("💰 Price: ${:.2}", ticker.price),
        volume_line,
        String::new(),
        format!("#stocks #{} #trading", ticker.symbol),
    ]
    .join("\n");

    if status.chars().count() <= MAX_STATUS_CHARS {
        return status;
    }
    warn!("Status exceeds recommended length, truncating ticker={}", ticker.symbol);
    let mut truncated: String = status.chars().take(MAX_STATUS_CHARS).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(name: &str, average: Option<f64>) -> EnrichedTicker {
        EnrichedTicker {
            symbol: "TSLA".parse().unwrap(),
            company_name: name.to_string(),
            logo_url: String::new(),
            price: 250.5,
            current_volume: 2_600_000,
            volume_20d_average: average,
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn statuses_url_at_server_root() {
        assert_eq!(
            statuses_url(&url("https://mastodon.social")).unwrap().as_str(),
            "https://mastodon.social/api/v1/statuses"
        );
    }

    #[test]
    fn statuses_url_keeps_path_prefix() {
        assert_eq!(
            statuses_url(&url("https://host.example/social")).unwrap().as_str(),
            "https://host.example/social/api/v1/statuses"
        );
        assert_eq!(
            statuses_url(&url("https://host.example/social/")).unwrap().as_str(),
            "https://host.example/social/api/v1/statuses"
        );
    }

    #[test]
    fn status_with_average() {
        let status = build_status(&ticker("Tesla Inc", Some(2_000_000.0)));
        assert!(status.starts_with("🔔 Tesla Inc ($TSLA)"));
        assert!(status.contains("💰 Price: $250.50"));
        assert!(status.contains("📊 Volume: 3M (avg: 2M, 1.30x)"));
        assert!(status.ends_with("#stocks #TSLA #trading"));
    }

    #[test]
    fn status_without_average_omits_it() {
        let status = build_status(&ticker("Tesla Inc", None));
        assert!(status.contains("📊 Volume: 3M\n"));
        assert!(!status.contains("avg:"));
    }

    #[test]
    fn long_status_is_truncated() {
        let status = build_status(&ticker(&"A".repeat(500), Some(1.0)));
        assert_eq!(status.chars().count(), MAX_STATUS_CHARS + 3);
        assert!(status.ends_with("..."));
    }

    #[test]
    fn short_status_is_untouched() {
        let status = build_status(&ticker("Tesla Inc", None));
        assert!(status.chars().count() < MAX_STATUS_CHARS);
        assert!(!status.ends_with("..."));
    }
}
