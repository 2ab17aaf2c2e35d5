//! Discord webhook sender.
//!
//! Posts a single embed per alert: `Company (SYMBOL)` as title, a two-line
//! description with price and volume, the company logo as thumbnail and a
//! transparent image to keep the embed at full width. A `429` answer is retried
//! once after the delay Discord asks for.
use std::thread;
use std::time::Duration;

use chrono::Utc;
use hvcwatch_common::format::format_number;
use hvcwatch_common::{ChannelSendError, EnrichedTicker};
use log::{info, warn};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use super::{ChannelSender, rejected, transport_error};
use crate::model::registry::ChannelEndpoint;

/// Embed side bar colour.
pub const EMBED_COLOR: u32 = 0x03b2f8;
/// Embed footer text.
pub const EMBED_FOOTER: &str = "HVC Watch · Major's Bots";
/// Upper bound on the rate-limit wait we are willing to honour.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct WebhookPayload {
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<EmbedImage>,
    image: EmbedImage,
    footer: EmbedFooter,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct EmbedImage {
    url: String,
}

#[derive(Debug, Serialize)]
struct EmbedFooter {
    text: String,
}

#[derive(Debug, Deserialize)]
struct RateLimited {
    retry_after: f64,
}

/// Sends ticker embeds to Discord incoming webhooks.
pub struct DiscordSender {
    client: Client,
    transparent_png: String,
}

impl DiscordSender {
    /// Creates a sender; `transparent_png` is used as the embed image.
    pub fn new(client: Client, transparent_png: &str) -> Self {
        DiscordSender {
            client,
            transparent_png: transparent_png.to_string(),
        }
    }

    fn payload(&self, ticker: &EnrichedTicker) -> WebhookPayload {
        let thumbnail = (!ticker.logo_url.is_empty()).then(|| EmbedImage {
            url: ticker.logo_url.clone(),
        });
        WebhookPayload {
            embeds: vec![Embed {
                title: format!("{} ({})", ticker.company_name, ticker.symbol),
                description: build_description(ticker),
                color: EMBED_COLOR,
                thumbnail,
                image: EmbedImage {
                    url: self.transparent_png.clone(),
                },
                footer: EmbedFooter {
                    text: EMBED_FOOTER.to_string(),
                },
                timestamp: Utc::now().to_rfc3339(),
            }],
        }
    }

    fn post(&self, endpoint: &ChannelEndpoint, payload: &WebhookPayload) -> Result<Response, ChannelSendError> {
        self.client
            .post(endpoint.address().clone())
            .json(payload)
            .send()
            .map_err(transport_error)
    }
}

impl ChannelSender for DiscordSender {
    fn send(&self, endpoint: &ChannelEndpoint, ticker: &EnrichedTicker) -> Result<(), ChannelSendError> {
        info!("Sending to Discord ticker={} channel={}", ticker.symbol, endpoint.redacted());
        let payload = self.payload(ticker);
        let mut response = self.post(endpoint, &payload)?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let wait = response
                .json::<RateLimited>()
                .map(|r| Duration::from_secs_f64(r.retry_after.max(0.0)))
                .unwrap_or(Duration::from_secs(1))
                .min(MAX_RETRY_AFTER);
            warn!(
                "Discord rate limited ticker={} channel={}, retrying in {:?}",
                ticker.symbol,
                endpoint.redacted(),
                wait
            );
            thread::sleep(wait);
            response = self.post(endpoint, &payload)?;
        }

        info!("Discord response status_code={}", response.status().as_u16());
        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejected(response))
        }
    }
}

/// Embed description: price line and volume line.
pub fn build_description(ticker: &EnrichedTicker) -> String {
    let volume = format_number(ticker.current_volume as f64);
    let volume_line = match (ticker.volume_20d_average, ticker.volume_ratio()) {
        (Some(average), Some(ratio)) => format!(
            "Volume vs avg: {} / {} **{:.2}x**",
            volume,
            format_number(average),
            ratio
        ),
        (Some(average), None) => format!("Volume vs avg: {} / {}", volume, format_number(average)),
        (None, _) => format!("Volume: {} (insufficient data for average)", volume),
    };
    [format!("Current price: ${:.2}", ticker.price), volume_line].join("\n")
}
