//! Delivery channel senders.
//!
//! Each channel kind has exactly one `ChannelSender` implementation owning that
//! destination's wire format:
//! - `discord`: webhook embed with price and volume lines;
//! - `mastodon`: public status text with a length cap.
//!
//! `Senders` maps the closed `ChannelKind` enum onto those implementations, so the
//! dispatcher never deals with untyped "anything with a send method" objects.
use std::time::Duration;

use hvcwatch_common::{ChannelSendError, EnrichedTicker};
use reqwest::blocking::{Client, Response};

use crate::model::registry::{ChannelEndpoint, ChannelKind};

pub mod discord;
pub mod mastodon;

pub use discord::DiscordSender;
pub use mastodon::MastodonSender;

/// Longest response body kept in a `ChannelSendError::Rejected`.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Delivers one enriched ticker to one endpoint of a given kind.
pub trait ChannelSender: Send + Sync {
    /// Sends the notification. Retrying, if any, happens inside.
    fn send(&self, endpoint: &ChannelEndpoint, ticker: &EnrichedTicker) -> Result<(), ChannelSendError>;
}

/// One sender per channel kind.
pub struct Senders {
    discord: Box<dyn ChannelSender>,
    mastodon: Box<dyn ChannelSender>,
}

impl Senders {
    /// Builds the set from explicit implementations.
    pub fn new(discord: Box<dyn ChannelSender>, mastodon: Box<dyn ChannelSender>) -> Self {
        Senders { discord, mastodon }
    }

    /// HTTP senders sharing one client.
    pub fn http(client: Client, transparent_png: &str) -> Self {
        Senders::new(
            Box::new(DiscordSender::new(client.clone(), transparent_png)),
            Box::new(MastodonSender::new(client)),
        )
    }

    /// Sender responsible for `kind`.
    pub fn for_kind(&self, kind: ChannelKind) -> &dyn ChannelSender {
        match kind {
            ChannelKind::Discord => self.discord.as_ref(),
            ChannelKind::Mastodon => self.mastodon.as_ref(),
        }
    }
}

/// Blocking HTTP client used by senders and the enrichment provider.
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("hvcwatch/", env!("CARGO_PKG_VERSION")))
        .build()
}

fn transport_error(err: reqwest::Error) -> ChannelSendError {
    ChannelSendError::Transport(err.to_string())
}

/// Converts a non-success response into `Rejected`, keeping a short body excerpt.
fn rejected(response: Response) -> ChannelSendError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .unwrap_or_default()
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect();
    ChannelSendError::Rejected { status, body }
}
