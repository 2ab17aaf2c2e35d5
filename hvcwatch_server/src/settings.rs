//! Command line and environment configuration of the server.
//!
//! Every option can also be given through the environment variable named next
//! to it, which is how deployments configure the service.
use chrono::TimeDelta;
use clap::Parser;
use log::{LevelFilter, warn};

use crate::model::registry::{ChannelKind, RawEndpoint, RegistryRules};

/// Default embed image keeping Discord embeds at full width.
pub const DEFAULT_TRANSPARENT_PNG: &str = "https://major.io/transparent.png";

/// HVC Watch alert server.
#[derive(Parser, Debug, Clone)]
#[command(name = "hvcwatch_server")]
#[command(about = "Gates stock alerts to market hours and fans them out to Discord and Mastodon")]
pub struct Settings {
    /// Legacy single Discord webhook URL.
    #[arg(long, env = "DISCORD_WEBHOOK_URL")]
    pub discord_webhook_url: Option<String>,

    /// Discord webhook URLs, comma separated.
    #[arg(long, env = "DISCORD_WEBHOOK_URLS", value_delimiter = ',')]
    pub discord_webhook_urls: Vec<String>,

    /// Mastodon server URL, e.g. https://mastodon.social.
    #[arg(long, env = "MASTODON_SERVER_URL")]
    pub mastodon_server_url: Option<String>,

    /// Mastodon access token.
    #[arg(long, env = "MASTODON_ACCESS_TOKEN", hide_env_values = true)]
    pub mastodon_access_token: Option<String>,

    /// Base URL of the enrichment service (`GET {base}/{SYMBOL}`).
    #[arg(long, env = "HVCWATCH_ENRICHMENT_URL")]
    pub enrichment_url: String,

    /// Image URL used to keep Discord embeds at full width.
    #[arg(long, env = "HVCWATCH_TRANSPARENT_PNG", default_value = DEFAULT_TRANSPARENT_PNG)]
    pub transparent_png: String,

    /// Intake listen address.
    #[arg(long, env = "HVCWATCH_BIND", default_value = "0.0.0.0:8025")]
    pub bind: String,

    /// Minutes before the open and after the close during which alerts are still sent.
    #[arg(long, env = "HVCWATCH_WINDOW_BUFFER_MINUTES", default_value_t = 60)]
    pub window_buffer_minutes: i64,

    /// Send to channels one after another instead of concurrently.
    #[arg(long, env = "HVCWATCH_SEQUENTIAL_FANOUT")]
    pub sequential_fanout: bool,

    /// Refuse to start without any delivery channel.
    #[arg(long, env = "HVCWATCH_REQUIRE_CHANNEL", default_value_t = true, action = clap::ArgAction::Set)]
    pub require_channel: bool,

    /// Channel kinds that must each have at least one channel, comma separated.
    #[arg(long, env = "HVCWATCH_REQUIRED_CHANNELS", value_delimiter = ',', value_enum)]
    pub required_channels: Vec<ChannelKind>,

    /// HTTP timeout for enrichment and delivery requests, in seconds.
    #[arg(long, env = "HVCWATCH_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Seconds an intake connection may take to deliver its message.
    #[arg(long, env = "HVCWATCH_INTAKE_READ_TIMEOUT_SECS", default_value_t = 5)]
    pub intake_read_timeout_secs: u64,

    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, env = "HVCWATCH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Settings {
    /// Raw endpoint list in configuration order: legacy Discord URL, current
    /// Discord URLs, then Mastodon. The registry deduplicates overlaps.
    pub fn endpoints(&self) -> Vec<RawEndpoint> {
        let mut endpoints: Vec<RawEndpoint> = self
            .discord_webhook_url
            .iter()
            .chain(self.discord_webhook_urls.iter())
            .map(|url| RawEndpoint::new(ChannelKind::Discord, url.as_str()))
            .collect();

        match (&self.mastodon_server_url, &self.mastodon_access_token) {
            (Some(server), Some(token)) => {
                endpoints.push(RawEndpoint::with_credential(ChannelKind::Mastodon, server.as_str(), token.as_str()))
            }
            (None, None) => {}
            _ => warn!("Mastodon needs both a server URL and an access token, skipping it"),
        }
        endpoints
    }

    /// Startup requirements for the channel registry.
    pub fn registry_rules(&self) -> RegistryRules {
        RegistryRules {
            require_any: self.require_channel,
            required_kinds: self.required_channels.clone(),
        }
    }

    /// Parsed log level; unknown names fall back to `info`.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            warn!("Unknown log level {:?}, using info", self.log_level);
            LevelFilter::Info
        })
    }

    /// Market window buffer; negative values are treated as zero.
    pub fn window_buffer(&self) -> TimeDelta {
        TimeDelta::minutes(self.window_buffer_minutes.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Settings {
        let mut argv = vec!["hvcwatch_server", "--enrichment-url", "http://localhost:9000"];
        argv.extend_from_slice(args);
        Settings::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let settings = parse(&[]);
        assert_eq!(settings.bind, "0.0.0.0:8025");
        assert_eq!(settings.transparent_png, DEFAULT_TRANSPARENT_PNG);
        assert_eq!(settings.window_buffer(), TimeDelta::minutes(60));
        assert!(settings.require_channel);
        assert!(!settings.sequential_fanout);
        assert_eq!(settings.level_filter(), LevelFilter::Info);
        assert_eq!(settings.intake_read_timeout_secs, 5);
    }

    #[test]
    fn legacy_discord_url_comes_first() {
        let settings = parse(&[
            "--discord-webhook-url",
            "https://discord.com/api/webhooks/0/legacy",
            "--discord-webhook-urls",
            "https://discord.com/api/webhooks/1/a,https://discord.com/api/webhooks/2/b",
        ]);
        let addresses: Vec<String> = settings.endpoints().into_iter().map(|e| e.address).collect();
        assert_eq!(
            addresses,
            vec![
                "https://discord.com/api/webhooks/0/legacy",
                "https://discord.com/api/webhooks/1/a",
                "https://discord.com/api/webhooks/2/b",
            ]
        );
    }

    #[test]
    fn half_configured_mastodon_is_skipped() {
        let settings = parse(&["--mastodon-server-url", "https://mastodon.social"]);
        assert!(settings.endpoints().is_empty());

        let settings = parse(&[
            "--mastodon-server-url",
            "https://mastodon.social",
            "--mastodon-access-token",
            "tok",
        ]);
        let endpoints = settings.endpoints();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].credential.as_deref(), Some("tok"));
    }

    #[test]
    fn registry_rules_follow_flags() {
        let settings = parse(&["--require-channel", "false", "--required-channels", "mastodon,discord"]);
        let rules = settings.registry_rules();
        assert!(!rules.require_any);
        assert_eq!(rules.required_kinds, vec![ChannelKind::Mastodon, ChannelKind::Discord]);
    }

    #[test]
    fn log_level_names() {
        assert_eq!(parse(&["--log-level", "DEBUG"]).level_filter(), LevelFilter::Debug);
        assert_eq!(parse(&["--log-level", "loud"]).level_filter(), LevelFilter::Info);
    }

    #[test]
    fn negative_buffer_is_clamped() {
        let settings = parse(&["--window-buffer-minutes=-5"]);
        assert_eq!(settings.window_buffer(), TimeDelta::zero());
    }
}
