//! Configured delivery channels.
//!
//! `ChannelRegistry::build` turns the raw, possibly duplicated configuration list
//! into a stable, validated set of endpoints:
//! - addresses are trimmed and parsed; scheme and host are case-folded, the path
//!   (which carries webhook secrets) keeps its case;
//! - blank entries are skipped;
//! - within a kind, endpoints with the same normalized address collapse to the
//!   first occurrence, so legacy and current configuration fields may overlap;
//! - iteration order is the de-duplicated configuration order.
//!
//! The registry is built once at startup and only read afterwards.
use std::collections::HashSet;
use std::fmt;

use clap::ValueEnum;
use hvcwatch_common::{Result, WatchError};
use log::debug;
use reqwest::Url;
use strum_macros::{Display, EnumString};

/// Number of trailing secret characters kept visible in redacted addresses.
const VISIBLE_SECRET_CHARS: usize = 4;

/// Kind of delivery destination. Adding a kind means adding a variant here and
/// one sender implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, ValueEnum)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ChannelKind {
    /// Discord incoming webhook.
    Discord,
    /// Mastodon account posting public statuses.
    Mastodon,
}

/// One configuration entry before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEndpoint {
    /// Destination kind.
    pub kind: ChannelKind,
    /// Webhook URL or server URL.
    pub address: String,
    /// Access token for kinds that authenticate separately from the address.
    pub credential: Option<String>,
}

impl RawEndpoint {
    /// Entry whose address is self-contained (webhooks).
    pub fn new(kind: ChannelKind, address: impl Into<String>) -> Self {
        RawEndpoint {
            kind,
            address: address.into(),
            credential: None,
        }
    }

    /// Entry made of a server address and an access token.
    pub fn with_credential(kind: ChannelKind, address: impl Into<String>, credential: impl Into<String>) -> Self {
        RawEndpoint {
            kind,
            address: address.into(),
            credential: Some(credential.into()),
        }
    }
}

/// Stable identifier derived from the kind and normalized address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(String);

impl ChannelId {
    fn derive(kind: ChannelKind, dedup_key: &str) -> Self {
        let hash = blake3::hash(format!("{}|{}", kind, dedup_key).as_bytes());
        ChannelId(format!("{}-{}", kind, &hash.to_hex()[..12]))
    }

    /// Identifier text, e.g. `discord-3f9a0c1b2d4e`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated, normalized delivery destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEndpoint {
    id: ChannelId,
    kind: ChannelKind,
    address: Url,
    credential: Option<String>,
}

impl ChannelEndpoint {
    fn from_raw(raw: &RawEndpoint) -> Result<Option<Self>> {
        let trimmed = raw.address.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let address = Url::parse(trimmed).map_err(|e| {
            WatchError::Configuration(format!("{} address is not a valid URL: {}", raw.kind, e))
        })?;
        if !matches!(address.scheme(), "http" | "https") || address.host_str().is_none() {
            return Err(WatchError::Configuration(format!(
                "{} address must be an http(s) URL with a host",
                raw.kind
            )));
        }
        let credential = raw
            .credential
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        if raw.kind == ChannelKind::Mastodon && credential.is_none() {
            return Err(WatchError::Configuration(
                "mastodon endpoint requires an access token".to_string(),
            ));
        }
        let dedup_key = match &credential {
            Some(token) => format!("{} {}", address, token),
            None => address.to_string(),
        };
        Ok(Some(ChannelEndpoint {
            id: ChannelId::derive(raw.kind, &dedup_key),
            kind: raw.kind,
            address,
            credential,
        }))
    }

    /// Stable identifier.
    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    /// Destination kind.
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Normalized address. Contains secrets for webhooks; never log it.
    pub fn address(&self) -> &Url {
        &self.address
    }

    /// Access token, for kinds that use one.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Address with secrets masked, safe for logs: scheme and host stay visible,
    /// the path and token only show their last characters.
    pub fn redacted(&self) -> String {
        let origin = format!(
            "{}://{}",
            self.address.scheme(),
            self.address.host_str().unwrap_or_default()
        );
        let path = self.address.path().trim_matches('/');
        let mut label = if path.is_empty() {
            format!("{}/", origin)
        } else {
            format!("{}/…{}", origin, visible_tail(path))
        };
        if let Some(token) = &self.credential {
            label.push_str(&format!(" (token …{})", visible_tail(token)));
        }
        label
    }
}

fn visible_tail(secret: &str) -> String {
    let count = secret.chars().count();
    secret
        .chars()
        .skip(count.saturating_sub(VISIBLE_SECRET_CHARS))
        .collect()
}

/// Startup requirements on the built registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryRules {
    /// Fail when no channel at all is configured.
    pub require_any: bool,
    /// Fail when any of these kinds has no channel.
    pub required_kinds: Vec<ChannelKind>,
}

/// Deduplicated, ordered set of delivery endpoints.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    endpoints: Vec<ChannelEndpoint>,
}

impl ChannelRegistry {
    /// Validates, normalizes and deduplicates `raw` in order, then checks `rules`.
    pub fn build<I>(raw: I, rules: &RegistryRules) -> Result<Self>
    where
        I: IntoIterator<Item = RawEndpoint>,
    {
        let mut seen = HashSet::new();
        let mut endpoints = Vec::new();
        for entry in raw {
            let Some(endpoint) = ChannelEndpoint::from_raw(&entry)? else {
                debug!("Skipping blank {} address", entry.kind);
                continue;
            };
            if seen.insert(endpoint.id.clone()) {
                endpoints.push(endpoint);
            } else {
                debug!("Duplicate {} endpoint {} collapsed", endpoint.kind, endpoint.redacted());
            }
        }
        let registry = ChannelRegistry { endpoints };

        if rules.require_any && registry.is_empty() {
            return Err(WatchError::Configuration(
                "no delivery channels configured".to_string(),
            ));
        }
        for kind in &rules.required_kinds {
            if registry.channels_of(*kind).is_empty() {
                return Err(WatchError::Configuration(format!(
                    "no {} channel configured",
                    kind
                )));
            }
        }
        Ok(registry)
    }

    /// Endpoints of one kind, in configuration order.
    pub fn channels_of(&self, kind: ChannelKind) -> Vec<&ChannelEndpoint> {
        self.endpoints.iter().filter(|e| e.kind == kind).collect()
    }

    /// All endpoints, in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelEndpoint> {
        self.endpoints.iter()
    }

    /// Number of endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether no endpoint is configured.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
