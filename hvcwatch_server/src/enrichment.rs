//! Enrichment provider seam.
//!
//! The dispatcher only needs `symbol -> EnrichedTicker`. Upstream market-data
//! protocols live behind an enrichment service; `HttpEnrichment` fetches the
//! finished record from `GET {base}/{SYMBOL}`. Closures implement the trait too,
//! which is what tests use.
use hvcwatch_common::tickers::logo_url_for;
use hvcwatch_common::{EnrichedTicker, EnrichmentError, Result, TickerSymbol, WatchError};
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};

/// Supplies market and company data for one symbol.
pub trait EnrichmentProvider: Send + Sync {
    /// Fetches the record for `symbol`.
    fn enrich(&self, symbol: &TickerSymbol) -> std::result::Result<EnrichedTicker, EnrichmentError>;
}

impl<F> EnrichmentProvider for F
where
    F: Fn(&TickerSymbol) -> std::result::Result<EnrichedTicker, EnrichmentError> + Send + Sync,
{
    fn enrich(&self, symbol: &TickerSymbol) -> std::result::Result<EnrichedTicker, EnrichmentError> {
        self(symbol)
    }
}

/// Enrichment service reached over HTTP.
pub struct HttpEnrichment {
    client: Client,
    base_url: Url,
}

impl HttpEnrichment {
    /// Creates a provider for `base_url`; a trailing slash is added if missing.
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| WatchError::Configuration(format!("invalid enrichment URL: {}", e)))?;
        Ok(HttpEnrichment { client, base_url })
    }

    fn url_for(&self, symbol: &TickerSymbol) -> std::result::Result<Url, EnrichmentError> {
        self.base_url
            .join(symbol.as_str())
            .map_err(|e| EnrichmentError::Malformed(e.to_string()))
    }
}

impl EnrichmentProvider for HttpEnrichment {
    fn enrich(&self, symbol: &TickerSymbol) -> std::result::Result<EnrichedTicker, EnrichmentError> {
        info!("Fetching ticker data for notifications ticker={}", symbol);
        let response = self
            .client
            .get(self.url_for(symbol)?)
            .send()
            .map_err(|e| EnrichmentError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(EnrichmentError::SymbolNotFound(symbol.to_string()));
        }
        if status.is_server_error() {
            return Err(EnrichmentError::Unreachable(format!("provider answered {}", status)));
        }
        if !status.is_success() {
            return Err(EnrichmentError::Malformed(format!("unexpected status {}", status)));
        }

        let mut ticker: EnrichedTicker = response
            .json()
            .map_err(|e| EnrichmentError::Malformed(e.to_string()))?;
        if ticker.logo_url.is_empty() {
            ticker.logo_url = logo_url_for(&ticker.symbol);
        }
        debug!("Enrichment record {:?}", ticker);
        Ok(ticker)
    }
}
