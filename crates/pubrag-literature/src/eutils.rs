//! NCBI E-utilities client (esearch + efetch).

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use pubrag_core::{defaults, Error, Result};

use crate::raw::{parse_pubmed_xml, RawPubmedArticle};
use crate::source::LiteratureSource;

/// Configuration for the E-utilities client.
#[derive(Debug, Clone)]
pub struct EutilsConfig {
    /// Base URL, without the `esearch.fcgi`/`efetch.fcgi` endpoint.
    pub base_url: String,
    /// Contact address NCBI asks every client to send.
    pub email: Option<String>,
    /// Raises the NCBI rate limit from 3 to 10 requests per second.
    pub api_key: Option<String>,
    /// Tool name reported with every request.
    pub tool: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for EutilsConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::EUTILS_URL.to_string(),
            email: None,
            api_key: None,
            tool: defaults::EUTILS_TOOL.to_string(),
            timeout_seconds: defaults::EUTILS_TIMEOUT_SECS,
        }
    }
}

impl EutilsConfig {
    /// Read configuration from `NCBI_*` environment variables.
    ///
    /// `NCBI_EMAIL` falls back to `EMAIL`.
    pub fn from_env() -> Result<Self> {
        let non_blank = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let timeout_seconds = match std::env::var("NCBI_TIMEOUT") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                Error::Config(format!("NCBI_TIMEOUT has an invalid value: {:?}", raw))
            })?,
            Err(_) => defaults::EUTILS_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url: non_blank("NCBI_EUTILS_URL")
                .unwrap_or_else(|| defaults::EUTILS_URL.to_string()),
            email: non_blank("NCBI_EMAIL").or_else(|| non_blank("EMAIL")),
            api_key: non_blank("NCBI_API_KEY"),
            tool: defaults::EUTILS_TOOL.to_string(),
            timeout_seconds,
        })
    }

    /// Request quota NCBI grants this configuration.
    pub fn requests_per_second(&self) -> u32 {
        if self.api_key.is_some() {
            defaults::EUTILS_REQUESTS_PER_SEC_WITH_KEY
        } else {
            defaults::EUTILS_REQUESTS_PER_SEC
        }
    }
}

/// Client-wide request quota (direct, no keyed bucketing).
type EutilsRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(default)]
    count: Option<String>,
    #[serde(rename = "ERROR", default)]
    error: Option<String>,
}

/// PubMed client over the NCBI E-utilities HTTP API.
///
/// Every search and fetch waits on one shared limiter, so concurrent fetches
/// stay within the NCBI quota.
pub struct EutilsClient {
    client: Client,
    config: EutilsConfig,
    limiter: Arc<EutilsRateLimiter>,
}

impl EutilsClient {
    pub fn new(config: EutilsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let per_second = config.requests_per_second();
        let quota = Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN));

        info!(
            subsystem = "literature",
            component = "eutils",
            url = %config.base_url,
            has_api_key = config.api_key.is_some(),
            requests_per_second = per_second,
            "Initializing E-utilities client"
        );

        Ok(Self {
            client,
            config,
            limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(EutilsConfig::from_env()?)
    }

    pub fn config(&self) -> &EutilsConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Parameters sent with every request.
    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", defaults::EUTILS_DB.to_string()),
            ("tool", self.config.tool.clone()),
        ];
        if let Some(email) = &self.config.email {
            params.push(("email", email.clone()));
        }
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    /// Map a non-success status; `fallback` keeps the caller's category.
    fn status_error(status: StatusCode, what: &str, fallback: fn(String) -> Error) -> Error {
        let message = format!("{} returned {}", what, status);
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Error::BackendUnavailable(message)
        } else {
            fallback(message)
        }
    }
}

#[async_trait]
impl LiteratureSource for EutilsClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let mut params = self.base_params();
        params.push(("term", query.to_string()));
        params.push(("retmax", limit.to_string()));
        params.push(("retmode", "json".to_string()));

        let start = std::time::Instant::now();
        self.limiter.until_ready().await;
        let response = self
            .client
            .get(self.url("esearch.fcgi"))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error(response.status(), "esearch", Error::Request));
        }

        let body: ESearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("esearch response: {}", e)))?;

        if let Some(message) = body.esearchresult.error {
            return Err(Error::Request(format!("esearch error: {}", message)));
        }

        let mut ids = body.esearchresult.idlist;
        ids.truncate(limit);

        info!(
            subsystem = "literature",
            component = "eutils",
            op = "search",
            total = body.esearchresult.count.as_deref().unwrap_or("?"),
            result_count = ids.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "PubMed search complete"
        );
        Ok(ids)
    }

    async fn fetch(&self, id: &str) -> Result<RawPubmedArticle> {
        let mut params = self.base_params();
        params.push(("id", id.to_string()));
        params.push(("retmode", "xml".to_string()));

        self.limiter.until_ready().await;
        let response = self
            .client
            .get(self.url("efetch.fcgi"))
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::from_transport(e, Error::Fetch))?;

        if !response.status().is_success() {
            return Err(Self::status_error(
                response.status(),
                &format!("efetch for PMID {}", id),
                Error::Fetch,
            ));
        }

        let xml = response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("PMID {}: failed to read body: {}", id, e)))?;

        let article = parse_pubmed_xml(&xml)
            .map_err(|e| Error::Fetch(format!("PMID {}: {}", id, e)))?
            .into_iter()
            .find(|a| a.pmid.as_deref() == Some(id))
            .ok_or_else(|| Error::Fetch(format!("PMID {}: not present in efetch response", id)))?;

        debug!(
            subsystem = "literature",
            component = "eutils",
            op = "fetch",
            pmid = %id,
            "Fetched PubMed record"
        );
        Ok(article)
    }
}
