//! Route store module, the source of known direct routes.
//!
//! Production routes live in a document store fronted by an HTTP endpoint; a CSV export can be
//! served instead. Either way records are validated here so the router only sees typed edges.

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use route_finder_shared::routes::{Edge, RawRoute};
use std::{path::PathBuf, time};
use thiserror::Error;
use tokio::sync::Mutex;

const RATE_LIMIT_BACKOFF: time::Duration = time::Duration::from_millis(250);
const MAX_FETCH_ATTEMPTS: usize = 5;
pub const DEFAULT_FETCH_TIMEOUT: time::Duration = time::Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Error reading routes CSV.")]
    Csv(#[from] csv::Error),
    #[error("Error from reqwest.")]
    Reqwest(#[from] reqwest::Error),
    #[error("Rate limit for route source exceeded")]
    RateLimitExceeded,
    #[error("Bad response from route source.")]
    BadResponse(u16),
    #[error("Error deserializing JSON response from route source.")]
    ResponseConversionErr(serde_json::Error, String),
}

/// Which side of a route an airport code must match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Routes arriving at the airport
    To,
    /// Routes leaving the airport
    From,
}

#[async_trait::async_trait]
pub trait RouteStore: Send + Sync {
    /// Every known direct route, unfiltered
    async fn fetch_all_edges(&self) -> Result<Vec<Edge>, StoreError>;

    async fn fetch_direct_routes(
        &self,
        code: &str,
        direction: Direction,
    ) -> Result<Vec<Edge>, StoreError> {
        let edges = self.fetch_all_edges().await?;
        Ok(edges
            .into_iter()
            .filter(|edge| match direction {
                Direction::To => edge.destination == code,
                Direction::From => edge.origin == code,
            })
            .collect())
    }
}

/// Convert stored records into edges, dropping (and logging) any that fail validation
pub fn edges_from_raw(records: Vec<RawRoute>) -> Vec<Edge> {
    let total = records.len();
    let edges: Vec<Edge> = records
        .into_iter()
        .filter_map(|record| match Edge::try_from(record.clone()) {
            Ok(edge) => Some(edge),
            Err(e) => {
                warn!("Skipping route record {:?}: {}", record, e);
                None
            }
        })
        .collect();

    if edges.len() < total {
        warn!("Rejected {} of {} route records", total - edges.len(), total);
    }
    edges
}

pub struct MemoryRouteStore {
    edges: Vec<Edge>,
}

impl MemoryRouteStore {
    pub fn new(edges: Vec<Edge>) -> Self {
        MemoryRouteStore { edges }
    }
}

#[async_trait::async_trait]
impl RouteStore for MemoryRouteStore {
    async fn fetch_all_edges(&self) -> Result<Vec<Edge>, StoreError> {
        Ok(self.edges.clone())
    }
}

/// Reads `origin,destination,price` rows, re-read on every fetch
pub struct CsvRouteStore {
    path: PathBuf,
}

impl CsvRouteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvRouteStore { path: path.into() }
    }
}

#[async_trait::async_trait]
impl RouteStore for CsvRouteStore {
    async fn fetch_all_edges(&self) -> Result<Vec<Edge>, StoreError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(csv::Error::from)?;
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let records = rdr
            .deserialize::<RawRoute>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(edges_from_raw(records))
    }
}

/// Fetches a JSON array of route documents from an upstream endpoint
pub struct HttpRouteStore {
    client: reqwest::Client,
    url: String,
}

impl HttpRouteStore {
    pub fn new(url: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_timeout(url, DEFAULT_FETCH_TIMEOUT)
    }

    /// A hung upstream fails the fetch after `timeout` instead of stalling the caller
    pub fn with_timeout(url: impl Into<String>, timeout: time::Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpRouteStore {
            client,
            url: url.into(),
        })
    }

    async fn fetch_records_retry(&self) -> Result<Vec<RawRoute>, StoreError> {
        let mut attempt = 1;
        loop {
            match self.fetch_records().await {
                Err(StoreError::RateLimitExceeded) if attempt < MAX_FETCH_ATTEMPTS => {
                    info!("Route source rate limit hit, sleeping");
                    tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                    attempt += 1;
                }
                resp => break resp,
            }
        }
    }

    async fn fetch_records(&self) -> Result<Vec<RawRoute>, StoreError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| match e.status() {
                Some(reqwest::StatusCode::TOO_MANY_REQUESTS) => StoreError::RateLimitExceeded,
                Some(status) => StoreError::BadResponse(status.as_u16()),
                None => StoreError::Reqwest(e),
            })?
            .text()
            .await?;

        serde_json::from_str(&body).map_err(|e| StoreError::ResponseConversionErr(e, body))
    }
}

#[async_trait::async_trait]
impl RouteStore for HttpRouteStore {
    async fn fetch_all_edges(&self) -> Result<Vec<Edge>, StoreError> {
        let records = self.fetch_records_retry().await?;
        Ok(edges_from_raw(records))
    }
}

/// Keeps the full edge list of another store for a fixed time
pub struct CachedRouteStore<S> {
    inner: S,
    ttl: Duration,
    cached: Mutex<Option<(DateTime<Utc>, Vec<Edge>)>>,
}

impl<S: RouteStore> CachedRouteStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        CachedRouteStore {
            inner,
            ttl,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl<S: RouteStore> RouteStore for CachedRouteStore<S> {
    async fn fetch_all_edges(&self) -> Result<Vec<Edge>, StoreError> {
        let mut cached = self.cached.lock().await;

        if let Some((fetched_at, edges)) = cached.as_ref() {
            if Utc::now() - *fetched_at < self.ttl {
                return Ok(edges.clone());
            }
        }

        // Failed refreshes are not cached, the next request tries again
        let edges = self.inner.fetch_all_edges().await?;
        *cached = Some((Utc::now(), edges.clone()));
        Ok(edges)
    }
}
