//! Transport timing collection
//!
//! Measures one GET against a URL and reports four cumulative timestamps
//! relative to the start of the measurement:
//!
//! - `dns_lookup`: host name resolved
//! - `connect_time`: TCP connection to the resolved address established
//! - `start_transfer`: response headers received
//! - `total_time`: response body fully read
//!
//! Resolved addresses are tried in order and the HTTP exchange is pinned to the
//! first one that accepts a connection, so no second resolution happens. The connect phase is measured on its own probe
//! connection, which is closed before the request starts, so `start_transfer`
//! includes the request's own connection setup.
//!
//! Every measurement uses a client scoped to that call. It is dropped on every
//! exit path, so no pooled connection outlives the measurement.

use crate::config::HttpConfig;
use crate::error::StageError;
use crate::types::TransportTimings;
use crate::utils::seconds_to_millis;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::{Host, Url};

/// Raw measurement in fractional seconds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawTimings {
    /// Seconds until name resolution finished
    pub name_lookup: f64,
    /// Seconds until the TCP connection was established
    pub connect: f64,
    /// Seconds until response headers arrived
    pub start_transfer: f64,
    /// Seconds until the body was fully read
    pub total: f64,
}

impl RawTimings {
    /// Convert every value to whole milliseconds
    pub fn to_millis(&self) -> TransportTimings {
        TransportTimings {
            dns_lookup_ms: seconds_to_millis(self.name_lookup),
            connect_time_ms: seconds_to_millis(self.connect),
            start_transfer_ms: seconds_to_millis(self.start_transfer),
            total_time_ms: seconds_to_millis(self.total),
        }
    }
}

/// Trait for collecting transport timings
///
/// A failure invalidates the whole measurement; implementations never return
/// partial timings.
#[async_trait]
pub trait TimingCollector: Send + Sync {
    /// Measure one GET of `url`
    async fn measure(&self, url: &str) -> Result<TransportTimings, StageError>;
}

/// Timing collector performing its own resolve, connect and GET
pub struct HttpTimingCollector {
    config: HttpConfig,
}

impl HttpTimingCollector {
    /// Create a collector with the given HTTP settings
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    async fn resolve(&self, host: &Host<&str>, port: u16) -> Result<Vec<SocketAddr>, String> {
        match host {
            Host::Ipv4(ip) => Ok(vec![SocketAddr::new((*ip).into(), port)]),
            Host::Ipv6(ip) => Ok(vec![SocketAddr::new((*ip).into(), port)]),
            Host::Domain(domain) => {
                let addrs: Vec<SocketAddr> = timeout(
                    self.config.connect_timeout,
                    tokio::net::lookup_host((*domain, port)),
                )
                .await
                .map_err(|_| format!("DNS lookup for {} timed out", domain))?
                .map_err(|e| format!("DNS lookup for {} failed: {}", domain, e))?
                .collect();
                if addrs.is_empty() {
                    return Err(format!("DNS lookup for {} returned no addresses", domain));
                }
                Ok(addrs)
            }
        }
    }

    async fn transfer(&self, url: &str) -> Result<RawTimings, String> {
        let parsed = Url::parse(url).map_err(|e| format!("invalid URL {}: {}", url, e))?;
        let host = parsed
            .host()
            .ok_or_else(|| format!("URL {} has no host", url))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| format!("URL {} has no known port", url))?;

        let start = Instant::now();

        let addrs = self.resolve(&host, port).await?;
        let name_lookup = start.elapsed();

        let (stream, addr) = connect_first(&addrs, self.config.connect_timeout).await?;
        let connect = start.elapsed();
        drop(stream);

        let mut builder = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .connect_timeout(self.config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(self.config.max_redirects))
            .pool_max_idle_per_host(0);
        if let Host::Domain(domain) = host {
            builder = builder.resolve(domain, addr);
        }
        if let Some(agent) = &self.config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| format!("failed to create HTTP client: {}", e))?;

        let response = client.get(url).send().await.map_err(|e| e.to_string())?;
        let start_transfer = start.elapsed();

        let body = response.bytes().await.map_err(|e| e.to_string())?;
        let total = start.elapsed();
        debug!(url, bytes = body.len(), "timing transfer complete");

        Ok(RawTimings {
            name_lookup: name_lookup.as_secs_f64(),
            connect: connect.as_secs_f64(),
            start_transfer: start_transfer.as_secs_f64(),
            total: total.as_secs_f64(),
        })
    }
}

/// Connect to the first address in `addrs` that accepts, trying them in order
///
/// Each attempt gets its own `connect_timeout`. On failure the error names the
/// last address tried.
pub async fn connect_first(
    addrs: &[SocketAddr],
    connect_timeout: Duration,
) -> Result<(TcpStream, SocketAddr), String> {
    let mut last_error = String::from("no addresses to connect to");
    for &addr in addrs {
        match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => return Ok((stream, addr)),
            Ok(Err(e)) => last_error = format!("connect to {} failed: {}", addr, e),
            Err(_) => last_error = format!("connect to {} timed out", addr),
        }
        debug!(%addr, error = %last_error, "trying next address");
    }
    Err(last_error)
}

#[async_trait]
impl TimingCollector for HttpTimingCollector {
    async fn measure(&self, url: &str) -> Result<TransportTimings, StageError> {
        match self.transfer(url).await {
            Ok(raw) => {
                let timings = raw.to_millis();
                debug!(
                    url,
                    dns_lookup_ms = timings.dns_lookup_ms,
                    connect_time_ms = timings.connect_time_ms,
                    start_transfer_ms = timings.start_transfer_ms,
                    total_time_ms = timings.total_time_ms,
                    "collected transport timings"
                );
                Ok(timings)
            }
            Err(reason) => {
                warn!(url, error = %reason, "timing request failed");
                Err(StageError::TimingCollectionFailed { reason })
            }
        }
    }
}
