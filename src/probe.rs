//! Liveness probing
//!
//! One GET with redirects followed. A final status in `[200, 400)` is
//! reachable; any other status or any transport failure (DNS, refused
//! connection, TLS, timeout) is unreachable. Nothing is retried and no error
//! escapes the probe.

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::types::Reachability;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Build the HTTP client used for liveness and version requests
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects));
    if let Some(agent) = &config.user_agent {
        builder = builder.user_agent(agent.clone());
    }
    builder
        .build()
        .map_err(|e| Error::Other(format!("failed to create HTTP client: {}", e)))
}

/// Classify a final HTTP status
pub fn classify_status(status: u16) -> Reachability {
    if (200..400).contains(&status) {
        Reachability::Reachable { status }
    } else {
        Reachability::Unreachable {
            reason: format!("HTTP status {}", status),
        }
    }
}

/// Trait for checking whether a URL is up
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Probe `url` once; never fails
    async fn probe(&self, url: &str) -> Reachability;
}

/// Liveness probe backed by a reqwest client
pub struct HttpLivenessProbe {
    client: reqwest::Client,
}

impl HttpLivenessProbe {
    /// Create a probe using `client`
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LivenessProbe for HttpLivenessProbe {
    async fn probe(&self, url: &str) -> Reachability {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let result = classify_status(status);
                debug!(
                    url,
                    status,
                    reachable = result.is_reachable(),
                    final_url = %response.url(),
                    "liveness response"
                );
                result
            }
            Err(e) => {
                warn!(url, error = %e, "liveness request failed");
                Reachability::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe() -> HttpLivenessProbe {
        let config = HttpConfig {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            ..Default::default()
        };
        HttpLivenessProbe::new(build_http_client(&config).unwrap())
    }

    #[test]
    fn test_classify_status_bounds() {
        assert_eq!(
            classify_status(199),
            Reachability::Unreachable {
                reason: "HTTP status 199".into()
            }
        );
        assert!(classify_status(200).is_reachable());
        assert!(classify_status(302).is_reachable());
        assert!(classify_status(399).is_reachable());
        assert!(!classify_status(400).is_reachable());
        assert!(!classify_status(404).is_reachable());
        assert!(!classify_status(503).is_reachable());
    }

    #[tokio::test]
    async fn test_probe_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let result = probe().probe(&format!("{}/", server.uri())).await;
        assert_eq!(result, Reachability::Reachable { status: 200 });
    }

    #[tokio::test]
    async fn test_probe_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("Location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = probe().probe(&format!("{}/old", server.uri())).await;
        assert_eq!(
            result,
            Reachability::Unreachable {
                reason: "HTTP status 404".into()
            }
        );
    }

    #[tokio::test]
    async fn test_probe_server_error_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = probe().probe(&server.uri()).await;
        assert!(!result.is_reachable());
    }

    #[tokio::test]
    async fn test_probe_connection_refused_is_unreachable() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = probe().probe(&format!("http://127.0.0.1:{}/", port)).await;
        match result {
            Reachability::Unreachable { reason } => assert!(!reason.is_empty()),
            other => panic!("expected Unreachable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_invalid_url_is_unreachable() {
        let result = probe().probe("not a url").await;
        assert!(!result.is_reachable());
    }
}
