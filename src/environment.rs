//! Deployment environment and version lookup
//!
//! Each URL is assigned an environment by substring match against the
//! configured markers. If the environment has a version document, it is
//! fetched and scanned for a semantic version and a release branch. Every
//! failure here is logged and leaves the corresponding field empty; nothing in
//! this module fails an evaluation.

use crate::config::{Config, EnvironmentConfig};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

// Constant patterns; compilation cannot fail.
#[allow(clippy::expect_used)]
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+\.\d+)").expect("valid version pattern"));
#[allow(clippy::expect_used)]
static BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"release-(\d+\.\d+)\.\d+-").expect("valid branch pattern"));

/// Environment, version and branch of a URL's deployment
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvironmentInfo {
    /// Environment name
    pub name: String,
    /// First `x.y.z` found in the version document
    pub version: Option<String>,
    /// `x.y` of a `release-x.y.z-` tag in the version document
    pub branch: Option<String>,
}

/// Pick the first environment whose marker occurs in `url` (case-insensitive)
pub fn match_environment<'a>(
    url: &str,
    environments: &'a [EnvironmentConfig],
) -> Option<&'a EnvironmentConfig> {
    let url = url.to_ascii_lowercase();
    environments
        .iter()
        .find(|env| url.contains(&env.marker.to_ascii_lowercase()))
}

/// Extract the first semantic version from a version document
pub fn extract_version(text: &str) -> Option<String> {
    VERSION_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the release branch (`major.minor`) from a version document
pub fn extract_branch(text: &str) -> Option<String> {
    BRANCH_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Resolves environment and deployed version for URLs
pub struct EnvironmentResolver {
    client: reqwest::Client,
    environments: Vec<EnvironmentConfig>,
    default_name: String,
    default_version_url: Option<String>,
}

impl EnvironmentResolver {
    /// Create a resolver from the batch configuration
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            environments: config.environments.clone(),
            default_name: config.default_environment.clone(),
            default_version_url: config.default_version_url.clone(),
        }
    }

    /// Resolve environment and version for `url`
    pub async fn resolve(&self, url: &str) -> EnvironmentInfo {
        let (name, version_url) = match match_environment(url, &self.environments) {
            Some(env) => (env.name.clone(), env.version_url.as_deref()),
            None => (self.default_name.clone(), self.default_version_url.as_deref()),
        };
        debug!(url, environment = %name, "resolved environment");

        let Some(version_url) = version_url else {
            return EnvironmentInfo {
                name,
                ..Default::default()
            };
        };

        match self.fetch_marker(version_url).await {
            Some(text) => {
                let version = extract_version(&text);
                let branch = extract_branch(&text);
                if version.is_none() {
                    warn!(version_url, "could not determine application version");
                }
                if branch.is_none() {
                    warn!(version_url, "could not determine application branch");
                }
                EnvironmentInfo {
                    name,
                    version,
                    branch,
                }
            }
            None => EnvironmentInfo {
                name,
                ..Default::default()
            },
        }
    }

    async fn fetch_marker(&self, version_url: &str) -> Option<String> {
        let response = match self.client.get(version_url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(version_url, error = %e, "failed to fetch version marker");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                version_url,
                status = response.status().as_u16(),
                "version marker returned error status"
            );
            return None;
        }

        match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(version_url, error = %e, "failed to read version marker");
                None
            }
        }
    }
}
