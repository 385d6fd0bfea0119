//! Configuration types for pagepulse

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// External auditor settings (binary, report directory, timeout)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditorConfig {
    /// Path to the auditor executable (auto-detected if None)
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Whether to search PATH for the auditor if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Directory the auditor writes its JSON reports into (default: "./audits")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum wall time for one audit before the process is killed (default: 180s)
    #[serde(default = "default_audit_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Device preset passed to the auditor (default: "desktop")
    #[serde(default = "default_preset")]
    pub preset: String,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            executable: None,
            search_path: true,
            output_dir: default_output_dir(),
            timeout: default_audit_timeout(),
            preset: default_preset(),
        }
    }
}

/// HTTP client settings shared by the liveness, timing and version requests
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout (default: 30s)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// DNS + TCP connect timeout (default: 10s)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Maximum number of redirects followed (default: 10)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// User-Agent header, reqwest's default when None
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: None,
        }
    }
}

/// Data storage settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database path (default: "./pagepulse.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// A deployment environment recognised by a substring of the URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Name stored on the record (e.g. "BETA")
    pub name: String,

    /// Case-insensitive substring identifying URLs of this environment
    pub marker: String,

    /// Document holding the deployed version string
    #[serde(default)]
    pub version_url: Option<String>,
}

/// Main configuration for a batch run
///
/// Built once and handed to [`Pipeline`](crate::pipeline::Pipeline); nothing
/// in the crate reads configuration from process-wide state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// CSV file with `url[,description]` rows (default: "./urls.csv")
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,

    /// External auditor settings
    #[serde(default)]
    pub auditor: AuditorConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Data storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Known environments, checked in order
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,

    /// Environment name used when no marker matches (default: "PROD")
    #[serde(default = "default_environment")]
    pub default_environment: String,

    /// Version document for the default environment
    #[serde(default)]
    pub default_version_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            auditor: AuditorConfig::default(),
            http: HttpConfig::default(),
            persistence: PersistenceConfig::default(),
            environments: Vec::new(),
            default_environment: default_environment(),
            default_version_url: None,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    ///
    /// Missing keys take their defaults. The result is validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would make every evaluation fail
    pub fn validate(&self) -> Result<()> {
        if self.auditor.output_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "audit output directory must not be empty".into(),
                key: Some("auditor.output_dir".into()),
            });
        }
        if self.auditor.timeout.is_zero() {
            return Err(Error::Config {
                message: "audit timeout must be at least one second".into(),
                key: Some("auditor.timeout".into()),
            });
        }
        if self.http.timeout.is_zero() {
            return Err(Error::Config {
                message: "HTTP timeout must be at least one second".into(),
                key: Some("http.timeout".into()),
            });
        }
        if self.http.connect_timeout.is_zero() {
            return Err(Error::Config {
                message: "HTTP connect timeout must be at least one second".into(),
                key: Some("http.connect_timeout".into()),
            });
        }
        if self.persistence.database_path.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "database path must not be empty".into(),
                key: Some("persistence.database_path".into()),
            });
        }
        if let Some(env) = self
            .environments
            .iter()
            .find(|e| e.marker.trim().is_empty())
        {
            return Err(Error::Config {
                message: format!("environment {} has an empty marker", env.name),
                key: Some("environments".into()),
            });
        }
        Ok(())
    }

    /// Resolve the auditor binary: explicit path first, then PATH lookup
    pub fn auditor_executable(&self) -> Result<PathBuf> {
        if let Some(path) = &self.auditor.executable {
            return Ok(path.clone());
        }
        if self.auditor.search_path {
            return which::which(AUDITOR_BINARY).map_err(|e| {
                Error::ExternalTool(format!("{} not found in PATH: {}", AUDITOR_BINARY, e))
            });
        }
        Err(Error::Config {
            message: "no auditor executable configured and PATH search disabled".into(),
            key: Some("auditor.executable".into()),
        })
    }
}

/// Binary name looked up in PATH when no auditor path is configured
pub const AUDITOR_BINARY: &str = "lighthouse";

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./audits")
}

fn default_audit_timeout() -> Duration {
    Duration::from_secs(180)
}

fn default_preset() -> String {
    "desktop".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_redirects() -> usize {
    10
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./pagepulse.db")
}

fn default_input_path() -> PathBuf {
    PathBuf::from("./urls.csv")
}

fn default_environment() -> String {
    "PROD".to_string()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
