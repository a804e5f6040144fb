use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use viewer::{FixedBackoff, LogService, ProgressChannel};

pub const DEV_API_BASE_URL: &str = "http://10.0.2.2:8000/api/v1";
pub const PROD_API_BASE_URL: &str = "https://community-info-collector-backend.onrender.com/api/v1";
pub const DEV_WS_BASE_URL: &str = "ws://10.0.2.2:8000/ws";
pub const PROD_WS_BASE_URL: &str = "wss://community-info-collector-backend.onrender.com/ws";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Which backend deployment the default URLs point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Dev,
    #[default]
    Prod,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub profile: Profile,
    pub api: ApiConfig,
    pub progress: ProgressConfig,
    pub log: LogConfig,
    pub features: Features,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Overrides the profile's REST base URL.
    pub base_url: Option<String>,
    /// Overrides the profile's WebSocket base URL.
    pub ws_base_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: None,
            ws_base_url: None,
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub reconnect_interval_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        ProgressConfig {
            reconnect_interval_ms: 3_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            capacity: viewer::log::DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Allow opening the citation detail view.
    pub citation_details: bool,
}

impl Default for Features {
    fn default() -> Self {
        Features {
            citation_details: true,
        }
    }
}

impl AppConfig {
    /// Load from `path`. No path, or a path that does not exist, gives defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// REST base URL for a host that talks to the backend. The CLI works on
    /// saved payloads and only reports it.
    pub fn api_base_url(&self) -> &str {
        match (&self.api.base_url, self.profile) {
            (Some(url), _) => url,
            (None, Profile::Dev) => DEV_API_BASE_URL,
            (None, Profile::Prod) => PROD_API_BASE_URL,
        }
    }

    pub fn ws_base_url(&self) -> &str {
        match (&self.api.ws_base_url, self.profile) {
            (Some(url), _) => url,
            (None, Profile::Dev) => DEV_WS_BASE_URL,
            (None, Profile::Prod) => PROD_WS_BASE_URL,
        }
    }

    /// Request timeout for the same REST host.
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    pub fn log_service(&self) -> LogService {
        LogService::new(self.log.capacity)
    }

    pub fn progress_channel(&self) -> ProgressChannel {
        let backoff = FixedBackoff {
            interval: Duration::from_millis(self.progress.reconnect_interval_ms),
        };
        ProgressChannel::new(self.ws_base_url(), Box::new(backoff))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use viewer::ChannelEffect;

    use super::*;

    #[test]
    fn defaults_point_at_production() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.api_base_url(), PROD_API_BASE_URL);
        assert_eq!(config.ws_base_url(), PROD_WS_BASE_URL);
        assert_eq!(config.api_timeout(), Duration::from_secs(30));
        assert!(config.features.citation_details);
        assert_eq!(config.log.capacity, 1000);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.profile, Profile::Prod);
    }

    #[test]
    fn dev_profile_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
profile = "dev"

[api]
ws_base_url = "ws://localhost:9000/ws"
timeout_ms = 5000

[progress]
reconnect_interval_ms = 250

[features]
citation_details = false
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api_base_url(), DEV_API_BASE_URL);
        assert_eq!(config.ws_base_url(), "ws://localhost:9000/ws");
        assert_eq!(config.api_timeout(), Duration::from_secs(5));
        assert!(!config.features.citation_details);

        let mut channel = config.progress_channel();
        let socket = match channel.connect("abc").as_slice() {
            [ChannelEffect::Open { url, socket }] => {
                assert_eq!(url, "ws://localhost:9000/ws/abc");
                *socket
            }
            other => panic!("unexpected {:?}", other),
        };
        match channel.on_close(socket) {
            Some(ChannelEffect::ScheduleReconnect { delay, .. }) => {
                assert_eq!(delay, Duration::from_millis(250));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "profile = [").unwrap();
        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid config"));
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "profile = \"staging\"").unwrap();
        assert!(AppConfig::load(Some(file.path())).is_err());
    }
}
