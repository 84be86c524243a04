use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Key required on the publish endpoint; unset disables the check
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Capacity of each session's outbound buffer. A session that falls this
    /// far behind is disconnected.
    #[serde(default = "default_session_buffer_size")]
    pub session_buffer_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// Interval between server pings, in seconds. Must be shorter than pong_timeout.
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    /// Disconnect if nothing is read from the client for this long, in seconds
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout: u64,
    /// Maximum accepted inbound frame size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_session_buffer_size() -> usize {
    256
}

fn default_ping_interval() -> u64 {
    54
}

fn default_pong_timeout() -> u64 {
    60
}

fn default_max_message_size() -> usize {
    512
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "itsm-notification-hub".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("hub.session_buffer_size", default_session_buffer_size() as i64)?
            .set_default("websocket.ping_interval", default_ping_interval() as i64)?
            .set_default("websocket.pong_timeout", default_pong_timeout() as i64)?
            .set_default("websocket.max_message_size", default_max_message_size() as i64)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER__PORT, JWT__SECRET, HUB__SESSION_BUFFER_SIZE, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(","),
            );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".into()));
        }
        if self.hub.session_buffer_size == 0 {
            return Err(ConfigError::Message(
                "hub.session_buffer_size must be at least 1".into(),
            ));
        }
        if self.websocket.ping_interval == 0 {
            return Err(ConfigError::Message(
                "websocket.ping_interval must be at least 1 second".into(),
            ));
        }
        if self.websocket.ping_interval >= self.websocket.pong_timeout {
            return Err(ConfigError::Message(
                "websocket.ping_interval must be shorter than websocket.pong_timeout".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            session_buffer_size: default_session_buffer_size(),
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            ping_interval: default_ping_interval(),
            pong_timeout: default_pong_timeout(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            server: ServerConfig::default(),
            jwt: JwtConfig {
                secret: "secret".to_string(),
                issuer: None,
                audience: None,
            },
            api: ApiConfig::default(),
            hub: HubConfig::default(),
            websocket: WebSocketConfig::default(),
            otel: OtelConfig::default(),
        }
    }

    #[test]
    fn test_default_values() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);
        assert_eq!(HubConfig::default().session_buffer_size, 256);
        assert!(!OtelConfig::default().enabled);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(settings().validate().is_ok());
        assert_eq!(settings().server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut s = settings();
        s.hub.session_buffer_size = 0;
        assert!(s.validate().is_err());

        let mut s = settings();
        s.websocket.ping_interval = 60;
        assert!(s.validate().is_err());

        let mut s = settings();
        s.websocket.ping_interval = 0;
        assert!(s.validate().is_err());

        let mut s = settings();
        s.jwt.secret.clear();
        assert!(s.validate().is_err());
    }
}
