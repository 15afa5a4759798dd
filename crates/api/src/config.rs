use domain::services::GatewayConfig;
use persistence::db::DatabaseConfig;
use serde::Deserialize;
use std::net::SocketAddr;

/// Application configuration, loaded from `config/default.toml`, an
/// optional `config/local.toml` override and `CM__`-prefixed
/// environment variables (double underscore as section separator,
/// e.g. `CM__DATABASE__URL`).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub jwt: JwtConfig,
    pub gateway: GatewaySettings,
    pub storage: StorageConfig,
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "json" for production, "pretty" for local development.
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins. A single "*" entry allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Per-user request budget for authenticated routes. Zero disables
    /// rate limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    #[serde(default)]
    pub enable_hsts: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_token_expiry_days")]
    pub token_expiry_days: i64,
}

/// Payment gateway credentials. The adapter stays unconfigured when
/// `enabled` is false or the key/salt are blank, and payment routes
/// answer 503.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub merchant_key: String,
    #[serde(default)]
    pub merchant_salt: String,
    #[serde(default = "default_gateway_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub success_url: String,
    #[serde(default)]
    pub failure_url: String,
    #[serde(default)]
    pub cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_root")]
    pub root_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    #[serde(default = "default_transaction_retention_days")]
    pub transaction_retention_days: i64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_rate_limit() -> u32 {
    120
}

fn default_token_expiry_days() -> i64 {
    30
}

fn default_gateway_base_url() -> String {
    "https://test.payu.in".to_string()
}

fn default_storage_root() -> String {
    "data/uploads".to_string()
}

fn default_transaction_retention_days() -> i64 {
    90
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("CM").separator("__"))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Test configuration built from embedded defaults plus overrides,
    /// without touching the filesystem or process environment.
    pub fn load_for_test(
        overrides: &[(&str, &str)],
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            DEFAULT_TEST_CONFIG,
            config::FileFormat::Toml,
        ));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.database.url.is_empty() {
            return Err(config::ConfigError::Message(
                "database.url is required (set CM__DATABASE__URL)".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(config::ConfigError::Message(
                "database.min_connections exceeds database.max_connections".to_string(),
            ));
        }
        if self.jwt.secret.len() < 32 {
            return Err(config::ConfigError::Message(
                "jwt.secret must be at least 32 characters (set CM__JWT__SECRET)".to_string(),
            ));
        }
        if self.gateway.enabled
            && (self.gateway.merchant_key.is_empty() || self.gateway.merchant_salt.is_empty())
        {
            return Err(config::ConfigError::Message(
                "gateway.merchant_key and gateway.merchant_salt are required when the gateway is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            connect_timeout_secs: self.database.connect_timeout_secs,
            idle_timeout_secs: self.database.idle_timeout_secs,
        }
    }

    pub fn gateway_config(&self) -> Option<GatewayConfig> {
        if !self.gateway.enabled
            || self.gateway.merchant_key.is_empty()
            || self.gateway.merchant_salt.is_empty()
        {
            return None;
        }
        Some(GatewayConfig {
            merchant_key: self.gateway.merchant_key.clone(),
            merchant_salt: self.gateway.merchant_salt.clone(),
            base_url: self.gateway.base_url.clone(),
            success_url: self.gateway.success_url.clone(),
            failure_url: self.gateway.failure_url.clone(),
            cancel_url: self.gateway.cancel_url.clone(),
        })
    }
}

const DEFAULT_TEST_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 0
request_timeout_secs = 5

[database]
url = "postgres://localhost/coursemart_test"
max_connections = 5
min_connections = 1
connect_timeout_secs = 5
idle_timeout_secs = 60

[logging]
level = "debug"
format = "pretty"

[security]
cors_origins = ["*"]
rate_limit_per_minute = 0
enable_hsts = false

[jwt]
secret = "test-secret-test-secret-test-secret-test"
token_expiry_days = 1

[gateway]
enabled = true
merchant_key = "testkey"
merchant_salt = "testsalt"
base_url = "https://test.payu.in"
success_url = "http://localhost:8080/payment/success"
failure_url = "http://localhost:8080/payment/failure"
cancel_url = "http://localhost:8080/payment/cancel"

[storage]
root_dir = "data/test-uploads"

[cleanup]
transaction_retention_days = 90
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_parse() {
        let config = Config::load_for_test(&[]).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.jwt.token_expiry_days, 1);
        assert!(config.gateway_config().is_some());
    }

    #[test]
    fn test_overrides_apply() {
        let config =
            Config::load_for_test(&[("gateway.enabled", "false"), ("server.port", "9999")])
                .unwrap();
        assert_eq!(config.server.port, 9999);
        assert!(config.gateway_config().is_none());
    }

    #[test]
    fn test_blank_gateway_key_means_unconfigured() {
        let config = Config::load_for_test(&[("gateway.merchant_key", "")]).unwrap();
        assert!(config.gateway_config().is_none());
    }
}
