use domain::services::pricing::{
    PricingRates, DEFAULT_CURRENCY, DEFAULT_FALLBACK_BASE_PRICE, DEFAULT_NIGHTLY_RATE,
};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
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

impl DatabaseConfig {
    /// Pool settings for the persistence layer.
    pub fn pool_config(&self) -> persistence::db::PoolSettings {
        persistence::db::PoolSettings {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            acquire_timeout: Duration::from_secs(self.connect_timeout_secs),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Registration submissions allowed per client IP per minute; 0 disables.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Take the client IP from `X-Forwarded-For`. Only enable behind a proxy that sets it.
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Send `Strict-Transport-Security`. Enable when TLS terminates in front of the service.
    #[serde(default)]
    pub hsts_enabled: bool,

    /// SHA-256 hex digest of the admin API key. Empty disables admin routes.
    #[serde(default)]
    pub admin_api_key_hash: String,
}

/// Prices that are not stored on the event.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_nightly_rate")]
    pub nightly_rate: f64,

    #[serde(default = "default_fallback_base_price")]
    pub fallback_base_price: f64,

    #[serde(default = "default_certificate_hardcopy_fee")]
    pub certificate_hardcopy_fee: f64,

    #[serde(default = "default_materials_kit_price")]
    pub materials_kit_price: f64,

    #[serde(default = "default_networking_dinner_price")]
    pub networking_dinner_price: f64,

    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            nightly_rate: default_nightly_rate(),
            fallback_base_price: default_fallback_base_price(),
            certificate_hardcopy_fee: default_certificate_hardcopy_fee(),
            materials_kit_price: default_materials_kit_price(),
            networking_dinner_price: default_networking_dinner_price(),
            currency: default_currency(),
        }
    }
}

impl PricingConfig {
    pub fn rates(&self) -> PricingRates {
        PricingRates {
            nightly_rate: self.nightly_rate,
            fallback_base_price: self.fallback_base_price,
            certificate_hardcopy_fee: self.certificate_hardcopy_fee,
            materials_kit_price: self.materials_kit_price,
            networking_dinner_price: self.networking_dinner_price,
            currency: self.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    #[serde(default = "default_payment_provider")]
    pub provider: String,

    /// Makes the mock provider reject every call.
    #[serde(default)]
    pub simulate_failure: bool,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            provider: default_payment_provider(),
            simulate_failure: false,
        }
    }
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

fn default_max_body_size() -> usize {
    1_048_576 // 1MB
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
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

fn default_rate_limit() -> u32 {
    10
}

fn default_nightly_rate() -> f64 {
    DEFAULT_NIGHTLY_RATE
}

fn default_fallback_base_price() -> f64 {
    DEFAULT_FALLBACK_BASE_PRICE
}

fn default_certificate_hardcopy_fee() -> f64 {
    PricingRates::default().certificate_hardcopy_fee
}

fn default_materials_kit_price() -> f64 {
    PricingRates::default().materials_kit_price
}

fn default_networking_dinner_price() -> f64 {
    PricingRates::default().networking_dinner_price
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_payment_provider() -> String {
    "mock".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with DM__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("DM")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Builds from embedded defaults so tests do not depend on config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 1048576

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 10
            trust_forwarded_for = false
            hsts_enabled = false
            admin_api_key_hash = ""

            [pricing]
            nightly_rate = 100.0
            currency = "GBP"

            [payment]
            provider = "mock"
            simulate_failure = false
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "DM__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        let prices = [
            ("nightly_rate", self.pricing.nightly_rate),
            ("fallback_base_price", self.pricing.fallback_base_price),
            ("certificate_hardcopy_fee", self.pricing.certificate_hardcopy_fee),
            ("materials_kit_price", self.pricing.materials_kit_price),
            ("networking_dinner_price", self.pricing.networking_dinner_price),
        ];
        if let Some((name, _)) = prices.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "pricing.{} must be a non-negative number",
                name
            )));
        }

        if self.payment.provider != "mock" {
            return Err(ConfigValidationError::InvalidValue(format!(
                "Unsupported payment provider: {}",
                self.payment.provider
            )));
        }

        let hash = &self.security.admin_api_key_hash;
        if !hash.is_empty() && (hash.len() != 64 || hex::decode(hash).is_err()) {
            return Err(ConfigValidationError::InvalidValue(
                "security.admin_api_key_hash must be a SHA-256 hex digest".to_string(),
            ));
        }

        Ok(())
    }

    /// Address to bind. Falls back to all interfaces if `server.host` is not an IP.
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = self
            .server
            .host
            .parse::<IpAddr>()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, self.server.port)
    }
}
