use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_MINIMUM_CHARGE: i64 = 1;
const DEV_DEFAULT_GATEWAY_SECRET: &str =
    "this_is_a_development_gateway_secret_for_local_testing_only";

/// What to do with an order whose coupon has already expired.
///
/// The lenient default keeps the order and simply skips the discount while
/// recording that a coupon was attempted; `Reject` refuses the order
/// outright.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpiredCouponPolicy {
    #[default]
    Skip,
    Reject,
}

/// Payment gateway credentials
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Public key identifier issued by the gateway
    #[serde(default)]
    pub key_id: Option<String>,

    /// Shared secret used to verify gateway payment signatures
    #[validate(length(min = 16, message = "Gateway secret must be at least 16 characters"))]
    pub key_secret: String,
}

/// Pricing behaviour knobs
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Smallest amount (in minor currency units) an order may be charged.
    /// A fully discounted order is clamped up to this value.
    #[serde(default = "default_minimum_charge")]
    #[validate(range(min = 1, message = "Minimum charge must be at least 1"))]
    pub minimum_charge: i64,

    /// Behaviour when the requested coupon has expired
    #[serde(default)]
    pub expired_coupon_policy: ExpiredCouponPolicy,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            minimum_charge: default_minimum_charge(),
            expired_coupon_policy: ExpiredCouponPolicy::default(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Payment gateway credentials
    #[validate]
    pub gateway: GatewayConfig,

    /// Pricing behaviour
    #[serde(default)]
    #[validate]
    pub pricing: PricingConfig,
}

impl AppConfig {
    /// Loads configuration from `config/default`, an environment-specific
    /// overlay, and `CHECKOUT_`-prefixed environment variables, in that
    /// order of precedence.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = env::var("CHECKOUT_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let config: AppConfig = Config::builder()
            .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
            .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, environment)).required(false))
            .add_source(Environment::with_prefix("CHECKOUT").separator("__"))
            .build()?
            .try_deserialize()?;

        config
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        info!(environment = %config.environment, "Configuration loaded");
        Ok(config)
    }

    /// Configuration suitable for local development and tests: a fixed
    /// gateway secret and default pricing behaviour.
    pub fn development() -> Self {
        Self {
            environment: DEFAULT_ENV.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
            gateway: GatewayConfig {
                key_id: None,
                key_secret: DEV_DEFAULT_GATEWAY_SECRET.to_string(),
            },
            pricing: PricingConfig::default(),
        }
    }
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_minimum_charge() -> i64 {
    DEFAULT_MINIMUM_CHARGE
}
