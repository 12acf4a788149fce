use crate::error::{ChainError, Result};
use crate::models::{StrikeBounds, StrikeWindow, SymbolFormat};
use dotenv::dotenv;
use std::env;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "https://phx.unusualwhales.com";
pub const DEFAULT_ORIGIN: &str = "https://unusualwhales.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Configuration for the historic chains API
#[derive(Clone)]
pub struct ChainsApiConfig {
    /// Bearer token sent in the `Authorization` header
    pub api_token: String,
    /// Scheme and host the `/api/historic_chains/` path is joined onto
    pub base_url: String,
    /// Value of the `Origin` header
    pub origin: String,
    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl fmt::Debug for ChainsApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainsApiConfig")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("origin", &self.origin)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    /// API connection settings
    pub api: ChainsApiConfig,
    /// How option symbols are spelled for the API
    pub symbol: SymbolFormat,
    /// Strike window generated around the central strike
    pub window: StrikeWindow,
    /// Accepted range for the central strike input
    pub strike_bounds: StrikeBounds,
    /// Log level
    pub log_level: String,
}

impl Config {
    /// Build a configuration with the default endpoint, symbol format and strike window.
    pub fn new(api_token: impl Into<String>) -> Self {
        Config {
            api: ChainsApiConfig {
                api_token: api_token.into(),
                base_url: DEFAULT_BASE_URL.to_string(),
                origin: DEFAULT_ORIGIN.to_string(),
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            symbol: SymbolFormat::default(),
            window: StrikeWindow::default(),
            strike_bounds: StrikeBounds::default(),
            log_level: "info".to_string(),
        }
    }

    /// Point the client at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }

    /// Override the strike window.
    pub fn with_window(mut self, window: StrikeWindow) -> Self {
        self.window = window;
        self
    }

    /// Override the option symbol format.
    pub fn with_symbol_format(mut self, symbol: SymbolFormat) -> Self {
        self.symbol = symbol;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let api_token = env::var("CHAINS_API_TOKEN").map_err(|_| {
            ChainError::ConfigError("CHAINS_API_TOKEN environment variable not set".to_string())
        })?;

        let mut config = Config::new(api_token);

        if let Ok(base_url) = env::var("CHAINS_API_URL") {
            config.api.base_url = base_url;
        }
        if let Ok(origin) = env::var("CHAINS_API_ORIGIN") {
            config.api.origin = origin;
        }
        if let Ok(user_agent) = env::var("CHAINS_USER_AGENT") {
            config.api.user_agent = user_agent;
        }
        if let Ok(product_code) = env::var("CHAINS_PRODUCT_CODE") {
            config.symbol.product_code = product_code;
        }
        if let Some(half_width) = parse_var::<i64>("CHAINS_STRIKE_HALF_WIDTH")? {
            config.window.half_width = half_width;
        }
        if let Some(step) = parse_var::<i64>("CHAINS_STRIKE_STEP")? {
            config.window.step = step;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.log_level = log_level;
        }

        Ok(config)
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| ChainError::ConfigError(format!("Failed to install subscriber: {}", e)))?;

        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ChainError::ConfigError(format!("{} is not a valid number: {:?}", name, raw))
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_api() {
        let config = Config::new("token");
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.symbol.product_code, "SPXW");
        assert_eq!(config.window.half_width, 1250);
        assert_eq!(config.window.step, 5);
    }

    #[test]
    fn debug_output_hides_token() {
        let config = Config::new("super-secret-token");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn builder_overrides_apply() {
        let config = Config::new("t")
            .with_base_url("http://127.0.0.1:9")
            .with_window(StrikeWindow { half_width: 10, step: 5 });
        assert_eq!(config.api.base_url, "http://127.0.0.1:9");
        assert_eq!(config.window.half_width, 10);
    }
}
