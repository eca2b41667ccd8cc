use serde::Deserialize;

/// Application configuration
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database URL (SQLite path)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Session duration in hours
    #[serde(default = "default_session_hours")]
    pub session_hours: u64,

    /// Lifetime of the selected-branch and cart-token cookies, in days
    #[serde(default = "default_cookie_days")]
    pub cookie_days: u64,

    /// Lower bound applied to catalog price filters when none is given
    #[serde(default = "default_min_price")]
    pub default_min_price: i64,

    /// Upper bound applied to catalog price filters when none is given
    #[serde(default = "default_max_price")]
    pub default_max_price: i64,

    /// Chat-bot notification settings
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TelegramConfig {
    /// Bot token; notifications are disabled when unset
    pub bot_token: Option<String>,

    /// Chat the order notifications are posted to
    pub chat_id: Option<String>,

    /// API base, overridable for tests
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_telegram_api_base(),
        }
    }
}

impl TelegramConfig {
    /// True when both credentials are present
    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_url() -> String {
    "sqlite:data/storefront.db".to_string()
}

fn default_session_hours() -> u64 {
    24 * 7 // 1 week
}

fn default_cookie_days() -> u64 {
    30
}

fn default_min_price() -> i64 {
    0
}

fn default_max_price() -> i64 {
    1000
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            // Start with defaults
            .set_default("host", default_host())?
            .set_default("port", default_port())?
            .set_default("database_url", default_database_url())?
            .set_default("session_hours", default_session_hours())?
            .set_default("cookie_days", default_cookie_days())?
            .set_default("default_min_price", default_min_price())?
            .set_default("default_max_price", default_max_price())?
            // Load from config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (STOREFRONT_ prefix)
            .add_source(
                config::Environment::with_prefix("STOREFRONT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;

        if config.default_min_price > config.default_max_price {
            anyhow::bail!("default_min_price must not exceed default_max_price");
        }

        Ok(config)
    }
}
