use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub telegram: TelegramConfig,

    pub auth: AuthConfig,

    pub referral: ReferralConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/frogmates.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token used to derive the init-data signing key.
    pub bot_token: String,

    /// Telegram id that is promoted to admin on login.
    pub admin_telegram_id: Option<String>,

    /// Mini App link; referral links append `?startapp=<special id>`.
    pub app_url: String,

    /// Reject init-data whose `auth_date` is older than this. 0 disables the check.
    pub init_data_max_age_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            admin_telegram_id: None,
            app_url: "https://t.me/frogmates_bot/app".to_string(),
            init_data_max_age_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,

    pub token_ttl_days: i64,
}

/// Written by `init`; refused by [`Config::validate`].
pub const PLACEHOLDER_JWT_SECRET: &str = "change-me";

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: PLACEHOLDER_JWT_SECRET.to_string(),
            token_ttl_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferralConfig {
    /// Stars credited to a referrer for each new user.
    pub referral_bonus: i32,

    /// Stars credited when the new user has Telegram Premium.
    pub premium_referral_bonus: i32,

    /// Starting balance of a new account, also the value `reset-stars` restores.
    pub initial_stars: i32,

    /// Accounts sharing one IP at which all of them are flagged.
    pub cheater_ip_threshold: u64,
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            referral_bonus: 5,
            premium_referral_bonus: 5,
            initial_stars: 5,
            cheater_ip_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            telegram: TelegramConfig::default(),
            auth: AuthConfig::default(),
            referral: ReferralConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }

        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(admin_id) = lookup("ADMIN_TELEGRAM_ID").filter(|s| !s.trim().is_empty()) {
            self.telegram.admin_telegram_id = Some(admin_id.trim().to_string());
        }

        if let Some(url) = lookup("DATABASE_URL") {
            self.general.database_path = url;
        }

        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("frogmates").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".frogmates").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret cannot be empty");
        }

        if self.auth.jwt_secret == PLACEHOLDER_JWT_SECRET {
            anyhow::bail!(
                "JWT secret is still the placeholder; set auth.jwt_secret or JWT_SECRET"
            );
        }

        if self.auth.token_ttl_days <= 0 {
            anyhow::bail!("Token TTL must be at least one day");
        }

        if self.referral.cheater_ip_threshold == 0 {
            anyhow::bail!("Cheater IP threshold must be > 0");
        }

        if self.referral.referral_bonus < 0 || self.referral.premium_referral_bonus < 0 {
            anyhow::bail!("Referral bonuses cannot be negative");
        }

        Ok(())
    }

    /// Settings that are valid but probably unintended. Logged at startup.
    #[must_use]
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();

        if self.telegram.bot_token.is_empty() {
            warnings.push("Telegram bot token is not set; every login will be rejected");
        }

        if self.telegram.admin_telegram_id.is_none() {
            warnings.push("ADMIN_TELEGRAM_ID is not set; nobody is elevated to admin on login");
        }

        warnings
    }

    #[must_use]
    pub fn is_admin_telegram_id(&self, telegram_id: &str) -> bool {
        self.telegram
            .admin_telegram_id
            .as_deref()
            .is_some_and(|id| id == telegram_id)
    }

    #[must_use]
    pub fn referral_link(&self, special_id: &str) -> String {
        format!("{}?startapp={}", self.telegram.app_url, special_id)
    }
}
