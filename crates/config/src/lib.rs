use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

/// Read a secret either from `<NAME>_FILE` (trimmed file contents) or `<NAME>`.
fn secret_from_env(name: &str) -> String {
    let file_var = format!("{name}_FILE");
    if let Ok(path) = std::env::var(&file_var) {
        std::fs::read_to_string(&path)
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|e| panic!("Failed to read {} at {}: {}", file_var, path, e))
    } else {
        std::env::var(name).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_connections: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let password = secret_from_env("DATABASE_PASSWORD");
        Self {
            host: std::env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("DATABASE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5432),
            database: std::env::var("DATABASE_NAME").unwrap_or_else(|_| "billing".to_string()),
            username: std::env::var("DATABASE_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: if password.is_empty() {
                "postgres".to_string()
            } else {
                password
            },
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        }
    }
}

/// Stripe payment configuration
#[derive(Clone, Deserialize)]
pub struct StripeConfig {
    /// Stripe secret key for API authentication. Empty means Stripe is not configured.
    pub secret_key: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: secret_from_env("STRIPE_SECRET_KEY"),
        }
    }
}

impl StripeConfig {
    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }
}

/// Location of the browser front-end, used to build billing portal return URLs
#[derive(Debug, Clone, Deserialize)]
pub struct WebAppConfig {
    pub url: Url,
}

impl Default for WebAppConfig {
    fn default() -> Self {
        let raw = std::env::var("WEB_APP_URL")
            .unwrap_or_else(|_| "http://app.localhost:3000".to_string());
        Self {
            url: Url::parse(&raw).expect("WEB_APP_URL must be a valid URL"),
        }
    }
}

impl WebAppConfig {
    /// Base URL without a trailing slash
    pub fn base_url(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub exact_matches: Vec<String>,
    pub wildcard_suffixes: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        let raw_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let mut exact_matches = Vec::new();
        let mut wildcard_suffixes = Vec::new();

        for origin in raw_origins.split(',') {
            let s = origin.trim();
            if s.is_empty() {
                continue;
            }

            if let Some(suffix) = s.strip_prefix('*') {
                let safe_suffix = if suffix.starts_with('.') || suffix.starts_with('-') {
                    suffix.to_string()
                } else {
                    format!(".{}", suffix)
                };
                wildcard_suffixes.push(safe_suffix);
            } else {
                exact_matches.push(s.to_string());
            }
        }

        Self {
            exact_matches,
            wildcard_suffixes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Global log level for the application.
    ///
    /// Valid values: "error", "warn", "info", "debug", "trace".
    /// Default: "info" (from LOG_LEVEL env var or fallback).
    pub level: String,
    /// Log output format.
    ///
    /// Valid values: "pretty", "json".
    /// Default: "pretty" (from LOG_FORMAT env var or fallback).
    pub format: String,
    /// Per-module log levels.
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let mut modules = HashMap::new();

        if let Ok(level) = std::env::var("LOG_MODULE_API") {
            modules.insert("api".to_string(), level);
        }
        if let Ok(level) = std::env::var("LOG_MODULE_SERVICES") {
            modules.insert("services".to_string(), level);
        }
        if let Ok(level) = std::env::var("LOG_MODULE_DATABASE") {
            modules.insert("database".to_string(), level);
        }

        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            modules,
        }
    }
}

impl LoggingConfig {
    /// Build an `EnvFilter` directive string, e.g. `info,api=debug,database=warn`.
    /// Modules are sorted so the output is stable.
    pub fn filter_directive(&self) -> String {
        let mut modules: Vec<_> = self.modules.iter().collect();
        modules.sort();
        std::iter::once(self.level.clone())
            .chain(
                modules
                    .into_iter()
                    .map(|(module, level)| format!("{module}={level}")),
            )
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    /// Stripe payment configuration
    pub stripe: StripeConfig,
    pub web_app: WebAppConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            stripe: StripeConfig::default(),
            web_app: WebAppConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
