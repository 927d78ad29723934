use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "dev" | "development" => Ok(Environment::Development),
            "stage" | "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            other => Err(ConfigError::Invalid {
                name: "APP_MODE",
                reason: format!("unknown mode '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub default_list_limit: i64,
    pub max_list_limit: i64,
    pub max_request_size_bytes: usize,
    pub enable_request_logging: bool,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub auth_lookup_timeout_secs: u64,
    /// `*` means any origin.
    pub cors_origins: Vec<String>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("auth_lookup_timeout_secs", &self.auth_lookup_timeout_secs)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// The profile named by `APP_MODE` provides defaults; individual variables
    /// then override them.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_MODE") {
            Some(mode) => mode.parse()?,
            None => Environment::Development,
        };

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        url::Url::parse(&database_url).map_err(|e| ConfigError::Invalid {
            name: "DATABASE_URL",
            reason: e.to_string(),
        })?;

        let jwt_secret = lookup("JWT_SECRET")
            .or_else(|| lookup("SECRET"))
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Self::profile(environment, database_url, jwt_secret).with_overrides(&lookup)
    }

    /// Defaults for `environment` with the two required values filled in.
    pub fn profile(
        environment: Environment,
        database_url: impl Into<String>,
        jwt_secret: impl Into<String>,
    ) -> Self {
        let mut config = match environment {
            Environment::Development => Self::development(),
            Environment::Staging => Self::staging(),
            Environment::Production => Self::production(),
        };
        config.database.url = database_url.into();
        config.security.jwt_secret = jwt_secret.into();
        config
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        override_parsed(lookup, "PORT", &mut self.server.port)?;
        override_parsed(lookup, "REQUEST_TIMEOUT_SECS", &mut self.server.request_timeout_secs)?;

        // Database overrides
        override_parsed(lookup, "DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections)?;
        override_parsed(lookup, "DATABASE_CONNECT_TIMEOUT_SECS", &mut self.database.connect_timeout_secs)?;

        // API overrides
        override_parsed(lookup, "API_DEFAULT_LIST_LIMIT", &mut self.api.default_list_limit)?;
        override_parsed(lookup, "API_MAX_LIST_LIMIT", &mut self.api.max_list_limit)?;
        override_parsed(lookup, "API_MAX_REQUEST_SIZE_BYTES", &mut self.api.max_request_size_bytes)?;
        override_parsed(lookup, "API_ENABLE_REQUEST_LOGGING", &mut self.api.enable_request_logging)?;

        // Security overrides
        override_parsed(lookup, "SECURITY_TOKEN_TTL_HOURS", &mut self.security.token_ttl_hours)?;
        override_parsed(
            lookup,
            "SECURITY_AUTH_LOOKUP_TIMEOUT_SECS",
            &mut self.security.auth_lookup_timeout_secs,
        )?;
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Durations feed `Instant` and `DateTime` arithmetic, which panics on overflow.
        ensure_range("REQUEST_TIMEOUT_SECS", self.server.request_timeout_secs, 1, MAX_TIMEOUT_SECS)?;
        ensure_range(
            "DATABASE_CONNECT_TIMEOUT_SECS",
            self.database.connect_timeout_secs,
            1,
            MAX_TIMEOUT_SECS,
        )?;
        ensure_range(
            "SECURITY_AUTH_LOOKUP_TIMEOUT_SECS",
            self.security.auth_lookup_timeout_secs,
            1,
            MAX_TIMEOUT_SECS,
        )?;
        ensure_range("SECURITY_TOKEN_TTL_HOURS", self.security.token_ttl_hours, 1, MAX_TOKEN_TTL_HOURS)?;
        if self.api.default_list_limit > self.api.max_list_limit {
            self.api.default_list_limit = self.api.max_list_limit;
        }
        Ok(self)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.database.connect_timeout_secs)
    }

    pub fn auth_lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.security.auth_lookup_timeout_secs)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.security.token_ttl_hours)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8090,
                request_timeout_secs: 120,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connect_timeout_secs: 10,
            },
            api: ApiConfig {
                default_list_limit: 100,
                max_list_limit: 1000,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                token_ttl_hours: 24 * 30,
                auth_lookup_timeout_secs: 30,
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8090,
                request_timeout_secs: 120,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                connect_timeout_secs: 10,
            },
            api: ApiConfig {
                default_list_limit: 100,
                max_list_limit: 500,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                token_ttl_hours: 24 * 30,
                auth_lookup_timeout_secs: 30,
                cors_origins: Vec::new(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8090,
                request_timeout_secs: 120,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 50,
                connect_timeout_secs: 10,
            },
            api: ApiConfig {
                default_list_limit: 50,
                max_list_limit: 100,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                token_ttl_hours: 24 * 30,
                auth_lookup_timeout_secs: 30,
                cors_origins: Vec::new(),
            },
        }
    }
}

/// One day.
const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;
/// Ten years.
const MAX_TOKEN_TTL_HOURS: i64 = 10 * 365 * 24;

fn ensure_range<T>(name: &'static str, value: T, min: T, max: T) -> Result<(), ConfigError>
where
    T: PartialOrd + fmt::Display,
{
    if value < min || value > max {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("{} is outside {}..={}", value, min, max),
        });
    }
    Ok(())
}

fn override_parsed<F, T>(lookup: &F, name: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    if let Some(raw) = lookup(name) {
        *target = raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })?;
    }
    Ok(())
}
