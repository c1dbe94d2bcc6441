use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub cookie: CookieSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    pub database: Option<DatabaseSettings>,
    pub redis: Option<RedisSettings>,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct RedisSettings {
    pub url: String,
}

/// JWT signing settings. Access and refresh tokens use separate secrets.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64,  // seconds (e.g., 604800 for 7 days)
    pub issuer: String,
    #[serde(default)]
    pub leeway_seconds: u64,
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

/// Refresh cookie attributes
#[derive(serde::Deserialize, Clone)]
pub struct CookieSettings {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    #[serde(default = "default_true")]
    pub secure: bool,
    #[serde(default = "default_same_site")]
    pub same_site: SameSitePolicy,
    #[serde(default = "default_cookie_path")]
    pub path: String,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            secure: true,
            same_site: default_same_site(),
            path: default_cookie_path(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    Memory,
    Redis,
}

#[derive(serde::Deserialize, Clone)]
pub struct CacheSettings {
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackendKind,
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    Memory,
    Postgres,
}

#[derive(serde::Deserialize, Clone)]
pub struct StorageSettings {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackendKind,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_same_site() -> SameSitePolicy {
    SameSitePolicy::Strict
}

fn default_cache_backend() -> CacheBackendKind {
    CacheBackendKind::Memory
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_storage_backend() -> StorageBackendKind {
    StorageBackendKind::Memory
}

fn default_max_connections() -> u32 {
    5
}

impl Settings {
    /// Reject settings that would weaken the token model
    pub fn validate(&self) -> Result<(), ConfigError> {
        let jwt = &self.jwt;
        if jwt.access_secret.is_empty() || jwt.refresh_secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt secrets".to_string()));
        }
        if jwt.access_secret == jwt.refresh_secret {
            return Err(ConfigError::InvalidValue(
                "jwt.access_secret and jwt.refresh_secret must differ".to_string(),
            ));
        }
        if jwt.access_token_expiry <= 0 || jwt.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "token expiries must be positive".to_string(),
            ));
        }
        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::InvalidValue("cache.ttl_seconds must be positive".to_string()));
        }
        if self.storage.backend == StorageBackendKind::Postgres && self.database.is_none() {
            return Err(ConfigError::MissingRequired("database".to_string()));
        }
        if self.cache.backend == CacheBackendKind::Redis && self.redis.is_none() {
            return Err(ConfigError::MissingRequired("redis".to_string()));
        }
        Ok(())
    }
}

/// Load `configuration.yaml` (optional) overlaid with `APP__*` environment variables
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let settings = settings
        .try_deserialize::<Settings>()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            application: ApplicationSettings {
                host: default_host(),
                port: 0,
            },
            jwt: JwtSettings {
                access_secret: "a".repeat(32),
                refresh_secret: "r".repeat(32),
                access_token_expiry: 900,
                refresh_token_expiry: 604800,
                issuer: "test".to_string(),
                leeway_seconds: 0,
            },
            cookie: CookieSettings::default(),
            cache: CacheSettings::default(),
            storage: StorageSettings::default(),
            database: None,
            redis: None,
        }
    }

    #[test]
    fn test_defaults_validate() {
        let settings = settings();

        assert!(settings.validate().is_ok());
        assert_eq!(settings.cookie.name, "session");
        assert_eq!(settings.cache.ttl_seconds, 3600);
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let mut settings = settings();
        settings.jwt.refresh_secret = settings.jwt.access_secret.clone();

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_postgres_requires_database_section() {
        let mut settings = settings();
        settings.storage.backend = StorageBackendKind::Postgres;

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_cookie_section_deserializes() {
        let yaml = r#"{"name":"sid","same_site":"lax"}"#;
        let cookie: CookieSettings = serde_json::from_str(yaml).unwrap();

        assert_eq!(cookie.name, "sid");
        assert_eq!(cookie.same_site, SameSitePolicy::Lax);
        assert!(cookie.secure);
        assert_eq!(cookie.path, "/");
    }
}
