use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Longest a change notification may stay on screen.
pub const MAX_TOAST_TTL: Duration = Duration::from_secs(3600);

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub remote: RemoteConfig,
    pub dashboard: DashboardConfig,
    pub drafts: DraftConfig,
    pub directory: DirectoryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let remote = RemoteConfig {
            url: optional_var("BAAS_URL").map(|url| url.trim_end_matches('/').to_string()),
            anon_key: optional_var("BAAS_ANON_KEY").unwrap_or_default(),
            service_key: optional_var("BAAS_SERVICE_KEY"),
            cv_bucket: optional_var("BAAS_CV_BUCKET").unwrap_or_else(|| "cvs".to_string()),
            dev_admin_token: optional_var("DEV_ADMIN_TOKEN"),
            webhook_secret: optional_var("REALTIME_WEBHOOK_SECRET"),
        };
        if remote.url.is_some() && remote.anon_key.is_empty() {
            return Err(ConfigError::MissingVar("BAAS_ANON_KEY"));
        }

        let dashboard = DashboardConfig {
            refresh_interval: Duration::from_secs(parse_var("DASHBOARD_REFRESH_SECS", 30)?),
            toast_ttl: Duration::from_secs(parse_var("DASHBOARD_TOAST_SECS", 3)?),
            auto_refresh: parse_flag("DASHBOARD_AUTO_REFRESH", true)?,
        };
        if dashboard.refresh_interval.is_zero() {
            return Err(ConfigError::InvalidNumber("DASHBOARD_REFRESH_SECS"));
        }
        if dashboard.toast_ttl > MAX_TOAST_TTL {
            return Err(ConfigError::InvalidNumber("DASHBOARD_TOAST_SECS"));
        }

        let drafts = DraftConfig {
            directory: PathBuf::from(
                optional_var("DRAFT_DIR").unwrap_or_else(|| ".drafts".to_string()),
            ),
            debounce: Duration::from_millis(parse_var("DRAFT_DEBOUNCE_MS", 1000)?),
        };

        let directory = DirectoryConfig {
            access_code: optional_var("DIRECTORY_ACCESS_CODE"),
            access_code_hash: optional_var("DIRECTORY_ACCESS_CODE_HASH"),
            page_size: parse_var("DIRECTORY_PAGE_SIZE", 50)? as usize,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            remote,
            dashboard,
            drafts,
            directory,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber(name)),
        None => Ok(default),
    }
}

fn parse_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match optional_var(name).map(|raw| raw.to_ascii_lowercase()) {
        None => Ok(default),
        Some(raw) => match raw.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFlag(name)),
        },
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Endpoint and keys for the hosted data service. Without a URL the service
/// runs against the in-process backend.
#[derive(Clone)]
pub struct RemoteConfig {
    pub url: Option<String>,
    pub anon_key: String,
    pub service_key: Option<String>,
    pub cv_bucket: String,
    pub dev_admin_token: Option<String>,
    /// Shared secret the realtime webhook must present in `x-webhook-secret`.
    pub webhook_secret: Option<String>,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("anon_key", &redacted(&self.anon_key))
            .field("service_key", &self.service_key.as_deref().map(redacted))
            .field("cv_bucket", &self.cv_bucket)
            .field(
                "dev_admin_token",
                &self.dev_admin_token.as_deref().map(redacted),
            )
            .field(
                "webhook_secret",
                &self.webhook_secret.as_deref().map(redacted),
            )
            .finish()
    }
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

/// Refresh cadence and notification timing for the admin dashboard.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub refresh_interval: Duration,
    pub toast_ttl: Duration,
    pub auto_refresh: bool,
}

/// Where form drafts are persisted and how long saves are debounced.
#[derive(Debug, Clone)]
pub struct DraftConfig {
    pub directory: PathBuf,
    pub debounce: Duration,
}

/// How the talent directory is unlocked. A stored hash takes precedence over
/// a plaintext code.
#[derive(Clone)]
pub struct DirectoryConfig {
    pub access_code: Option<String>,
    pub access_code_hash: Option<String>,
    pub page_size: usize,
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("access_code", &self.access_code.as_deref().map(redacted))
            .field("access_code_hash", &self.access_code_hash.is_some())
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber(&'static str),
    InvalidFlag(&'static str),
    MissingVar(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber(name) => {
                write!(f, "{name} must be a positive whole number within range")
            }
            ConfigError::InvalidFlag(name) => write!(f, "{name} must be true or false"),
            ConfigError::MissingVar(name) => write!(f, "{name} must be set"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "BAAS_URL",
            "BAAS_ANON_KEY",
            "BAAS_SERVICE_KEY",
            "BAAS_CV_BUCKET",
            "DEV_ADMIN_TOKEN",
            "REALTIME_WEBHOOK_SECRET",
            "DASHBOARD_REFRESH_SECS",
            "DASHBOARD_TOAST_SECS",
            "DASHBOARD_AUTO_REFRESH",
            "DRAFT_DIR",
            "DRAFT_DEBOUNCE_MS",
            "DIRECTORY_ACCESS_CODE",
            "DIRECTORY_ACCESS_CODE_HASH",
            "DIRECTORY_PAGE_SIZE",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.remote.url.is_none());
        assert_eq!(config.remote.cv_bucket, "cvs");
        assert_eq!(config.dashboard.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.dashboard.toast_ttl, Duration::from_secs(3));
        assert!(config.dashboard.auto_refresh);
        assert_eq!(config.drafts.debounce, Duration::from_millis(1000));
        assert!(config.directory.access_code.is_none());
        assert!(config.directory.access_code_hash.is_none());
        assert!(config.remote.webhook_secret.is_none());
    }

    #[test]
    fn toast_lifetime_is_bounded() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DASHBOARD_TOAST_SECS", "18446744073709551615");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber("DASHBOARD_TOAST_SECS"))
        ));

        env::set_var("DASHBOARD_TOAST_SECS", "3600");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.dashboard.toast_ttl, MAX_TOAST_TTL);
        reset_env();
    }

    #[test]
    fn secrets_are_read_but_never_printed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("REALTIME_WEBHOOK_SECRET", "hook-secret");
        env::set_var("DIRECTORY_ACCESS_CODE_HASH", "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.remote.webhook_secret.as_deref(), Some("hook-secret"));
        assert!(config.directory.access_code_hash.is_some());

        let printed = format!("{config:?}");
        assert!(!printed.contains("hook-secret"));
        assert!(!printed.contains("argon2id"));
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn remote_url_requires_anon_key() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("BAAS_URL", "https://example.supabase.co/");
        match AppConfig::load() {
            Err(ConfigError::MissingVar("BAAS_ANON_KEY")) => {}
            other => panic!("expected missing anon key, got {other:?}"),
        }

        env::set_var("BAAS_ANON_KEY", "anon");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.remote.url.as_deref(),
            Some("https://example.supabase.co")
        );
        assert!(!format!("{:?}", config.remote).contains("anon\""));
        reset_env();
    }

    #[test]
    fn rejects_malformed_dashboard_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DASHBOARD_AUTO_REFRESH", "sometimes");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFlag("DASHBOARD_AUTO_REFRESH"))
        ));

        env::set_var("DASHBOARD_AUTO_REFRESH", "off");
        env::set_var("DASHBOARD_REFRESH_SECS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber("DASHBOARD_REFRESH_SECS"))
        ));

        env::set_var("DASHBOARD_REFRESH_SECS", "45");
        let config = AppConfig::load().expect("config loads");
        assert!(!config.dashboard.auto_refresh);
        assert_eq!(config.dashboard.refresh_interval, Duration::from_secs(45));
        reset_env();
    }
}
