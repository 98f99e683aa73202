// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The database target is resolved here exactly once, at startup. Any
//! failure is fatal: `main` refuses to start rather than risk connecting a
//! test run to the production database.

use std::env;
use std::fmt;

/// Default cap on CSV upload size (5 MiB).
pub const DEFAULT_IMPORT_MAX_BYTES: usize = 5 * 1024 * 1024;
/// Default pool size.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Explicit identifier of the production database (branch host, database name).
pub const PROD_IDENTIFIER_VAR: &str = "DATABASE_PROD_IDENTIFIER";

/// Runtime environment flag, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnv {
    Development,
    Production,
    Test,
}

impl RuntimeEnv {
    /// Parse `APP_ENV`. Anything other than `production` or `test` is development.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("production") => Self::Production,
            Some("test") => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Logical database a process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseMode {
    Development,
    Production,
    Test,
}

impl DatabaseMode {
    /// Map the numeric `DATABASE_MODE` selector (`1`/`2`/`3`).
    ///
    /// Absent or unrecognized selectors fall back to development.
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector.map(str::trim) {
            Some("1") => Self::Development,
            Some("2") => Self::Production,
            Some("3") => Self::Test,
            other => {
                tracing::warn!(
                    selector = other.unwrap_or("<unset>"),
                    "Unknown DATABASE_MODE, defaulting to development"
                );
                Self::Development
            }
        }
    }

    /// Environment variable holding this mode's connection string.
    pub fn url_var(self) -> &'static str {
        match self {
            Self::Development => "DATABASE_URL_DEV",
            Self::Production => "DATABASE_URL_PROD",
            Self::Test => "DATABASE_URL_TEST",
        }
    }

    fn branch_var(self) -> &'static str {
        match self {
            Self::Development => "DATABASE_BRANCH_DEV",
            Self::Production => "DATABASE_BRANCH_PROD",
            Self::Test => "DATABASE_BRANCH_TEST",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for DatabaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved database target.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub mode: DatabaseMode,
    /// Connection string. Never logged.
    pub url: String,
    /// Optional branch label, for diagnostics only.
    pub branch: Option<String>,
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("mode", &self.mode)
            .field("url", &"<redacted>")
            .field("branch", &self.branch)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl DatabaseConfig {
    /// Resolve the database target from an arbitrary key lookup.
    ///
    /// `APP_ENV=test` forces test mode regardless of `DATABASE_MODE`. In test
    /// mode the connection string may not be the production one, nor contain
    /// the configured production identifier.
    pub fn resolve<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let runtime = RuntimeEnv::parse(lookup("APP_ENV").as_deref());
        let selector = lookup("DATABASE_MODE");
        let verbose = runtime != RuntimeEnv::Production;

        if verbose {
            tracing::info!(
                selector = selector.as_deref().unwrap_or("<unset>"),
                app_env = runtime.as_str(),
                "Resolving database mode"
            );
        }

        let mode = if runtime == RuntimeEnv::Test {
            tracing::info!("APP_ENV=test detected, forcing test database");
            DatabaseMode::Test
        } else {
            DatabaseMode::from_selector(selector.as_deref())
        };

        let url = non_blank(mode.url_var()).ok_or(ConfigError::MissingDatabaseUrl {
            mode,
            var: mode.url_var(),
        })?;

        let prod_identifier = non_blank(PROD_IDENTIFIER_VAR);
        match mode {
            DatabaseMode::Test => {
                let prod_url = non_blank(DatabaseMode::Production.url_var());
                if prod_url.is_none() && prod_identifier.is_none() {
                    tracing::warn!(
                        "Production guard unconfigured: neither DATABASE_URL_PROD nor \
                         DATABASE_PROD_IDENTIFIER is set"
                    );
                }
                if prod_url.as_deref() == Some(url.as_str()) {
                    return Err(ConfigError::SafetyViolation(
                        "test mode resolved to the production connection string".to_string(),
                    ));
                }
                if let Some(identifier) = prod_identifier.as_deref() {
                    if url.contains(identifier) {
                        return Err(ConfigError::SafetyViolation(format!(
                            "test mode connection string references production identifier {identifier:?}"
                        )));
                    }
                }
            }
            DatabaseMode::Production => {
                if let Some(identifier) = prod_identifier.as_deref() {
                    if !url.contains(identifier) {
                        tracing::warn!(
                            "Production mode connection string does not reference the production identifier"
                        );
                    }
                }
            }
            DatabaseMode::Development => {}
        }

        let max_connections = match non_blank("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "DATABASE_MAX_CONNECTIONS",
                value: raw,
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let branch = non_blank(mode.branch_var());
        if verbose {
            tracing::info!(
                mode = %mode,
                branch = branch.as_deref().unwrap_or("N/A"),
                "Active database"
            );
        }

        Ok(Self {
            mode,
            url,
            branch,
            max_connections,
        })
    }

    pub fn is_production(&self) -> bool {
        self.mode == DatabaseMode::Production
    }

    pub fn is_test(&self) -> bool {
        self.mode == DatabaseMode::Test
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Runtime environment (`APP_ENV`)
    pub app_env: RuntimeEnv,
    /// Maximum accepted CSV upload size in bytes
    pub import_max_bytes: usize,
    /// Resolved database target
    pub database: DatabaseConfig,

    // --- Secrets ---
    /// Key the identity provider signs session tokens with (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// Webhook signing secret (`whsec_...`)
    pub webhook_signing_secret: String,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: raw,
            })?,
            None => 8080,
        };

        let import_max_bytes = match lookup("IMPORT_MAX_BYTES") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "IMPORT_MAX_BYTES",
                value: raw,
            })?,
            None => DEFAULT_IMPORT_MAX_BYTES,
        };

        Ok(Self {
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            port,
            app_env: RuntimeEnv::parse(lookup("APP_ENV").as_deref()),
            import_max_bytes,
            database: DatabaseConfig::resolve(&lookup)?,
            session_signing_key: lookup("SESSION_SIGNING_KEY")
                .ok_or(ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
            webhook_signing_secret: lookup("WEBHOOK_SIGNING_SECRET")
                .map(|v| v.trim().to_string())
                .ok_or(ConfigError::Missing("WEBHOOK_SIGNING_SECRET"))?,
        })
    }

    /// Offline configuration for tests. Never connects anywhere.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            app_env: RuntimeEnv::Test,
            import_max_bytes: DEFAULT_IMPORT_MAX_BYTES,
            database: DatabaseConfig {
                mode: DatabaseMode::Test,
                url: "postgres://localhost/leetlog_test".to_string(),
                branch: None,
                max_connections: 1,
            },
            session_signing_key: b"test_session_key_32_bytes_long!!".to_vec(),
            // base64("test_webhook_secret_for_signing")
            webhook_signing_secret: "whsec_dGVzdF93ZWJob29rX3NlY3JldF9mb3Jfc2lnbmluZw=="
                .to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Database URL not configured for {mode} mode. Set {var} in your environment.")]
    MissingDatabaseUrl {
        mode: DatabaseMode,
        var: &'static str,
    },

    #[error("SAFETY VIOLATION: {0}")]
    SafetyViolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Log sink shared between a test and its subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn resolve_logged(
        pairs: &[(&str, &str)],
    ) -> (Result<DatabaseConfig, ConfigError>, String) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, || {
            DatabaseConfig::resolve(lookup_from_pairs(pairs))
        });
        (result, logs.text())
    }

    fn lookup_from_pairs(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const DEV_URL: &str = "postgres://ep-sparkling-frog.example/leetlog";
    const PROD_URL: &str = "postgres://ep-dark-surf.example/leetlog";
    const TEST_URL: &str = "postgres://ep-restless-cloud.example/leetlog";

    fn all_urls() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL_DEV", DEV_URL),
            ("DATABASE_URL_PROD", PROD_URL),
            ("DATABASE_URL_TEST", TEST_URL),
            (PROD_IDENTIFIER_VAR, "ep-dark-surf"),
        ]
    }

    fn resolve(extra: &[(&'static str, &'static str)]) -> Result<DatabaseConfig, ConfigError> {
        let mut pairs = all_urls();
        pairs.extend_from_slice(extra);
        DatabaseConfig::resolve(lookup_from_pairs(&pairs))
    }

    #[test]
    fn test_selector_maps_modes() {
        let dev = resolve(&[("DATABASE_MODE", "1")]).unwrap();
        assert_eq!(dev.mode, DatabaseMode::Development);
        assert_eq!(dev.url, DEV_URL);

        let prod = resolve(&[("DATABASE_MODE", "2")]).unwrap();
        assert_eq!(prod.mode, DatabaseMode::Production);
        assert_eq!(prod.url, PROD_URL);
        assert!(prod.is_production());

        let test = resolve(&[("DATABASE_MODE", "3")]).unwrap();
        assert_eq!(test.mode, DatabaseMode::Test);
        assert_eq!(test.url, TEST_URL);
        assert!(test.is_test());
    }

    #[test]
    fn test_unknown_or_missing_selector_defaults_to_development() {
        assert_eq!(resolve(&[]).unwrap().mode, DatabaseMode::Development);
        assert_eq!(
            resolve(&[("DATABASE_MODE", "7")]).unwrap().mode,
            DatabaseMode::Development
        );
    }

    #[test]
    fn test_app_env_test_overrides_production_selector() {
        let config = resolve(&[("DATABASE_MODE", "2"), ("APP_ENV", "test")]).unwrap();
        assert_eq!(config.mode, DatabaseMode::Test);
        assert_eq!(config.url, TEST_URL);
    }

    #[test]
    fn test_missing_url_names_the_variable() {
        let lookup = lookup_from_pairs(&[("DATABASE_MODE", "2")]);
        let err = DatabaseConfig::resolve(lookup).unwrap_err();
        match err {
            ConfigError::MissingDatabaseUrl { mode, var } => {
                assert_eq!(mode, DatabaseMode::Production);
                assert_eq!(var, "DATABASE_URL_PROD");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_url_counts_as_missing() {
        let lookup = lookup_from_pairs(&[("DATABASE_MODE", "1"), ("DATABASE_URL_DEV", "   ")]);
        assert!(matches!(
            DatabaseConfig::resolve(lookup),
            Err(ConfigError::MissingDatabaseUrl { .. })
        ));
    }

    #[test]
    fn test_test_mode_rejects_production_identifier() {
        let lookup = lookup_from_pairs(&[
            ("APP_ENV", "test"),
            ("DATABASE_URL_TEST", "postgres://ep-dark-surf.example/leetlog_test"),
            (PROD_IDENTIFIER_VAR, "ep-dark-surf"),
        ]);
        assert!(matches!(
            DatabaseConfig::resolve(lookup),
            Err(ConfigError::SafetyViolation(_))
        ));
    }

    #[test]
    fn test_test_mode_rejects_production_url() {
        let lookup = lookup_from_pairs(&[
            ("DATABASE_MODE", "3"),
            ("DATABASE_URL_TEST", PROD_URL),
            ("DATABASE_URL_PROD", PROD_URL),
        ]);
        assert!(matches!(
            DatabaseConfig::resolve(lookup),
            Err(ConfigError::SafetyViolation(_))
        ));
    }

    #[test]
    fn test_test_mode_without_production_guard_warns() {
        let (result, logs) =
            resolve_logged(&[("APP_ENV", "test"), ("DATABASE_URL_TEST", TEST_URL)]);
        let config = result.unwrap();
        assert!(config.is_test());
        assert_eq!(config.url, TEST_URL);
        assert!(logs.contains("Production guard unconfigured"), "logs: {logs}");
    }

    #[test]
    fn test_test_mode_with_production_guard_does_not_warn() {
        let (result, logs) = resolve_logged(&[
            ("APP_ENV", "test"),
            ("DATABASE_URL_TEST", TEST_URL),
            (PROD_IDENTIFIER_VAR, "ep-dark-surf"),
        ]);
        assert!(result.unwrap().is_test());
        assert!(!logs.contains("Production guard unconfigured"), "logs: {logs}");
    }

    #[test]
    fn test_production_without_identifier_match_still_resolves() {
        let lookup = lookup_from_pairs(&[
            ("DATABASE_MODE", "2"),
            ("DATABASE_URL_PROD", "postgres://elsewhere.example/leetlog"),
            (PROD_IDENTIFIER_VAR, "ep-dark-surf"),
        ]);
        let config = DatabaseConfig::resolve(lookup).unwrap();
        assert_eq!(config.mode, DatabaseMode::Production);
    }

    #[test]
    fn test_invalid_max_connections() {
        let err = resolve(&[("DATABASE_MAX_CONNECTIONS", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "DATABASE_MAX_CONNECTIONS", .. }));
    }

    #[test]
    fn test_debug_redacts_url() {
        let config = resolve(&[]).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains(DEV_URL));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_config_from_lookup() {
        let mut pairs = all_urls();
        pairs.extend_from_slice(&[
            ("SESSION_SIGNING_KEY", "test_session_key"),
            ("WEBHOOK_SIGNING_SECRET", " whsec_abc "),
            ("APP_ENV", "production"),
            ("DATABASE_MODE", "2"),
        ]);
        let config = Config::from_lookup(lookup_from_pairs(&pairs)).expect("Config should load");

        assert_eq!(config.port, 8080);
        assert_eq!(config.app_env, RuntimeEnv::Production);
        assert_eq!(config.webhook_signing_secret, "whsec_abc");
        assert_eq!(config.session_signing_key, b"test_session_key".to_vec());
        assert_eq!(config.import_max_bytes, DEFAULT_IMPORT_MAX_BYTES);
        assert_eq!(config.database.mode, DatabaseMode::Production);
    }

    #[test]
    fn test_config_requires_session_key() {
        let mut pairs = all_urls();
        pairs.push(("WEBHOOK_SIGNING_SECRET", "whsec_abc"));
        let err = Config::from_lookup(lookup_from_pairs(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SESSION_SIGNING_KEY")));
    }
}
