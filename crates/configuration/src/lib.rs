use config::Environment;
use std::collections::HashMap;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_tracing;
pub use settings::{Config, DatabaseConfig, LoggingConfig, ServerConfig, StorageBackend, StorageConfig};

/// The config file read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "ledger.toml";

/// Prefix of the structured environment overrides, e.g. `LEDGER__SERVER__PORT=9090`.
pub const ENV_PREFIX: &str = "LEDGER";

/// Plain variables understood for compatibility with existing deployments,
/// mapped onto their config keys. These win over every other source.
const LEGACY_VARS: [(&str, &str); 7] = [
    ("DATABASE_URL", "database.url"),
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DB_USER", "database.user"),
    ("DB_PASSWORD", "database.password"),
    ("DB_NAME", "database.name"),
    ("SERVER_PORT", "server.port"),
];

/// Loads the application configuration.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file at
/// `path` (or `ledger.toml`; a missing file is fine), `LEDGER__*`
/// environment variables, then the legacy `DB_*`/`SERVER_PORT`/`DATABASE_URL`
/// variables. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_from(path, std::env::vars().collect())
}

/// Same as [`load_config`], reading variables from `vars` instead of the
/// process environment.
pub fn load_config_from(
    path: Option<&Path>,
    vars: HashMap<String, String>,
) -> Result<Config, ConfigError> {
    let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

    let mut builder = config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080_i64)?
        .set_default("server.body_limit", 1024_i64 * 1024)?
        .set_default("database.host", "localhost")?
        .set_default("database.port", 5432_i64)?
        .set_default("database.user", "postgres")?
        .set_default("database.password", "postgres")?
        .set_default("database.name", "analytics")?
        .set_default("database.max_connections", 10_i64)?
        .set_default("database.acquire_timeout", "5s")?
        .set_default("storage.backend", "postgres")?
        .set_default("logging.level", "info")?
        .set_default("logging.file_prefix", "ledger.log")?
        .add_source(config::File::from(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone().into_iter().collect())),
        );

    for (var, key) in LEGACY_VARS {
        let Some(value) = vars.get(var).filter(|v| !v.is_empty()) else {
            continue;
        };
        builder = if key.ends_with(".port") {
            let port: u16 = value.parse().map_err(|_| {
                ConfigError::ValidationError(format!("{var} must be a port number, got '{value}'"))
            })?;
            builder.set_override(key, i64::from(port))?
        } else {
            builder.set_override(key, value.as_str())?
        };
    }

    let config = builder.build()?.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::IpAddr;
    use std::time::Duration;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn missing_file() -> std::path::PathBuf {
        std::env::temp_dir().join("ledger-config-that-does-not-exist.toml")
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let config = load_config_from(Some(&missing_file()), HashMap::new()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0".parse::<IpAddr>().unwrap());
        assert_eq!(config.server.static_dir, None);
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.name, "analytics");
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 3000
static_dir = "web"

[database]
max_connections = 4
acquire_timeout = "2s"

[storage]
backend = "memory"
"#
        )
        .unwrap();

        let config = load_config_from(Some(file.path()), HashMap::new()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.static_dir.as_deref(), Some(Path::new("web")));
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(2));
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        // Untouched keys keep their defaults.
        assert_eq!(config.database.user, "postgres");
    }

    #[test]
    fn prefixed_env_overrides_file() {
        let config = load_config_from(
            Some(&missing_file()),
            vars(&[("LEDGER__SERVER__PORT", "9000"), ("LEDGER__LOGGING__LEVEL", "debug")]),
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn legacy_variables_are_honoured() {
        let config = load_config_from(
            Some(&missing_file()),
            vars(&[
                ("DB_HOST", "customhost"),
                ("DB_PORT", "5433"),
                ("DB_USER", "customuser"),
                ("DB_PASSWORD", "custompass"),
                ("DB_NAME", "customdb"),
                ("SERVER_PORT", "9090"),
                ("LEDGER__SERVER__PORT", "9000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.database.host, "customhost");
        assert_eq!(config.database.port, 5433);
        assert_eq!(config.database.user, "customuser");
        assert_eq!(config.database.password, "custompass");
        assert_eq!(config.database.name, "customdb");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn database_url_is_picked_up() {
        let config = load_config_from(
            Some(&missing_file()),
            vars(&[("DATABASE_URL", "postgres://u:p@db:5432/ledger")]),
        )
        .unwrap();
        assert_eq!(config.database.url.as_deref(), Some("postgres://u:p@db:5432/ledger"));
    }

    #[test]
    fn bad_legacy_port_is_rejected() {
        let err = load_config_from(Some(&missing_file()), vars(&[("SERVER_PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_port_fails_validation() {
        let err = load_config_from(Some(&missing_file()), vars(&[("LEDGER__SERVER__PORT", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
