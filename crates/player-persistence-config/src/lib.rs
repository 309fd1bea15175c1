use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const ENV_PLAYER_PERSISTENCE_CONFIG: &str = "PLAYER_PERSISTENCE_CONFIG";
pub const ENV_DB_URL: &str = "DB_URL";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASS: &str = "DB_PASS";
pub const ENV_SERVER_NODE: &str = "SERVER_NODE";

const DEFAULT_DATABASE_URL: &str = "./player-persistence.db";
const DEFAULT_DATABASE_USERNAME: &str = "minecraft";
const DEFAULT_DATABASE_PASSWORD: &str = "";
const DEFAULT_SERVER_NODE: &str = "main";
const DEFAULT_DATABASE_BUSY_TIMEOUT_MS: u64 = 5000;
const DEFAULT_DATABASE_WAL_ENABLED: bool = true;
const DEFAULT_DATABASE_SYNCHRONOUS: &str = "NORMAL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Server node identifier. Location data is partitioned per node.
    #[serde(default = "default_server_node")]
    pub node: String,
    #[serde(default)]
    pub database: DatabaseConfigToml,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfigToml {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_database_username")]
    pub username: String,
    #[serde(default = "default_database_password")]
    pub password: String,
    #[serde(default = "default_database_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_database_wal_enabled")]
    pub wal_enabled: bool,
    #[serde(default = "default_database_synchronous")]
    pub synchronous: String,
}

impl Default for DatabaseConfigToml {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            username: default_database_username(),
            password: default_database_password(),
            busy_timeout_ms: default_database_busy_timeout_ms(),
            wal_enabled: default_database_wal_enabled(),
            synchronous: default_database_synchronous(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            node: default_server_node(),
            database: DatabaseConfigToml::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRuntimeConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub busy_timeout_ms: u64,
    pub wal_enabled: bool,
    pub synchronous: String,
}

impl PersistenceConfig {
    pub fn database_runtime(&self) -> DatabaseRuntimeConfig {
        DatabaseRuntimeConfig {
            url: self.database.url.clone(),
            username: self.database.username.clone(),
            password: self.database.password.clone(),
            busy_timeout_ms: self.database.busy_timeout_ms,
            wal_enabled: self.database.wal_enabled,
            synchronous: self.database.synchronous.clone(),
        }
    }
}

/// Loads configuration the way a server process sees it at startup.
///
/// The optional TOML file named by `PLAYER_PERSISTENCE_CONFIG` is read first,
/// then `DB_URL`, `DB_USER`, `DB_PASS` and `SERVER_NODE` override it. Blank
/// variables are treated as unset.
pub fn load_from_env() -> Result<PersistenceConfig, ConfigError> {
    let mut config = match env_value(ENV_PLAYER_PERSISTENCE_CONFIG)? {
        Some(path) => read_config_file(Path::new(&path))?,
        None => PersistenceConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    normalize_config(&mut config);
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PersistenceConfig, ConfigError> {
    let mut config = read_config_file(path.as_ref())?;
    normalize_config(&mut config);
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<PersistenceConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to read PLAYER_PERSISTENCE_CONFIG from {}: {err}",
            path.display()
        ))
    })?;

    toml::from_str(&raw).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to parse PLAYER_PERSISTENCE_CONFIG from {}: {err}",
            path.display()
        ))
    })
}

fn apply_env_overrides(config: &mut PersistenceConfig) -> Result<(), ConfigError> {
    if let Some(url) = env_value(ENV_DB_URL)? {
        config.database.url = url;
    }
    if let Some(username) = env_value(ENV_DB_USER)? {
        config.database.username = username;
    }
    if let Some(password) = env_value(ENV_DB_PASS)? {
        config.database.password = password;
    }
    if let Some(node) = env_value(ENV_SERVER_NODE)? {
        config.node = node;
    }
    Ok(())
}

fn env_value(name: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_owned()))
            }
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(_) => Err(ConfigError::configuration(format!(
            "{name} contained invalid UTF-8"
        ))),
    }
}

fn default_server_node() -> String {
    DEFAULT_SERVER_NODE.to_owned()
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_owned()
}

fn default_database_username() -> String {
    DEFAULT_DATABASE_USERNAME.to_owned()
}

fn default_database_password() -> String {
    DEFAULT_DATABASE_PASSWORD.to_owned()
}

fn default_database_busy_timeout_ms() -> u64 {
    DEFAULT_DATABASE_BUSY_TIMEOUT_MS
}

fn default_database_wal_enabled() -> bool {
    DEFAULT_DATABASE_WAL_ENABLED
}

fn default_database_synchronous() -> String {
    DEFAULT_DATABASE_SYNCHRONOUS.to_owned()
}

fn normalize_config(config: &mut PersistenceConfig) {
    normalize_non_empty_string(&mut config.node, default_server_node());
    normalize_database_config(&mut config.database);
}

pub fn normalize_database_config(config: &mut DatabaseConfigToml) -> bool {
    let mut changed = false;

    changed |= normalize_non_empty_string(&mut config.url, default_database_url());
    changed |= normalize_non_empty_string(&mut config.username, default_database_username());

    let normalized_busy_timeout_ms = if config.busy_timeout_ms == 0 {
        default_database_busy_timeout_ms()
    } else {
        config.busy_timeout_ms.clamp(100, 60_000)
    };
    if normalized_busy_timeout_ms != config.busy_timeout_ms {
        config.busy_timeout_ms = normalized_busy_timeout_ms;
        changed = true;
    }

    let normalized_synchronous = normalize_database_synchronous(config.synchronous.as_str());
    if normalized_synchronous != config.synchronous {
        config.synchronous = normalized_synchronous;
        changed = true;
    }

    changed
}

fn normalize_non_empty_string(value: &mut String, default: String) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        if *value != default {
            *value = default;
            return true;
        }
        return false;
    }

    if trimmed.len() != value.len() {
        *value = trimmed.to_owned();
        return true;
    }

    false
}

fn normalize_database_synchronous(value: &str) -> String {
    let upper = value.trim().to_ascii_uppercase();
    match upper.as_str() {
        "OFF" | "NORMAL" | "FULL" | "EXTRA" => upper,
        _ => default_database_synchronous(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    const ALL_ENV: [&str; 5] = [
        ENV_PLAYER_PERSISTENCE_CONFIG,
        ENV_DB_URL,
        ENV_DB_USER,
        ENV_DB_PASS,
        ENV_SERVER_NODE,
    ];

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvSnapshot {
        saved: Vec<(&'static str, Option<OsString>)>,
    }

    impl EnvSnapshot {
        fn capture() -> Self {
            Self {
                saved: ALL_ENV
                    .iter()
                    .map(|name| (*name, std::env::var_os(name)))
                    .collect(),
            }
        }
    }

    impl Drop for EnvSnapshot {
        fn drop(&mut self) {
            for (name, value) in self.saved.drain(..) {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }
    }

    fn with_env_vars<F>(vars: &[(&str, Option<&str>)], test: F)
    where
        F: FnOnce(),
    {
        let _guard = env_lock()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _snapshot = EnvSnapshot::capture();

        for name in ALL_ENV {
            std::env::remove_var(name);
        }
        for (name, value) in vars {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }

        test();
    }

    #[test]
    fn with_env_vars_restores_values_after_a_panicking_test() {
        let guard = env_lock()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let original = EnvSnapshot::capture();
        std::env::set_var(ENV_SERVER_NODE, "outer");
        drop(guard);

        let outcome = std::panic::catch_unwind(|| {
            with_env_vars(&[(ENV_SERVER_NODE, Some("inner"))], || {
                panic!("assertion inside env scope");
            });
        });
        assert!(outcome.is_err());

        let _guard = env_lock()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let restored = std::env::var(ENV_SERVER_NODE);
        drop(original);
        assert_eq!(restored.expect("restored value"), "outer");
    }

    fn unique_temp_file(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "player-persistence-config-{prefix}-{nanos}-{}.toml",
            std::process::id()
        ))
    }

    #[test]
    fn load_from_env_uses_documented_defaults() {
        with_env_vars(&[], || {
            let config = load_from_env().expect("load defaults");
            assert_eq!(config.node, "main");
            assert_eq!(config.database.url, "./player-persistence.db");
            assert_eq!(config.database.username, "minecraft");
            assert_eq!(config.database.password, "");
            assert_eq!(config.database.busy_timeout_ms, 5000);
            assert!(config.database.wal_enabled);
            assert_eq!(config.database.synchronous, "NORMAL");
        });
    }

    #[test]
    fn load_from_env_applies_each_override() {
        with_env_vars(
            &[
                (ENV_DB_URL, Some("sqlite::memory:")),
                (ENV_DB_USER, Some("steve")),
                (ENV_DB_PASS, Some("hunter2")),
                (ENV_SERVER_NODE, Some("lobby_2")),
            ],
            || {
                let config = load_from_env().expect("load overrides");
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.database.username, "steve");
                assert_eq!(config.database.password, "hunter2");
                assert_eq!(config.node, "lobby_2");
            },
        );
    }

    #[test]
    fn load_from_env_treats_blank_values_as_unset() {
        with_env_vars(
            &[(ENV_SERVER_NODE, Some("   ")), (ENV_DB_URL, Some(""))],
            || {
                let config = load_from_env().expect("load with blanks");
                assert_eq!(config.node, "main");
                assert_eq!(config.database.url, "./player-persistence.db");
            },
        );
    }

    #[test]
    fn env_overrides_take_precedence_over_config_file() {
        let path = unique_temp_file("layered");
        std::fs::write(
            &path,
            r#"node = "survival"

[database]
url = "/srv/players.db"
username = "file-user"
busy_timeout_ms = 250
"#,
        )
        .expect("write fixture config");
        let path_str = path.to_str().expect("utf-8 path").to_owned();

        with_env_vars(
            &[
                (ENV_PLAYER_PERSISTENCE_CONFIG, Some(path_str.as_str())),
                (ENV_SERVER_NODE, Some("creative")),
            ],
            || {
                let config = load_from_env().expect("load layered config");
                assert_eq!(config.node, "creative");
                assert_eq!(config.database.url, "/srv/players.db");
                assert_eq!(config.database.username, "file-user");
                assert_eq!(config.database.busy_timeout_ms, 250);
            },
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_from_env_reports_missing_config_file() {
        let path = unique_temp_file("missing");
        let path_str = path.to_str().expect("utf-8 path").to_owned();

        with_env_vars(
            &[(ENV_PLAYER_PERSISTENCE_CONFIG, Some(path_str.as_str()))],
            || {
                let err = load_from_env().expect_err("missing file should fail");
                assert!(err.to_string().contains("Failed to read"));
            },
        );
    }

    #[test]
    fn load_from_path_returns_parse_error_for_invalid_toml() {
        let path = unique_temp_file("invalid");
        std::fs::write(&path, "node = [").expect("write invalid config");

        let err = load_from_path(&path).expect_err("invalid toml should fail");
        assert!(err.to_string().contains("Failed to parse"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn normalize_database_config_clamps_and_repairs_values() {
        let mut database = DatabaseConfigToml {
            url: "  ".to_owned(),
            username: " ops ".to_owned(),
            password: String::new(),
            busy_timeout_ms: 1,
            wal_enabled: false,
            synchronous: "full".to_owned(),
        };

        assert!(normalize_database_config(&mut database));
        assert_eq!(database.url, "./player-persistence.db");
        assert_eq!(database.username, "ops");
        assert_eq!(database.busy_timeout_ms, 100);
        assert_eq!(database.synchronous, "FULL");

        database.synchronous = "sometimes".to_owned();
        database.busy_timeout_ms = 0;
        assert!(normalize_database_config(&mut database));
        assert_eq!(database.synchronous, "NORMAL");
        assert_eq!(database.busy_timeout_ms, 5000);

        assert!(!normalize_database_config(&mut database));
    }

    #[test]
    fn database_runtime_slice_exposes_database_fields() {
        let config = PersistenceConfig {
            node: "main".to_owned(),
            database: DatabaseConfigToml {
                url: "sqlite::memory:".to_owned(),
                username: "steve".to_owned(),
                password: "pw".to_owned(),
                busy_timeout_ms: 750,
                wal_enabled: false,
                synchronous: "OFF".to_owned(),
            },
        };

        assert_eq!(
            config.database_runtime(),
            DatabaseRuntimeConfig {
                url: "sqlite::memory:".to_owned(),
                username: "steve".to_owned(),
                password: "pw".to_owned(),
                busy_timeout_ms: 750,
                wal_enabled: false,
                synchronous: "OFF".to_owned(),
            }
        );
    }
}
