//! Runtime configuration loaded from environment variables

/// Store and server settings
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | ADVPERM_DB | ./data/advperm.mdb | Store directory |
/// | ADVPERM_MAP_SIZE | 1073741824 | LMDB map size in bytes |
/// | ADVPERM_DIRECTORY | (unset) | JSON file with users, groups, roles and modules |
/// | PORT | 3000 | HTTP port (server feature) |
/// | LOG_LEVEL | info | Default tracing filter |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: String,
    pub map_size: usize,
    pub directory_path: Option<String>,
    pub port: u16,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./data/advperm.mdb".into(),
            map_size: 1 << 30,
            directory_path: None,
            port: 3000,
            log_level: "info".into(),
        }
    }
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let d = Self::default();
        Self {
            db_path: get("ADVPERM_DB").unwrap_or(d.db_path),
            map_size: get("ADVPERM_MAP_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(d.map_size),
            directory_path: get("ADVPERM_DIRECTORY").filter(|v| !v.is_empty()),
            port: get("PORT").and_then(|v| v.parse().ok()).unwrap_or(d.port),
            log_level: get("LOG_LEVEL").unwrap_or(d.log_level),
        }
    }

    /// Use a different store path, keeping everything else
    pub fn with_db_path(mut self, path: impl Into<String>) -> Self {
        self.db_path = path.into();
        self
    }
}
