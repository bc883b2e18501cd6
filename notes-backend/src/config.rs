use std::env;
use std::fmt;
use std::path::PathBuf;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const HOST: &str = "HOST";
    pub const PORT: &str = "PORT";
    /// Explicit backend override: "file", "sqlite" or "postgres".
    /// When unset the backend is chosen by which storage variable is present.
    pub const NOTES_BACKEND: &str = "NOTES_BACKEND";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const NOTES_DB_PATH: &str = "NOTES_DB_PATH";
    pub const NOTES_FILE: &str = "NOTES_FILE";
    pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
    /// Set to "true" or "1" to return raw storage error text to API callers.
    pub const EXPOSE_STORAGE_ERRORS: &str = "NOTES_EXPOSE_STORAGE_ERRORS";
}

/// Default values
pub mod defaults {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 5000;
    pub const NOTES_DB_PATH: &str = "./.db/notes.db";
    pub const NOTES_FILE: &str = "notes.json";
    pub const DATABASE_MAX_CONNECTIONS: u32 = 5;
}

/// Where notes are persisted
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    /// Whole collection as one JSON array on disk
    File { path: PathBuf },
    /// Local embedded SQLite database
    Sqlite { path: PathBuf },
    /// Remote PostgreSQL server
    Postgres { url: String },
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::File { path } => write!(f, "file ({})", path.display()),
            StorageBackend::Sqlite { path } => write!(f, "sqlite ({})", path.display()),
            // The URL may carry credentials
            StorageBackend::Postgres { .. } => write!(f, "postgres"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: StorageBackend,
    pub max_connections: u32,
    pub expose_storage_errors: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get(env_vars::PORT) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Invalid {} '{}', using {}", env_vars::PORT, raw, defaults::PORT);
                defaults::PORT
            }),
            None => defaults::PORT,
        };

        let max_connections = get(env_vars::DATABASE_MAX_CONNECTIONS)
            .and_then(|raw| raw.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults::DATABASE_MAX_CONNECTIONS);

        let database_url = get(env_vars::DATABASE_URL);
        let db_path = get(env_vars::NOTES_DB_PATH);
        let file_path = get(env_vars::NOTES_FILE);

        let backend = match get(env_vars::NOTES_BACKEND).map(|b| b.to_lowercase()) {
            Some(name) => match name.as_str() {
                "file" | "json" => StorageBackend::File {
                    path: PathBuf::from(file_path.unwrap_or_else(|| defaults::NOTES_FILE.to_string())),
                },
                "sqlite" => StorageBackend::Sqlite {
                    path: PathBuf::from(db_path.unwrap_or_else(|| defaults::NOTES_DB_PATH.to_string())),
                },
                "postgres" | "postgresql" => StorageBackend::Postgres {
                    url: database_url.ok_or_else(|| {
                        format!(
                            "{}=postgres requires {} to be set",
                            env_vars::NOTES_BACKEND,
                            env_vars::DATABASE_URL
                        )
                    })?,
                },
                other => {
                    return Err(format!(
                        "Unknown {} '{}' (expected file, sqlite or postgres)",
                        env_vars::NOTES_BACKEND,
                        other
                    ));
                }
            },
            None => {
                if let Some(url) = database_url {
                    StorageBackend::Postgres { url }
                } else if let Some(path) = db_path {
                    StorageBackend::Sqlite { path: PathBuf::from(path) }
                } else {
                    StorageBackend::File {
                        path: PathBuf::from(file_path.unwrap_or_else(|| defaults::NOTES_FILE.to_string())),
                    }
                }
            }
        };

        let expose_storage_errors = get(env_vars::EXPOSE_STORAGE_ERRORS)
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host: get(env_vars::HOST).unwrap_or_else(|| defaults::HOST.to_string()),
            port,
            backend,
            max_connections,
            expose_storage_errors,
        })
    }
}
