use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::SqliteStore;
use crate::{Error, Result};

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const DEFAULT_TOP_CUSTOMERS: usize = 5;

/// Optional on-disk configuration (`ticketdb.toml`)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TicketConfig {
    pub database_url: Option<String>,
    pub top_customers: Option<usize>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("ticketdb.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<TicketConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: TicketConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(Some(config))
}

/// Where the SQLite database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    File(PathBuf),
    Memory,
}

impl StorageTarget {
    /// Parse a connection string.
    ///
    /// Accepts `sqlite:///relative.db`, `sqlite:////abs/path.db`,
    /// `sqlite://` or `:memory:` for an in-memory database, and bare paths.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Config("empty database url".into()));
        }

        let Some((scheme, rest)) = url.split_once("://") else {
            return Ok(if url == ":memory:" {
                StorageTarget::Memory
            } else {
                StorageTarget::File(PathBuf::from(url))
            });
        };

        if scheme != "sqlite" {
            return Err(Error::Config(format!(
                "unsupported database scheme {:?}, only sqlite is available",
                scheme
            )));
        }

        match rest {
            "" | "/:memory:" => Ok(StorageTarget::Memory),
            _ => match rest.strip_prefix('/') {
                Some(path) if !path.is_empty() => Ok(StorageTarget::File(PathBuf::from(path))),
                _ => Err(Error::Config(format!(
                    "expected sqlite:///<path> in database url, got {:?}",
                    url
                ))),
            },
        }
    }

    /// Open a store for this target, creating the parent directory of a file database
    pub fn open(&self) -> Result<SqliteStore> {
        match self {
            StorageTarget::Memory => SqliteStore::open_in_memory(),
            StorageTarget::File(path) => {
                ensure_db_dir(path)?;
                SqliteStore::open(path)
            }
        }
    }
}

/// Everything a command needs to run, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub storage: StorageTarget,
    pub top_customers: usize,
}

impl Settings {
    /// Resolve the database from the flag/environment value first, then the config file.
    pub fn resolve(database_url: Option<&str>, config: Option<&TicketConfig>) -> anyhow::Result<Self> {
        let url = database_url
            .map(str::to_string)
            .or_else(|| config.and_then(|c| c.database_url.clone()));

        let Some(url) = url else {
            anyhow::bail!(
                "{} is not set (pass --database or add database_url to {})",
                DATABASE_URL_ENV,
                default_config_path().display()
            );
        };

        Ok(Self {
            storage: StorageTarget::parse(&url)?,
            top_customers: config
                .and_then(|c| c.top_customers)
                .unwrap_or(DEFAULT_TOP_CUSTOMERS),
        })
    }
}

pub fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sqlite_urls() {
        assert_eq!(
            StorageTarget::parse("sqlite:///./tickets.db").unwrap(),
            StorageTarget::File(PathBuf::from("./tickets.db"))
        );
        assert_eq!(
            StorageTarget::parse("sqlite:////var/lib/tickets.db").unwrap(),
            StorageTarget::File(PathBuf::from("/var/lib/tickets.db"))
        );
        assert_eq!(StorageTarget::parse("sqlite://").unwrap(), StorageTarget::Memory);
        assert_eq!(StorageTarget::parse("sqlite:///:memory:").unwrap(), StorageTarget::Memory);
        assert_eq!(StorageTarget::parse(":memory:").unwrap(), StorageTarget::Memory);
        assert_eq!(
            StorageTarget::parse("data/tickets.db").unwrap(),
            StorageTarget::File(PathBuf::from("data/tickets.db"))
        );
    }

    #[test]
    fn test_reject_bad_urls() {
        assert!(matches!(StorageTarget::parse("postgres://db/tickets"), Err(Error::Config(_))));
        assert!(matches!(StorageTarget::parse("sqlite://host.db"), Err(Error::Config(_))));
        assert!(matches!(StorageTarget::parse("  "), Err(Error::Config(_))));
    }

    #[test]
    fn test_resolution_order() {
        let config = TicketConfig {
            database_url: Some("sqlite:///from_config.db".into()),
            top_customers: Some(3),
        };

        let from_flag = Settings::resolve(Some("sqlite:///from_env.db"), Some(&config)).unwrap();
        assert_eq!(from_flag.storage, StorageTarget::File(PathBuf::from("from_env.db")));
        assert_eq!(from_flag.top_customers, 3);

        let from_file = Settings::resolve(None, Some(&config)).unwrap();
        assert_eq!(from_file.storage, StorageTarget::File(PathBuf::from("from_config.db")));

        let defaults = Settings::resolve(Some(":memory:"), None).unwrap();
        assert_eq!(defaults.top_customers, DEFAULT_TOP_CUSTOMERS);

        assert!(Settings::resolve(None, None).is_err());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticketdb.toml");
        assert!(load_config(Some(&path)).unwrap().is_none());

        std::fs::write(&path, "database_url = \"sqlite:///t.db\"\ntop_customers = 10\n").unwrap();
        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.database_url.as_deref(), Some("sqlite:///t.db"));
        assert_eq!(config.top_customers, Some(10));
    }

    #[test]
    fn test_open_file_target_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("tickets.db");
        let store = StorageTarget::File(db.clone()).open().unwrap();
        assert!(!store.is_initialized().unwrap());
        store.close().unwrap();
        assert!(db.parent().unwrap().exists());
    }
}
