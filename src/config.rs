//! Configuration file handling for the receipts CLI.
//!
//! The configuration file is stored at `$RECEIPTS_HOME/config.json` and contains settings for
//! the receipts application, such as the default recipient for submitted expense reports.

use crate::store::Store;
use crate::{utils, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "receipts";
const CONFIG_VERSION: u8 = 1;
const STAGING: &str = ".staging";
const CONFIG_JSON: &str = "config.json";
const RECEIPTS_SQLITE: &str = "receipts.sqlite";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$RECEIPTS_HOME` and from there it loads `$RECEIPTS_HOME/config.json`. It provides
/// paths to other items that are expected in a certain location within the receipts home
/// directory, and it holds the open handle to the key-value store.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    staging: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    store: Store,
    sqlite_path: PathBuf,
}

impl Config {
    /// This will
    /// - create the `receipts_home` directory and the staging subdirectory if they do not exist
    /// - load `config.json`, writing one with default settings first when it is missing
    /// - open the SQLite key-value store, creating and migrating it if needed
    /// - return the loaded configuration object
    ///
    /// There is no separate init step; the first use of any command prepares the directory.
    pub async fn load(receipts_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = receipts_home.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the receipts home directory")?;

        // Canonicalize the directory path
        let root = utils::canonicalize(&maybe_relative).await?;

        let staging = root.join(STAGING);
        utils::make_dir(&staging).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = if config_path.is_file() {
            ConfigFile::load(&config_path).await?
        } else {
            let config_file = ConfigFile::default();
            config_file.save(&config_path).await?;
            config_file
        };

        let sqlite_path = root.join(RECEIPTS_SQLITE);
        let store = Store::open(&sqlite_path)
            .await
            .context("Unable to open the receipts database")?;

        Ok(Self {
            root,
            staging,
            config_path,
            config_file,
            store,
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The directory where temporary files are placed during report submission.
    pub fn staging(&self) -> &Path {
        &self.staging
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    /// The recipient used by `submit` when `--to` is not given.
    pub fn default_recipient(&self) -> Option<&str> {
        self.config_file.default_recipient.as_deref()
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "receipts",
///   "config_version": 1,
///   "default_recipient": "expenses@example.com"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "receipts"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Email address used by `submit` when `--to` is not given (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    default_recipient: Option<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            default_recipient: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        // Validate app_name
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    #[cfg(test)]
    /// Creates a new ConfigFile with the specified settings.
    pub fn new(default_recipient: Option<String>) -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            default_recipient,
        }
    }
}
