use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed name the credential token is stored under
pub const TOKEN_KEY: &str = "google_token";

/// Keychain service name
const SERVICE_NAME: &str = "schedulo";

/// Credential file name in cache directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Persistent storage for one opaque token string.
pub trait CredentialStore: Send {
    fn save(&self, token: &str) -> Result<()>;

    /// Returns `None` when no token has been stored.
    fn load(&self) -> Result<Option<String>>;

    /// Removing an absent token is not an error.
    fn clear(&self) -> Result<()>;
}

/// Which `CredentialStore` implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
}

impl CredentialBackend {
    pub fn open(self, cache_dir: &Path) -> Box<dyn CredentialStore> {
        match self {
            CredentialBackend::File => Box::new(FileCredentialStore::new(cache_dir.to_path_buf())),
            CredentialBackend::Keyring => Box::new(KeyringCredentialStore),
        }
    }
}

/// Stores the token in `credentials.json` under the cache directory.
pub struct FileCredentialStore {
    cache_dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn credentials_path(&self) -> PathBuf {
        self.cache_dir.join(CREDENTIALS_FILE)
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, token: &str) -> Result<()> {
        let path = self.credentials_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut entries = Map::new();
        entries.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        let contents = serde_json::to_string_pretty(&entries)?;
        std::fs::write(path, contents).context("Failed to write credentials file")?;
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        let path = self.credentials_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .context("Failed to read credentials file")?;
        let entries: Map<String, Value> = serde_json::from_str(&contents)
            .context("Failed to parse credentials file")?;

        Ok(entries
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn clear(&self) -> Result<()> {
        let path = self.credentials_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove credentials file")?;
        }
        Ok(())
    }
}

/// Stores the token in the OS keychain.
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save(&self, token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
