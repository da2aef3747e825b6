use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use album_gallery::WritePolicy;
use album_ledger::{LedgerConfig, DEFAULT_LEDGER_KEY};
use album_store::{validate_key, UploadMode};
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// File name of the album configuration inside a store root.
pub const CONFIG_FILE_NAME: &str = "album.toml";

/// Session configuration. Every field is optional in the TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlbumConfig {
    /// Key of the ledger document in the blob store.
    pub ledger_key: String,
    /// Key prefix for uploaded image blobs.
    pub image_prefix: String,
    /// Store identical image bytes once. Re-ingesting them is then reported
    /// as a duplicate instead of adding a second photo.
    pub dedup_uploads: bool,
    pub write_policy: WritePolicy,
    /// Send the cache invalidation signal on every ledger save.
    pub invalidate_cache: bool,
    /// Directory of the filesystem blob store, used by the CLI.
    pub store_root: PathBuf,
}

impl Default for AlbumConfig {
    fn default() -> Self {
        Self {
            ledger_key: DEFAULT_LEDGER_KEY.to_string(),
            image_prefix: "photos".to_string(),
            dedup_uploads: false,
            write_policy: WritePolicy::LastWriterWins,
            invalidate_cache: true,
            store_root: PathBuf::from(".album"),
        }
    }
}

impl AlbumConfig {
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path`, falling back to defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> SdkResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Check that the ledger key and image prefix are usable store keys.
    pub fn validate(&self) -> SdkResult<()> {
        validate_key(&self.ledger_key)
            .map_err(|e| SdkError::Config(format!("ledger_key: {e}")))?;
        validate_key(&self.image_prefix)
            .map_err(|e| SdkError::Config(format!("image_prefix: {e}")))?;
        if self.ledger_key.starts_with(&format!("{}/", self.image_prefix)) {
            return Err(SdkError::Config(format!(
                "ledger_key {} must not live under image_prefix {}",
                self.ledger_key, self.image_prefix
            )));
        }
        Ok(())
    }

    pub fn upload_mode(&self) -> UploadMode {
        if self.dedup_uploads {
            UploadMode::Deduplicate
        } else {
            UploadMode::Unique
        }
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            key: self.ledger_key.clone(),
            invalidate_cache: self.invalidate_cache,
        }
    }
}
