use async_trait::async_trait;
use hourbook_core::{KeyValueStore, StoreError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::StoreConfig;

const VALUE_EXTENSION: &str = "value";

/// [`KeyValueStore`] keeping each key in `<dir>/<key>.value`.
///
/// Writes go to a temporary file that is renamed over the old value, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &StoreConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.resolve_data_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid storage key: {key:?}"),
            )));
        }
        Ok(self.dir.join(format!("{key}.{VALUE_EXTENSION}")))
    }
}

async fn secure_write(path: &Path, content: &str) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(content.as_bytes()).await?;
    file.sync_all().await?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FsStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.value_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.value_path(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = path.with_extension(format!("{VALUE_EXTENSION}.tmp"));
        secure_write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0usize;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().is_some_and(|ext| ext == VALUE_EXTENSION) {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        tracing::debug!(dir = %self.dir.display(), removed, "cleared stored values");
        Ok(())
    }
}
