use super::StorageBackend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;
use uuid::Uuid;

/// Stores one file per key below a local directory
#[derive(Debug, Clone)]
pub struct DirBackend {
    root: PathBuf,
}

impl DirBackend {
    /// Open `root`, creating it (mode `0700`) when missing
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or `root` exists
    /// but is not a directory
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::Configuration(format!(
                    "'{}' exists and is not a directory",
                    root.display()
                )));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                create_dir(&root).await?;
                debug!(path = %root.display(), "created cache directory");
            }
            Err(err) => return Err(err.into()),
        }

        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a path that cannot leave the root directory
    ///
    /// The key is cleaned like an absolute path: empty and `.` segments are
    /// dropped and `..` never climbs above the root. `None` when nothing is
    /// left, such a key would name the root itself.
    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        let mut segments: Vec<&str> = Vec::new();
        for segment in key.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return None;
        }

        Some(
            segments
                .into_iter()
                .fold(self.root.clone(), |path, segment| path.join(segment)),
        )
    }
}

async fn create_dir(path: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(path).await
}

async fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

#[async_trait]
impl StorageBackend for DirBackend {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.entry_path(key).ok_or(Error::NotFound)?;
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self
            .entry_path(key)
            .ok_or_else(|| Error::Configuration(format!("Invalid cache key: '{key}'")))?;
        let parent = path.parent().unwrap_or(&self.root).to_path_buf();
        if parent != self.root {
            create_dir(&parent).await?;
        }

        // write a sibling first so readers never see a partial file
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = parent.join(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

        if let Err(err) = write_private(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err.into());
        }

        if let Err(err) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err.into());
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let Some(path) = self.entry_path(key) else {
            return Ok(());
        };
        match fs::remove_file(path).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "dir"
    }
}
