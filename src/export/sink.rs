//! Where a finished archive goes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::zip::ArchiveBlob;

/// Receives the finished archive under its file name.
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    async fn save(&self, blob: &ArchiveBlob, file_name: &str) -> Result<()>;
}

/// Writes the archive into a directory, creating it if needed.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArchiveSink for DirectorySink {
    async fn save(&self, blob: &ArchiveBlob, file_name: &str) -> Result<()> {
        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir)
                .await
                .with_context(|| format!("cannot create {}", self.dir.display()))?;
        }

        let path = self.path_for(file_name);
        let mut file = fs::File::create(&path)
            .await
            .with_context(|| format!("cannot create {}", path.display()))?;
        write_archive(&mut file, blob)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;

        tracing::info!(path = %path.display(), bytes = blob.len(), "archive saved");
        Ok(())
    }
}

/// Writes the raw archive to stdout.
pub struct StdoutSink;

#[async_trait]
impl ArchiveSink for StdoutSink {
    async fn save(&self, blob: &ArchiveBlob, _file_name: &str) -> Result<()> {
        write_archive(&mut tokio::io::stdout(), blob).await
    }
}

/// Write the whole archive to `writer` and flush it.
pub async fn write_archive<W: AsyncWrite + Unpin>(writer: &mut W, blob: &ArchiveBlob) -> Result<()> {
    writer.write_all(blob.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
