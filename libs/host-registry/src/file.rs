//! config file backed [`Storage`]
use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tracing::trace;

use crate::Storage;

/// Reads & overwrites the whole dnsmasq config on every call
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Storage for FileStore {
    async fn load(&self) -> io::Result<String> {
        trace!(path = %self.path.display(), "reading config");
        tokio::fs::read_to_string(&self.path).await
    }

    async fn store(&self, contents: &str) -> io::Result<()> {
        trace!(path = %self.path.display(), len = contents.len(), "overwriting config");
        tokio::fs::write(&self.path, contents).await
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
