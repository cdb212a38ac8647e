//! in-memory [`Storage`], handy for tests and dry runs
use std::{
    io,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::Storage;

#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: Mutex<String>,
    read_only: bool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new<S: Into<String>>(contents: S) -> Self {
        Self {
            contents: Mutex::new(contents.into()),
            ..Default::default()
        }
    }

    /// every `store` fails with `PermissionDenied`
    pub fn read_only<S: Into<String>>(contents: S) -> Self {
        Self {
            read_only: true,
            ..Self::new(contents)
        }
    }

    pub fn contents(&self) -> String {
        self.contents.lock().clone()
    }

    /// # of successful `store` calls
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn load(&self) -> io::Result<String> {
        Ok(self.contents.lock().clone())
    }

    async fn store(&self, contents: &str) -> io::Result<()> {
        if self.read_only {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "memory store is read only",
            ));
        }
        *self.contents.lock() = contents.to_owned();
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_owned()
    }
}
