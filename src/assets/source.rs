//! Byte sources for the pipeline
//!
//! All transfers go through the `FileSource` seam so the cache and progress
//! logic can be exercised without a host environment. The production source
//! reads through macroquad (filesystem natively, HTTP fetch on WASM).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;

use super::AssetError;

/// Where asset bytes come from
#[async_trait(?Send)]
pub trait FileSource {
    async fn read(&mut self, path: &str) -> Result<Vec<u8>, AssetError>;
}

/// The host-backed source used by the running application
#[derive(Debug, Default)]
pub struct HostSource;

#[async_trait(?Send)]
impl FileSource for HostSource {
    async fn read(&mut self, path: &str) -> Result<Vec<u8>, AssetError> {
        macroquad::file::load_file(path)
            .await
            .map_err(|e| AssetError::Io(format!("{}: {}", path, e)))
    }
}

/// In-memory source for tests and headless runs
///
/// Records every read so tests can assert that a cached key never causes a
/// second transfer.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
    reads: Rc<RefCell<Vec<String>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }

    /// Handle onto the read log; stays valid after the source is boxed
    pub fn reads(&self) -> Rc<RefCell<Vec<String>>> {
        self.reads.clone()
    }
}

#[async_trait(?Send)]
impl FileSource for MemorySource {
    async fn read(&mut self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.reads.borrow_mut().push(path.to_string());
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::Io(format!("{}: not found", path)))
    }
}
