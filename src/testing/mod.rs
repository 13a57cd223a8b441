//! Testing utilities and fixtures
//!
//! Scripted nodes and a temporary checkpoint directory, shared by unit tests,
//! integration tests and benches.

mod scripted;

pub use scripted::ScriptedNode;

use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test context owning a temporary directory for checkpoint files
pub struct TestContext {
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Path of a checkpoint file inside the temporary directory
    pub fn checkpoint_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}
