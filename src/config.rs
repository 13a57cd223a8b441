//! Inference loop configuration
//!
//! Settings are fixed when an [`InferenceLoop`](crate::InferenceLoop) is built.
//! They can be assembled in code with the `with_*` builders or read from TOML:
//!
//! ```toml
//! tolerance = 1e-6
//! autosave_iterations = 10
//! autosave_path = "run.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Bound decreases larger than this are reported as regressions
pub const REGRESSION_THRESHOLD: f64 = 1e-6;

/// Bound increases smaller than this are reported as convergence
pub const CONVERGENCE_THRESHOLD: f64 = 1e-12;

/// Prefix of synthesized autosave file names
pub const AUTOSAVE_PREFIX: &str = "vb_autosave_";

/// Extension of synthesized autosave file names
pub const AUTOSAVE_EXTENSION: &str = "json";

/// Configuration for an inference loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Stopping tolerance used by [`InferenceLoop::converge`](crate::InferenceLoop::converge).
    /// `update` itself never consults it.
    pub tolerance: f64,
    /// Autosave every N completed iterations, 0 disables autosaving.
    /// The snapshot taken at iteration k already holds round k.
    pub autosave_iterations: usize,
    /// Explicit autosave file. When set it is also the default target of
    /// `save`/`load` called without a path.
    pub autosave_path: Option<PathBuf>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            autosave_iterations: 0,
            autosave_path: None,
        }
    }
}

impl InferenceConfig {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_autosave_iterations(mut self, iterations: usize) -> Self {
        self.autosave_iterations = iterations;
        self
    }

    pub fn with_autosave_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.autosave_path = Some(path.into());
        self
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::io("read config", path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::configuration(format!(
                "tolerance must be a finite non-negative number, got {}",
                self.tolerance
            )));
        }
        if let Some(path) = &self.autosave_path {
            if path.as_os_str().is_empty() {
                return Err(Error::configuration("autosave path must not be empty"));
            }
        }
        Ok(())
    }
}
