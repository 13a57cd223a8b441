//! On-disk checkpoint document and atomic persistence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use super::section::Section;
use crate::config::{AUTOSAVE_EXTENSION, AUTOSAVE_PREFIX};
use crate::error::{Error, Result};

/// Version for checkpoint format compatibility
pub const CHECKPOINT_VERSION: u32 = 1;

/// A series of bound values. Non-finite entries are stored as `null`, which
/// is how unwritten slots survive a round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundSeries(pub Vec<f64>);

impl Serialize for BoundSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.0
                .iter()
                .map(|v| if v.is_finite() { Some(*v) } else { None }),
        )
    }
}

impl<'de> Deserialize<'de> for BoundSeries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
        ))
    }
}

/// Full snapshot of an inference run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointFile {
    /// Checkpoint format version
    pub version: u32,
    pub created_at: DateTime<Utc>,
    /// Node state, one section per node name
    pub nodes: BTreeMap<String, Section>,
    /// Global lower bound series
    #[serde(rename = "L")]
    pub lower_bounds: BoundSeries,
    /// Completed iterations
    #[serde(rename = "iter")]
    pub iteration: usize,
    /// Per-node bound contribution series keyed by node name
    #[serde(rename = "boundterms")]
    pub bound_terms: BTreeMap<String, BoundSeries>,
}

impl CheckpointFile {
    pub fn new(iteration: usize, lower_bounds: Vec<f64>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            created_at: Utc::now(),
            nodes: BTreeMap::new(),
            lower_bounds: BoundSeries(lower_bounds),
            iteration,
            bound_terms: BTreeMap::new(),
        }
    }

    /// Check that the ledger part of the document is self-consistent
    pub fn validate(&self, path: &Path) -> Result<()> {
        if self.version > CHECKPOINT_VERSION {
            return Err(Error::invalid_checkpoint(
                path,
                format!(
                    "version {} is newer than supported version {}",
                    self.version, CHECKPOINT_VERSION
                ),
            ));
        }

        let len = self.lower_bounds.0.len();
        if self.iteration > len {
            return Err(Error::invalid_checkpoint(
                path,
                format!("iteration {} exceeds bound history of length {len}", self.iteration),
            ));
        }

        for (name, series) in &self.bound_terms {
            if series.0.len() != len {
                return Err(Error::invalid_checkpoint(
                    path,
                    format!(
                        "bound terms of {name} have length {} but L has length {len}",
                        series.0.len()
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// Write a checkpoint atomically: the document goes to a temporary file in
/// the target directory which then replaces the target.
pub fn write_checkpoint(path: &Path, checkpoint: &CheckpointFile) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| Error::io("create temporary checkpoint in", dir, e))?;

    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, checkpoint)?;
        writer
            .flush()
            .map_err(|e| Error::io("write checkpoint", temp.path(), e))?;
    }

    temp.persist(path)
        .map_err(|e| Error::io("move checkpoint to", path, e.error))?;

    debug!(
        "Wrote checkpoint at iteration {} to {}",
        checkpoint.iteration,
        path.display()
    );
    Ok(())
}

/// Read and validate a checkpoint without touching any inference state
pub fn read_checkpoint(path: &Path) -> Result<CheckpointFile> {
    let file = File::open(path).map_err(|e| Error::io("open checkpoint", path, e))?;
    let checkpoint: CheckpointFile = serde_json::from_reader(BufReader::new(file))?;
    checkpoint.validate(path)?;

    debug!(
        "Read checkpoint at iteration {} from {}",
        checkpoint.iteration,
        path.display()
    );
    Ok(checkpoint)
}

/// Synthesize a fresh autosave path in the system temporary directory
pub fn autosave_path() -> PathBuf {
    let date = chrono::Local::now().format("%Y%m%d%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    std::env::temp_dir().join(format!(
        "{AUTOSAVE_PREFIX}{date}_{}.{AUTOSAVE_EXTENSION}",
        &suffix[..8]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> CheckpointFile {
        let mut checkpoint = CheckpointFile::new(2, vec![-10.5, -3.25]);
        checkpoint
            .nodes
            .entry("mu".to_string())
            .or_default()
            .set("mean", &0.75)
            .unwrap();
        checkpoint
            .bound_terms
            .insert("mu".to_string(), BoundSeries(vec![-4.0, -1.0]));
        checkpoint
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("run.json");

        write_checkpoint(&path, &sample()).unwrap();
        let loaded = read_checkpoint(&path).unwrap();

        assert_eq!(loaded.iteration, 2);
        assert_eq!(loaded.lower_bounds, BoundSeries(vec![-10.5, -3.25]));
        assert_eq!(loaded.bound_terms["mu"], BoundSeries(vec![-4.0, -1.0]));
        assert_eq!(loaded.nodes["mu"].get::<f64>("mean").unwrap(), 0.75);
    }

    #[test]
    fn test_top_level_layout() {
        let json = serde_json::to_value(sample()).unwrap();
        let object = json.as_object().unwrap();
        for key in ["nodes", "L", "iter", "boundterms", "version"] {
            assert!(object.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_nan_slots_become_null() {
        let series = BoundSeries(vec![1.0, f64::NAN]);
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(json, "[1.0,null]");

        let restored: BoundSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.0[0], 1.0);
        assert!(restored.0[1].is_nan());
    }

    #[test]
    fn test_overwrite_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("run.json");

        write_checkpoint(&path, &sample()).unwrap();
        write_checkpoint(&path, &CheckpointFile::new(0, Vec::new())).unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(read_checkpoint(&path).unwrap().iteration, 0);
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_checkpoint(&temp_dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_validate_rejects_misaligned_terms() {
        let mut checkpoint = sample();
        checkpoint
            .bound_terms
            .insert("tau".to_string(), BoundSeries(vec![1.0]));
        let err = checkpoint.validate(Path::new("run.json")).unwrap_err();
        assert!(matches!(err, Error::InvalidCheckpoint { .. }));
    }

    #[test]
    fn test_validate_rejects_iteration_past_history() {
        let checkpoint = CheckpointFile::new(3, vec![1.0]);
        assert!(checkpoint.validate(Path::new("run.json")).is_err());
    }

    #[test]
    fn test_validate_rejects_future_version() {
        let mut checkpoint = sample();
        checkpoint.version = CHECKPOINT_VERSION + 1;
        assert!(checkpoint.validate(Path::new("run.json")).is_err());
    }

    #[test]
    fn test_autosave_path_shape() {
        let path = autosave_path();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(AUTOSAVE_PREFIX));
        assert!(name.ends_with(".json"));
        assert_ne!(autosave_path(), path);
    }
}
