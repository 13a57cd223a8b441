//! Checkpoint save and restore for [`InferenceLoop`]

use anyhow::anyhow;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::engine::InferenceLoop;
use crate::checkpoint::{read_checkpoint, write_checkpoint, BoundSeries, CheckpointFile};
use crate::error::{Error, NodeOperation, Result};
use crate::ledger::IterationLedger;
use crate::node::Selection;

impl InferenceLoop {
    /// Save the full inference state
    ///
    /// Without a path the explicit autosave file given at construction is
    /// used. Returns the path written.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = self.resolve_path(path)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Restore node state and the iteration ledger from a checkpoint
    ///
    /// Only the selected nodes have their own state restored, but the ledger
    /// (bound history of every node, global bounds, iteration count) is
    /// always replaced as a whole. The file is read and checked completely
    /// before anything is modified. Returns the path read.
    pub fn load(&mut self, selection: Selection, path: Option<&Path>) -> Result<PathBuf> {
        let path = self.resolve_path(path)?;
        let targets = self.model.resolve_selection(&selection)?;
        self.model.require_names("load")?;

        let checkpoint = read_checkpoint(&path)?;

        for &id in &targets {
            let entry = self.model.entry(id);
            if entry.capabilities.load && !checkpoint.nodes.contains_key(&entry.name) {
                return Err(Error::StateNotFound {
                    node: entry.name.clone(),
                    path,
                });
            }
        }

        let mut bound_terms = Vec::with_capacity(self.model.len());
        for (_, entry) in self.model.entries() {
            let series = checkpoint.bound_terms.get(&entry.name).ok_or_else(|| {
                Error::StateNotFound {
                    node: entry.name.clone(),
                    path: path.clone(),
                }
            })?;
            bound_terms.push(series.0.clone());
        }

        for &id in &targets {
            let entry = self.model.entry(id);
            if !entry.capabilities.load {
                continue;
            }
            let section = &checkpoint.nodes[&entry.name];
            let mut node = entry.node.try_borrow_mut().map_err(|_| {
                Error::node(&entry.name, NodeOperation::Load, anyhow!("node is already borrowed"))
            })?;
            node.load(section)
                .map_err(|e| Error::node(&entry.name, NodeOperation::Load, e))?;
            debug!("Restored node {} from {}", entry.name, path.display());
        }

        self.ledger = IterationLedger::from_parts(
            checkpoint.iteration,
            checkpoint.lower_bounds.0,
            bound_terms,
        );

        info!(
            "Loaded checkpoint at iteration {} from {}",
            self.ledger.iteration(),
            path.display()
        );
        Ok(path)
    }

    fn resolve_path(&self, path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.to_path_buf()),
            _ => self
                .default_path
                .clone()
                .ok_or_else(|| Error::configuration("Filename must be given")),
        }
    }

    pub(super) fn save_to(&self, path: &Path) -> Result<()> {
        self.model.require_names("save")?;

        let mut checkpoint =
            CheckpointFile::new(self.ledger.iteration(), self.ledger.lower_bounds().to_vec());

        for (id, entry) in self.model.entries() {
            if entry.capabilities.save {
                let node = entry.node.try_borrow().map_err(|_| {
                    Error::node(&entry.name, NodeOperation::Save, anyhow!("node is mutably borrowed"))
                })?;
                let section = checkpoint.nodes.entry(entry.name.clone()).or_default();
                node.save(section)
                    .map_err(|e| Error::node(&entry.name, NodeOperation::Save, e))?;
            }
            checkpoint.bound_terms.insert(
                entry.name.clone(),
                BoundSeries(self.ledger.bound_terms(id).to_vec()),
            );
        }

        write_checkpoint(path, &checkpoint)
    }
}
