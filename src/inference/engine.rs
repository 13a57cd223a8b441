use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::model::Model;
use super::report::{ConvergenceReport, RoundReport, UpdateReport};
use crate::checkpoint;
use crate::config::{InferenceConfig, CONVERGENCE_THRESHOLD, REGRESSION_THRESHOLD};
use crate::error::Result;
use crate::ledger::IterationLedger;
use crate::node::{NodeId, NodeKey, NodeRef, Selection};

/// Bound history of one node, as returned by
/// [`InferenceLoop::iteration_by_nodes`]
#[derive(Debug, Clone, Copy)]
pub struct NodeHistory<'a> {
    pub id: NodeId,
    pub name: &'a str,
    pub bound_terms: &'a [f64],
}

/// Variational message passing driver
///
/// Owns the model, the iteration ledger and the checkpoint settings. Each
/// round updates the selected nodes, sums the bound contributions of the
/// whole model, records them, checks for regressions and convergence, and
/// autosaves when due.
pub struct InferenceLoop {
    pub(super) model: Model,
    pub(super) ledger: IterationLedger,
    pub(super) config: InferenceConfig,
    pub(super) autosave_path: PathBuf,
    /// Target of `save`/`load` without an explicit path. Only set when the
    /// autosave file was given explicitly.
    pub(super) default_path: Option<PathBuf>,
}

impl InferenceLoop {
    /// Build a loop over `nodes` with default settings
    pub fn new<I: IntoIterator<Item = NodeRef>>(nodes: I) -> Result<Self> {
        Self::from_config(nodes, InferenceConfig::default())
    }

    pub fn from_config<I: IntoIterator<Item = NodeRef>>(
        nodes: I,
        config: InferenceConfig,
    ) -> Result<Self> {
        config.validate()?;
        let model = Model::new(nodes)?;

        let (autosave_path, default_path) = match &config.autosave_path {
            Some(path) => (path.clone(), Some(path.clone())),
            None => (checkpoint::autosave_path(), None),
        };

        debug!(
            "Created inference loop over {} nodes, autosave every {} iterations to {}",
            model.len(),
            config.autosave_iterations,
            autosave_path.display()
        );

        Ok(Self {
            ledger: IterationLedger::new(model.len()),
            model,
            config,
            autosave_path,
            default_path,
        })
    }

    /// Run `repeat` rounds over the selected nodes
    ///
    /// The selection is resolved before anything runs, so an unknown node
    /// leaves the loop untouched. A node failure aborts the current round and
    /// rolls the ledger back to the last completed round.
    pub fn update(&mut self, selection: Selection, repeat: usize) -> Result<UpdateReport> {
        let targets = self.model.resolve_selection(&selection)?;
        let mut report = UpdateReport::default();
        for _ in 0..repeat {
            report.rounds.push(self.run_round(&targets)?);
        }
        Ok(report)
    }

    /// Run `repeat` rounds over every node
    pub fn update_all(&mut self, repeat: usize) -> Result<UpdateReport> {
        self.update(Selection::All, repeat)
    }

    fn run_round(&mut self, targets: &[NodeId]) -> Result<RoundReport> {
        let started = Instant::now();
        let previous = self.ledger.last_bound();

        let reservation = self.ledger.reserve();
        for &id in targets {
            self.model.update(id)?;
        }
        let terms = self.model.contributions()?;
        let lower_bound: f64 = terms.iter().sum();
        let iteration = reservation.commit(&terms, lower_bound);

        let elapsed = started.elapsed();
        info!(
            "Iteration {}: loglike={:e} ({:.3} seconds)",
            iteration,
            lower_bound,
            elapsed.as_secs_f64()
        );

        let delta = previous.map(|previous| lower_bound - previous);
        let mut regression = None;
        let mut converged = false;
        if let Some(delta) = delta {
            if -delta > REGRESSION_THRESHOLD {
                warn!(
                    "Lower bound decreased {:e}! Bug somewhere or numerical inaccuracy?",
                    -delta
                );
                regression = Some(-delta);
            }
            if delta < CONVERGENCE_THRESHOLD {
                info!("Converged.");
                converged = true;
            }
        }

        let autosaved = if self.autosave_due(iteration) {
            let path = self.autosave_path.clone();
            self.save_to(&path)?;
            info!("Auto-saved to {}", path.display());
            Some(path)
        } else {
            None
        };

        Ok(RoundReport {
            iteration,
            lower_bound,
            delta,
            elapsed,
            regression,
            converged,
            autosaved,
        })
    }

    fn autosave_due(&self, iteration: usize) -> bool {
        let every = self.config.autosave_iterations;
        every > 0 && iteration % every == 0
    }

    /// Keep updating every node until the bound changes by less than the
    /// configured tolerance or `max_rounds` rounds have run
    pub fn converge(&mut self, max_rounds: usize) -> Result<ConvergenceReport> {
        let targets: Vec<NodeId> = self.model.ids().collect();
        let mut report = ConvergenceReport::default();

        while report.rounds < max_rounds {
            let round = self.run_round(&targets)?;
            report.rounds += 1;
            report.lower_bound = Some(round.lower_bound);
            if round
                .delta
                .is_some_and(|delta| delta.abs() < self.config.tolerance)
            {
                report.converged = true;
                break;
            }
        }

        debug!(
            "Stopped after {} rounds, converged: {}",
            report.rounds, report.converged
        );
        Ok(report)
    }

    /// Sum of the current bound contributions of all nodes. Nothing is
    /// recorded.
    pub fn lower_bound(&self) -> Result<f64> {
        Ok(self.model.contributions()?.iter().sum())
    }

    /// Number of completed rounds
    pub fn iteration(&self) -> usize {
        self.ledger.iteration()
    }

    /// Lower bound of every completed round
    pub fn lower_bounds(&self) -> &[f64] {
        self.ledger.lower_bounds()
    }

    /// Bound contributions of one node in every completed round
    pub fn bound_terms(&self, key: impl Into<NodeKey>) -> Result<&[f64]> {
        let id = self.model.resolve(&key.into())?;
        Ok(self.ledger.bound_terms(id))
    }

    /// Per-node bound series for every node, in model order
    pub fn iteration_by_nodes(&self) -> Vec<NodeHistory<'_>> {
        self.model
            .entries()
            .map(|(id, entry)| NodeHistory {
                id,
                name: &entry.name,
                bound_terms: self.ledger.bound_terms(id),
            })
            .collect()
    }

    pub fn ledger(&self) -> &IterationLedger {
        &self.ledger
    }

    /// Resolve a node id, name or handle against the model
    pub fn resolve(&self, key: impl Into<NodeKey>) -> Result<NodeId> {
        self.model.resolve(&key.into())
    }

    /// Node handle for a node id, name or handle
    pub fn get(&self, key: impl Into<NodeKey>) -> Result<&NodeRef> {
        let id = self.resolve(key)?;
        Ok(&self.model.entry(id).node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeRef)> {
        self.model.entries().map(|(id, entry)| (id, &entry.node))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.model.entries().map(|(_, entry)| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.model.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model.len() == 0
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn autosave_path(&self) -> &Path {
        &self.autosave_path
    }

    pub fn default_path(&self) -> Option<&Path> {
        self.default_path.as_deref()
    }
}

impl std::fmt::Debug for InferenceLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceLoop")
            .field("nodes", &self.names().collect::<Vec<_>>())
            .field("iteration", &self.iteration())
            .field("config", &self.config)
            .field("autosave_path", &self.autosave_path)
            .finish()
    }
}
