//! Iteration ledger: the bound history of an inference run
//!
//! Each round goes through a reserve, commit or roll back protocol. A
//! [`Reservation`] appends one unwritten (NaN) slot to the global series and
//! to every per-node series. Committing writes the slot and advances the
//! iteration counter. Dropping an uncommitted reservation truncates every
//! series back to the last completed round, so a failed round leaves no trace.
//!
//! Between rounds every series therefore has exactly `iteration` entries.

use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub struct IterationLedger {
    iteration: usize,
    lower_bounds: Vec<f64>,
    bound_terms: Vec<Vec<f64>>,
}

impl IterationLedger {
    /// Empty ledger for a model of `nodes` nodes
    pub fn new(nodes: usize) -> Self {
        Self {
            iteration: 0,
            lower_bounds: Vec::new(),
            bound_terms: vec![Vec::new(); nodes],
        }
    }

    /// Rebuild a ledger from restored series. Slots past `iteration` are
    /// stale reservations and are dropped.
    pub fn from_parts(
        iteration: usize,
        mut lower_bounds: Vec<f64>,
        mut bound_terms: Vec<Vec<f64>>,
    ) -> Self {
        lower_bounds.truncate(iteration);
        for series in &mut bound_terms {
            series.truncate(iteration);
        }
        Self {
            iteration,
            lower_bounds,
            bound_terms,
        }
    }

    /// Number of completed rounds
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Lower bound of every completed round
    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower_bounds[..self.iteration]
    }

    /// Bound contribution of one node in every completed round
    pub fn bound_terms(&self, id: NodeId) -> &[f64] {
        &self.bound_terms[id.index()][..self.iteration]
    }

    pub fn node_count(&self) -> usize {
        self.bound_terms.len()
    }

    /// Bound recorded by the last completed round
    pub fn last_bound(&self) -> Option<f64> {
        self.lower_bounds().last().copied()
    }

    /// Length of the series including reserved slots
    pub fn reserved_len(&self) -> usize {
        self.lower_bounds.len()
    }

    /// Reserve the slot for the next round
    pub fn reserve(&mut self) -> Reservation<'_> {
        debug_assert_eq!(self.lower_bounds.len(), self.iteration);
        self.lower_bounds.push(f64::NAN);
        for series in &mut self.bound_terms {
            series.push(f64::NAN);
        }
        Reservation {
            ledger: self,
            committed: false,
        }
    }

    fn rollback(&mut self) {
        self.lower_bounds.truncate(self.iteration);
        for series in &mut self.bound_terms {
            series.truncate(self.iteration);
        }
    }
}

/// An open round. Commit it or drop it to roll back.
#[derive(Debug)]
pub struct Reservation<'a> {
    ledger: &'a mut IterationLedger,
    committed: bool,
}

impl Reservation<'_> {
    /// Index of the slot being filled
    pub fn slot(&self) -> usize {
        self.ledger.iteration
    }

    /// Write the per-node terms and their total, then advance the counter.
    /// Returns the new iteration count.
    pub fn commit(mut self, terms: &[f64], total: f64) -> usize {
        debug_assert_eq!(terms.len(), self.ledger.bound_terms.len());
        let slot = self.slot();
        for (series, term) in self.ledger.bound_terms.iter_mut().zip(terms) {
            series[slot] = *term;
        }
        self.ledger.lower_bounds[slot] = total;
        self.ledger.iteration += 1;
        self.committed = true;
        self.ledger.iteration
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.ledger.rollback();
        }
    }
}
