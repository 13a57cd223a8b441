use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of one update round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundReport {
    /// 1-based iteration this round completed
    pub iteration: usize,
    pub lower_bound: f64,
    /// Change from the previous round, absent on the first round ever run
    pub delta: Option<f64>,
    pub elapsed: Duration,
    /// Size of the decrease when the bound went down beyond numerical noise
    pub regression: Option<f64>,
    pub converged: bool,
    /// Checkpoint written by autosave after this round
    pub autosaved: Option<PathBuf>,
}

/// Outcome of an `update` call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateReport {
    pub rounds: Vec<RoundReport>,
}

impl UpdateReport {
    pub fn last(&self) -> Option<&RoundReport> {
        self.rounds.last()
    }

    /// Whether the final round signalled convergence
    pub fn converged(&self) -> bool {
        self.last().is_some_and(|round| round.converged)
    }

    pub fn regressions(&self) -> impl Iterator<Item = &RoundReport> {
        self.rounds.iter().filter(|round| round.regression.is_some())
    }

    pub fn autosaves(&self) -> impl Iterator<Item = (usize, &Path)> {
        self.rounds
            .iter()
            .filter_map(|round| round.autosaved.as_deref().map(|path| (round.iteration, path)))
    }
}

/// Outcome of [`InferenceLoop::converge`](crate::InferenceLoop::converge)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConvergenceReport {
    pub rounds: usize,
    pub converged: bool,
    pub lower_bound: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(iteration: usize, regression: Option<f64>, converged: bool) -> RoundReport {
        RoundReport {
            iteration,
            lower_bound: 0.0,
            delta: None,
            elapsed: Duration::ZERO,
            regression,
            converged,
            autosaved: (iteration % 2 == 0).then(|| PathBuf::from(format!("{iteration}.json"))),
        }
    }

    #[test]
    fn test_summaries() {
        let report = UpdateReport {
            rounds: vec![round(1, None, false), round(2, Some(0.5), true)],
        };
        assert!(report.converged());
        assert_eq!(report.regressions().count(), 1);
        let autosaves: Vec<_> = report.autosaves().collect();
        assert_eq!(autosaves, vec![(2, Path::new("2.json"))]);
    }

    #[test]
    fn test_empty_report() {
        let report = UpdateReport::default();
        assert!(!report.converged());
        assert!(report.last().is_none());
    }
}
