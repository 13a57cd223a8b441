//! The inference loop
//!
//! [`InferenceLoop`] drives a set of nodes through update rounds and keeps
//! the lower bound history that tells whether inference has converged.
//!
//! ```no_run
//! use vmp_engine::node::{node_ref, shared};
//! use vmp_engine::testing::ScriptedNode;
//! use vmp_engine::{InferenceConfig, InferenceLoop, Selection};
//!
//! # fn example() -> vmp_engine::Result<()> {
//! let mu = shared(ScriptedNode::new("mu", vec![-4.0, -3.5, -3.4]));
//! let tau = shared(ScriptedNode::new("tau", vec![-2.0, -1.9, -1.9]));
//!
//! let config = InferenceConfig::default()
//!     .with_autosave_iterations(10)
//!     .with_autosave_path("run.json");
//! let mut vb = InferenceLoop::from_config(vec![node_ref(&mu), node_ref(&tau)], config)?;
//!
//! vb.update_all(3)?;
//! vb.update(Selection::subset(["tau"]), 1)?;
//! vb.save(None)?;
//! # Ok(())
//! # }
//! ```

mod engine;
mod model;
mod persist;
mod report;

pub use engine::{InferenceLoop, NodeHistory};
pub use report::{ConvergenceReport, RoundReport, UpdateReport};
