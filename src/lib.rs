//! # vmp-engine
//!
//! The convergence-driving loop of a variational message passing engine.
//!
//! Models are built from [`Node`]s, opaque pieces of state that can update
//! themselves and report their term of the variational lower bound. An
//! [`InferenceLoop`] updates them round after round, tracks the lower bound
//! (globally and per node), warns when it decreases, signals convergence, and
//! checkpoints the whole run to disk.
//!
//! ## Modules
//!
//! - `checkpoint` - Checkpoint document, scoped sections and atomic file I/O
//! - `config` - Loop configuration and fixed numerical thresholds
//! - `error` - Error type shared by the whole crate
//! - `inference` - The inference loop itself
//! - `ledger` - Per-iteration bound history with reserve/commit rounds
//! - `logging` - Subscriber setup for applications
//! - `node` - Node capability contract and node keys
//! - `testing` - Scripted nodes and fixtures for tests
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod inference;
pub mod ledger;
pub mod logging;
pub mod node;
pub mod testing;


pub use config::InferenceConfig;
pub use error::{Error, Result};
pub use inference::{ConvergenceReport, InferenceLoop, RoundReport, UpdateReport};
pub use node::{Capabilities, Node, NodeId, NodeKey, NodeRef, Selection};
