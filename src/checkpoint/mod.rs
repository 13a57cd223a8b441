//! Checkpoint storage for inference runs
//!
//! A checkpoint is a JSON document with four parts:
//! - `nodes`: one [`Section`] per node, written by the node itself
//! - `L`: the global lower bound series
//! - `iter`: the number of completed iterations
//! - `boundterms`: one bound contribution series per node, keyed by name
//!
//! Files are replaced atomically, so a failed save never leaves a truncated
//! checkpoint behind.

mod file;
mod section;

pub use file::{
    autosave_path, read_checkpoint, write_checkpoint, BoundSeries, CheckpointFile,
    CHECKPOINT_VERSION,
};
pub use section::Section;
