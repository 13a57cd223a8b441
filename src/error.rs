use std::path::PathBuf;
use thiserror::Error;

/// Node capability that was being exercised when a node failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOperation {
    Update,
    LowerBound,
    Save,
    Load,
}

impl std::fmt::Display for NodeOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Update => "update",
            Self::LowerBound => "lower bound contribution",
            Self::Save => "save",
            Self::Load => "load",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File {} does not contain state for node {node}", path.display())]
    StateNotFound { node: String, path: PathBuf },

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("Node {node} failed during {operation}: {source}")]
    Node {
        node: String,
        operation: NodeOperation,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid checkpoint {}: {reason}", path.display())]
    InvalidCheckpoint { path: PathBuf, reason: String },

    #[error("Failed to {operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a configuration error
    pub fn configuration<E: std::fmt::Display>(msg: E) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// Create a lookup error
    pub fn lookup<E: std::fmt::Display>(msg: E) -> Self {
        Self::Lookup(msg.to_string())
    }

    /// Wrap a failure raised by a node capability
    pub fn node(node: impl Into<String>, operation: NodeOperation, source: anyhow::Error) -> Self {
        Self::Node {
            node: node.into(),
            operation,
            source,
        }
    }

    /// Create an I/O error carrying the path it happened on
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn invalid_checkpoint(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidCheckpoint {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_state_not_found(&self) -> bool {
        matches!(self, Self::StateNotFound { .. })
    }

    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
