use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{Node, NodeRef};

/// Stable position of a node within a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything that can be resolved to a node of a model
#[derive(Clone)]
pub enum NodeKey {
    Id(NodeId),
    Name(String),
    Ref(NodeRef),
}

impl NodeKey {
    /// Key a typed node handle by identity
    pub fn of<N: Node + 'static>(node: &Rc<RefCell<N>>) -> Self {
        Self::Ref(node.clone())
    }
}

impl fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Ref(node) => match node.try_borrow() {
                Ok(node) => f.debug_tuple("Ref").field(&node.name()).finish(),
                Err(_) => f.write_str("Ref(<borrowed>)"),
            },
        }
    }
}

impl From<NodeId> for NodeKey {
    fn from(id: NodeId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for NodeKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&NodeRef> for NodeKey {
    fn from(node: &NodeRef) -> Self {
        Self::Ref(node.clone())
    }
}

/// Which nodes an `update` or `load` call acts on
#[derive(Debug, Clone, Default)]
pub enum Selection {
    #[default]
    All,
    Subset(Vec<NodeKey>),
}

impl Selection {
    pub fn subset<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<NodeKey>,
    {
        Self::Subset(keys.into_iter().map(Into::into).collect())
    }

    /// An empty subset means the whole model
    pub fn is_all(&self) -> bool {
        match self {
            Self::All => true,
            Self::Subset(keys) => keys.is_empty(),
        }
    }
}
