//! Node capability contract
//!
//! A node is an opaque piece of model state. The inference loop only ever
//! asks it to update itself, report its lower bound contribution, and
//! optionally save or restore its state. Which of the optional operations a
//! node supports is declared once through [`Capabilities`] and read when the
//! loop is constructed.

mod key;

pub use key::{NodeId, NodeKey, Selection};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::checkpoint::Section;

/// Optional operations a node supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub update: bool,
    pub save: bool,
    pub load: bool,
}

impl Capabilities {
    pub const ALL: Self = Self {
        update: true,
        save: true,
        load: true,
    };

    pub const NONE: Self = Self {
        update: false,
        save: false,
        load: false,
    };

    /// Observed or fixed nodes: persisted, never updated
    pub const OBSERVED: Self = Self {
        update: false,
        save: true,
        load: true,
    };

    pub fn persistable(&self) -> bool {
        self.save || self.load
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ALL
    }
}

/// A unit of model state driven by the inference loop
///
/// Only `name` and `lower_bound_contribution` are required. The other
/// operations are called only when the matching [`Capabilities`] flag is set.
pub trait Node {
    /// Unique name within a model, required for checkpointing
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn update(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// This node's term of the variational lower bound
    fn lower_bound_contribution(&self) -> anyhow::Result<f64>;

    fn save(&self, _section: &mut Section) -> anyhow::Result<()> {
        Ok(())
    }

    fn load(&mut self, _section: &Section) -> anyhow::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for dyn Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Node").field(&self.name()).finish()
    }
}

/// Shared handle to a node. The caller keeps its own handle to inspect node
/// state while the loop drives it.
pub type NodeRef = Rc<RefCell<dyn Node>>;

/// Wrap a node so it can be shared with an inference loop
pub fn shared<N: Node + 'static>(node: N) -> Rc<RefCell<N>> {
    Rc::new(RefCell::new(node))
}

/// Erase the concrete type of a shared node
pub fn node_ref<N: Node + 'static>(node: &Rc<RefCell<N>>) -> NodeRef {
    node.clone()
}

/// Identity comparison that ignores vtable differences
pub(crate) fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}
