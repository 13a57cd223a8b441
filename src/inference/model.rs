//! The ordered, deduplicated set of nodes an inference loop drives

use anyhow::anyhow;
use once_cell::unsync::OnceCell;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{Error, NodeOperation, Result};
use crate::node::{same_node, Capabilities, NodeId, NodeKey, NodeRef, Selection};

/// A node together with what was read from it at construction time
#[derive(Debug)]
pub(crate) struct ModelEntry {
    pub node: NodeRef,
    pub name: String,
    pub capabilities: Capabilities,
}

#[derive(Debug)]
pub(crate) struct Model {
    entries: Vec<ModelEntry>,
    names: OnceCell<HashMap<String, NodeId>>,
}

impl Model {
    /// Deduplicate by identity keeping first-seen order, then check that no
    /// two named nodes share a name.
    pub fn new<I: IntoIterator<Item = NodeRef>>(nodes: I) -> Result<Self> {
        let mut entries: Vec<ModelEntry> = Vec::new();

        for node in nodes {
            if entries.iter().any(|entry| same_node(&entry.node, &node)) {
                continue;
            }
            let (name, capabilities) = {
                let borrowed = node.try_borrow().map_err(|_| {
                    Error::configuration("cannot add a node that is mutably borrowed")
                })?;
                (borrowed.name().to_string(), borrowed.capabilities())
            };
            entries.push(ModelEntry {
                node,
                name,
                capabilities,
            });
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !entry.name.is_empty() && !seen.insert(entry.name.as_str()) {
                return Err(Error::configuration(format!(
                    "Use unique names for nodes, {} appears more than once",
                    entry.name
                )));
            }
        }

        Ok(Self {
            entries,
            names: OnceCell::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.entries.len()).map(NodeId)
    }

    pub fn entry(&self, id: NodeId) -> &ModelEntry {
        &self.entries[id.index()]
    }

    pub fn entries(&self) -> impl Iterator<Item = (NodeId, &ModelEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (NodeId(index), entry))
    }

    fn name_index(&self) -> &HashMap<String, NodeId> {
        self.names.get_or_init(|| {
            debug!("Building name index for {} nodes", self.entries.len());
            self.entries()
                .filter(|(_, entry)| !entry.name.is_empty())
                .map(|(id, entry)| (entry.name.clone(), id))
                .collect()
        })
    }

    /// Handles resolve by identity only; a handle that is not a member is
    /// rejected even when a member carries the same name.
    pub fn resolve(&self, key: &NodeKey) -> Result<NodeId> {
        match key {
            NodeKey::Id(id) if id.index() < self.entries.len() => Ok(*id),
            NodeKey::Id(id) => Err(Error::lookup(format!("no node {id} in model"))),
            NodeKey::Ref(node) => self
                .entries
                .iter()
                .position(|entry| same_node(&entry.node, node))
                .map(NodeId)
                .ok_or_else(|| Error::lookup(format!("{key:?} is not a node of this model"))),
            NodeKey::Name(name) => self.resolve_name(name),
        }
    }

    fn resolve_name(&self, name: &str) -> Result<NodeId> {
        self.name_index()
            .get(name)
            .copied()
            .ok_or_else(|| Error::lookup(format!("no node named {name:?} in model")))
    }

    /// Resolve a selection once, up front. Explicit subsets keep caller order.
    pub fn resolve_selection(&self, selection: &Selection) -> Result<Vec<NodeId>> {
        match selection {
            Selection::Subset(keys) if !keys.is_empty() => {
                keys.iter().map(|key| self.resolve(key)).collect()
            }
            _ => Ok(self.ids().collect()),
        }
    }

    /// Persistence requires every node to carry a name
    pub fn require_names(&self, operation: &str) -> Result<()> {
        if let Some((id, _)) = self.entries().find(|(_, entry)| entry.name.is_empty()) {
            return Err(Error::configuration(format!(
                "In order to {operation} nodes, they must have (unique) names; node {id} has none"
            )));
        }
        Ok(())
    }

    /// Update one node if it is updatable
    pub fn update(&self, id: NodeId) -> Result<()> {
        let entry = self.entry(id);
        if !entry.capabilities.update {
            return Ok(());
        }
        let mut node = entry.node.try_borrow_mut().map_err(|_| {
            Error::node(&entry.name, NodeOperation::Update, anyhow!("node is already borrowed"))
        })?;
        node.update()
            .map_err(|e| Error::node(&entry.name, NodeOperation::Update, e))
    }

    /// Current bound contribution of every node, in model order
    pub fn contributions(&self) -> Result<Vec<f64>> {
        self.entries
            .iter()
            .map(|entry| {
                let node = entry.node.try_borrow().map_err(|_| {
                    Error::node(
                        &entry.name,
                        NodeOperation::LowerBound,
                        anyhow!("node is mutably borrowed"),
                    )
                })?;
                node.lower_bound_contribution()
                    .map_err(|e| Error::node(&entry.name, NodeOperation::LowerBound, e))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{node_ref, shared};
    use crate::testing::ScriptedNode;

    #[test]
    fn test_deduplicates_by_identity() {
        let a = node_ref(&shared(ScriptedNode::constant("a", 1.0)));
        let b = node_ref(&shared(ScriptedNode::constant("b", 2.0)));

        let model = Model::new(vec![a.clone(), b.clone(), a.clone()]).unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.entry(NodeId(0)).name, "a");
        assert_eq!(model.entry(NodeId(1)).name, "b");
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let a = node_ref(&shared(ScriptedNode::constant("x", 1.0)));
        let b = node_ref(&shared(ScriptedNode::constant("x", 2.0)));
        assert!(Model::new(vec![a, b]).unwrap_err().is_configuration());
    }

    #[test]
    fn test_unnamed_nodes_are_allowed_but_not_persistable() {
        let a = node_ref(&shared(ScriptedNode::constant("", 1.0)));
        let b = node_ref(&shared(ScriptedNode::constant("", 2.0)));
        let model = Model::new(vec![a, b]).unwrap();
        assert!(model.require_names("save").unwrap_err().is_configuration());
    }

    #[test]
    fn test_resolve_by_name_id_and_ref() {
        let a = node_ref(&shared(ScriptedNode::constant("a", 1.0)));
        let b = node_ref(&shared(ScriptedNode::constant("b", 2.0)));
        let model = Model::new(vec![a, b.clone()]).unwrap();

        assert_eq!(model.resolve(&"b".into()).unwrap(), NodeId(1));
        assert_eq!(model.resolve(&NodeId(0).into()).unwrap(), NodeId(0));
        assert_eq!(model.resolve(&(&b).into()).unwrap(), NodeId(1));
        assert!(model.resolve(&"c".into()).unwrap_err().is_lookup());
        assert!(model.resolve(&NodeId(5).into()).unwrap_err().is_lookup());
    }

    #[test]
    fn test_foreign_ref_is_rejected_despite_shared_name() {
        let a = node_ref(&shared(ScriptedNode::constant("a", 1.0)));
        let twin = node_ref(&shared(ScriptedNode::constant("a", 5.0)));
        let model = Model::new(vec![a]).unwrap();

        assert!(model.resolve(&(&twin).into()).unwrap_err().is_lookup());
        assert!(model
            .resolve_selection(&Selection::Subset(vec![NodeKey::from(&twin)]))
            .unwrap_err()
            .is_lookup());
    }

    #[test]
    fn test_selection_keeps_caller_order() {
        let a = node_ref(&shared(ScriptedNode::constant("a", 1.0)));
        let b = node_ref(&shared(ScriptedNode::constant("b", 2.0)));
        let model = Model::new(vec![a, b]).unwrap();

        let ids = model
            .resolve_selection(&Selection::subset(["b", "a"]))
            .unwrap();
        assert_eq!(ids, vec![NodeId(1), NodeId(0)]);
        assert_eq!(
            model.resolve_selection(&Selection::All).unwrap(),
            vec![NodeId(0), NodeId(1)]
        );
    }

    #[test]
    fn test_update_skips_non_updatable_nodes() {
        let observed = shared(
            ScriptedNode::constant("data", -3.0)
                .with_capabilities(crate::node::Capabilities::OBSERVED),
        );
        let model = Model::new(vec![node_ref(&observed)]).unwrap();

        model.update(NodeId(0)).unwrap();
        assert_eq!(observed.borrow().updates(), 0);
        assert_eq!(model.contributions().unwrap(), vec![-3.0]);
    }

    #[test]
    fn test_update_reports_borrowed_node() {
        let a = shared(ScriptedNode::constant("a", 1.0));
        let model = Model::new(vec![node_ref(&a)]).unwrap();

        let _held = a.borrow();
        let err = model.update(NodeId(0)).unwrap_err();
        assert!(matches!(
            err,
            Error::Node {
                operation: NodeOperation::Update,
                ..
            }
        ));
    }
}
