//! Common test utilities and helpers

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use vmp_engine::node::{node_ref, shared};
use vmp_engine::testing::ScriptedNode;
use vmp_engine::{InferenceConfig, InferenceLoop, NodeRef};

pub type Shared = Rc<RefCell<ScriptedNode>>;

/// The two-node model used throughout: `mu` improves towards a fixed point,
/// `tau` is constant.
pub fn mu_tau() -> (Shared, Shared) {
    (
        shared(ScriptedNode::new("mu", vec![-10.0, -6.0, -4.5, -4.25, -4.25])),
        shared(ScriptedNode::constant("tau", -2.0)),
    )
}

pub fn refs(nodes: &[&Shared]) -> Vec<NodeRef> {
    nodes.iter().map(|node| node_ref(*node)).collect()
}

pub fn build(nodes: &[&Shared], config: InferenceConfig) -> InferenceLoop {
    InferenceLoop::from_config(refs(nodes), config).expect("valid model")
}
