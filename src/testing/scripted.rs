//! Scripted node for driving the inference loop in tests

use anyhow::{bail, Result};
use std::cell::Cell;

use crate::checkpoint::Section;
use crate::node::{Capabilities, Node};

/// A node whose bound contributions follow a fixed script
///
/// Every `update` advances one step through the script. The contribution
/// reported is the entry for the current step, and the last entry repeats
/// once the script runs out. A node that is never updated reports the first
/// entry.
#[derive(Debug)]
pub struct ScriptedNode {
    name: String,
    script: Vec<f64>,
    capabilities: Capabilities,
    updates: usize,
    fail_update_at: Option<usize>,
    fail_bound_at: Option<usize>,
    fail_save: bool,
    fail_load: bool,
    saves: Cell<usize>,
    loads: usize,
}

impl ScriptedNode {
    pub fn new(name: &str, script: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            script,
            capabilities: Capabilities::ALL,
            updates: 0,
            fail_update_at: None,
            fail_bound_at: None,
            fail_save: false,
            fail_load: false,
            saves: Cell::new(0),
            loads: 0,
        }
    }

    /// A node that always contributes `value`
    pub fn constant(name: &str, value: f64) -> Self {
        Self::new(name, vec![value])
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Fail the `n`th call to `update` (1-based)
    pub fn failing_update_at(mut self, n: usize) -> Self {
        self.fail_update_at = Some(n);
        self
    }

    /// Fail the bound computation once `n` updates have happened
    pub fn failing_bound_at(mut self, n: usize) -> Self {
        self.fail_bound_at = Some(n);
        self
    }

    /// Fail every `save` before writing anything into the section
    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Fail every `load` without changing the node
    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn updates(&self) -> usize {
        self.updates
    }

    pub fn saves(&self) -> usize {
        self.saves.get()
    }

    pub fn loads(&self) -> usize {
        self.loads
    }

    fn current(&self) -> f64 {
        let step = self.updates.saturating_sub(1);
        match self.script.get(step).or(self.script.last()) {
            Some(value) => *value,
            None => 0.0,
        }
    }
}

impl Node for ScriptedNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn update(&mut self) -> Result<()> {
        if self.fail_update_at == Some(self.updates + 1) {
            bail!("scripted update failure at step {}", self.updates + 1);
        }
        self.updates += 1;
        Ok(())
    }

    fn lower_bound_contribution(&self) -> Result<f64> {
        if self.fail_bound_at == Some(self.updates) {
            bail!("scripted bound failure after {} updates", self.updates);
        }
        Ok(self.current())
    }

    fn save(&self, section: &mut Section) -> Result<()> {
        if self.fail_save {
            bail!("scripted save failure");
        }
        section.set("updates", &self.updates)?;
        section.group("script").set("values", &self.script)?;
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn load(&mut self, section: &Section) -> Result<()> {
        if self.fail_load {
            bail!("scripted load failure");
        }
        self.updates = section.get("updates")?;
        if let Some(script) = section.subsection("script") {
            self.script = script.get("values")?;
        }
        self.loads += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_advances_and_saturates() {
        let mut node = ScriptedNode::new("a", vec![1.0, 2.0]);
        assert_eq!(node.lower_bound_contribution().unwrap(), 1.0);
        node.update().unwrap();
        assert_eq!(node.lower_bound_contribution().unwrap(), 1.0);
        node.update().unwrap();
        assert_eq!(node.lower_bound_contribution().unwrap(), 2.0);
        node.update().unwrap();
        assert_eq!(node.lower_bound_contribution().unwrap(), 2.0);
    }

    #[test]
    fn test_failing_update_leaves_state() {
        let mut node = ScriptedNode::constant("a", 1.0).failing_update_at(2);
        node.update().unwrap();
        assert!(node.update().is_err());
        assert_eq!(node.updates(), 1);
    }

    #[test]
    fn test_save_load_restores_position() {
        let mut source = ScriptedNode::new("a", vec![1.0, 2.0, 3.0]);
        source.update().unwrap();
        source.update().unwrap();

        let mut section = Section::new();
        source.save(&mut section).unwrap();

        let mut target = ScriptedNode::new("a", Vec::new());
        target.load(&section).unwrap();
        assert_eq!(target.updates(), 2);
        assert_eq!(target.lower_bound_contribution().unwrap(), 2.0);
        assert_eq!(source.saves(), 1);
        assert_eq!(target.loads(), 1);
    }

    #[test]
    fn test_failing_save_and_load_leave_state() {
        let source = ScriptedNode::constant("a", 1.0).failing_save();
        let mut section = Section::new();
        assert!(source.save(&mut section).is_err());
        assert!(section.is_empty());
        assert_eq!(source.saves(), 0);

        let mut target = ScriptedNode::constant("a", 1.0).failing_load();
        ScriptedNode::constant("a", 1.0).save(&mut section).unwrap();
        assert!(target.load(&section).is_err());
        assert_eq!(target.updates(), 0);
        assert_eq!(target.loads(), 0);
    }
}
