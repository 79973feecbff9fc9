//! A minimal, in-memory [`IrGraph`]/[`ArchDescription`] pair.
//!
//! There is no real back-end IR available to this crate, so `ToyIr` plays
//! that role for tests and for the `demos/` walkthrough: a flat node list
//! plus an edge list, built the same way `cfg/export.rs`'s test fixtures
//! build a `DiGraph` by hand (`add_node`/`add_edge` calls), generalized
//! from a control-flow graph to a data-dependency graph.

use std::collections::HashSet;

use rustc_hash::FxHashMap;

use crate::arch::ArchDescription;
use crate::ir::{IrGraph, NodeMode};
use crate::node_id::{BlockId, NodeId, RegClassId};

/// A block id no real block ever uses, assigned to the synthetic
/// source/sink so `block_of(sink) != block` always holds for any real
/// block — that's what makes an edge into the sink read as "live out"
/// in [`crate::node_info::build`] without any special-casing.
const EXTERNAL_BLOCK: BlockId = BlockId::MAX;

struct ToyNodeData {
    block: BlockId,
    mode: NodeMode,
}

/// The toy IR graph: a flat node table plus a plain edge list.
pub struct ToyIr {
    nodes: Vec<ToyNodeData>,
    edges: Vec<(NodeId, NodeId)>,
    projs: FxHashMap<NodeId, Vec<NodeId>>,
    next_block: BlockId,
    source: NodeId,
    sink: NodeId,
}

impl ToyIr {
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        nodes.push(ToyNodeData {
            block: EXTERNAL_BLOCK,
            mode: NodeMode::Normal,
        });
        nodes.push(ToyNodeData {
            block: EXTERNAL_BLOCK,
            mode: NodeMode::Normal,
        });
        ToyIr {
            nodes,
            edges: Vec::new(),
            projs: FxHashMap::default(),
            next_block: 0,
            source: NodeId::new(0),
            sink: NodeId::new(1),
        }
    }

    pub fn new_block(&mut self) -> BlockId {
        let b = self.next_block;
        self.next_block += 1;
        b
    }

    pub fn add_node(&mut self, block: BlockId, mode: NodeMode) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(ToyNodeData { block, mode });
        id
    }

    pub fn add_edge(&mut self, src: NodeId, tgt: NodeId) {
        self.edges.push((src, tgt));
    }

    pub fn set_projs(&mut self, tuple: NodeId, projs: Vec<NodeId>) {
        self.projs.insert(tuple, projs);
    }

    /// Convenience used by scenario tests: `node` is consumed outside the
    /// block, i.e. it feeds directly into `sink()`.
    pub fn mark_live_out(&mut self, node: NodeId) {
        self.add_edge(node, self.sink);
    }

    pub fn all_edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    /// A trivial single-register-class architecture with every node
    /// assigned to class 0 and no reserved/ignored registers, ready for
    /// test cases to override via its public fields.
    pub fn trivial_arch(&self) -> ToyArch {
        ToyArch {
            classes: vec![0],
            ignore: HashSet::new(),
            class_of: FxHashMap::default(),
            non_ignore: [(0, 8)].into_iter().collect(),
            reserved: [(0, 0)].into_iter().collect(),
        }
    }
}

impl Default for ToyIr {
    fn default() -> Self {
        Self::new()
    }
}

impl IrGraph for ToyIr {
    fn source(&self) -> NodeId {
        self.source
    }

    fn sink(&self) -> NodeId {
        self.sink
    }

    fn blocks(&self) -> Vec<BlockId> {
        (0..self.next_block).collect()
    }

    fn nodes_in_block(&self, block: BlockId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.block == block && n.mode != NodeMode::Tuple && n.mode != NodeMode::Control)
            .map(|(i, _)| NodeId::new(i as u32))
            .collect()
    }

    fn block_of(&self, node: NodeId) -> BlockId {
        self.nodes[node.index() as usize].block
    }

    fn mode(&self, node: NodeId) -> NodeMode {
        self.nodes[node.index() as usize].mode
    }

    fn successors(&self, node: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|(s, _)| *s == node)
            .map(|(_, t)| *t)
            .collect()
    }

    fn projs_of(&self, tuple: NodeId) -> Vec<NodeId> {
        self.projs.get(&tuple).cloned().unwrap_or_default()
    }

    fn add_dependency_edge(&mut self, src: NodeId, tgt: NodeId) {
        self.edges.push((src, tgt));
    }
}

/// A single-register-class-by-default architecture description, with
/// public fields so test cases can shape register classes, budgets and
/// ignore sets directly.
pub struct ToyArch {
    pub classes: Vec<RegClassId>,
    pub ignore: HashSet<NodeId>,
    pub class_of: FxHashMap<NodeId, RegClassId>,
    pub non_ignore: FxHashMap<RegClassId, usize>,
    pub reserved: FxHashMap<RegClassId, usize>,
}

impl ArchDescription for ToyArch {
    fn register_classes(&self) -> Vec<RegClassId> {
        self.classes.clone()
    }

    fn register_class_of(&self, node: NodeId) -> Option<RegClassId> {
        if self.ignore.contains(&node) {
            return None;
        }
        Some(*self.class_of.get(&node).unwrap_or(&0))
    }

    fn non_ignore_register_count(&self, class: RegClassId) -> usize {
        *self.non_ignore.get(&class).unwrap_or(&0)
    }

    fn abi_reserved_register_count(&self, class: RegClassId) -> usize {
        *self.reserved.get(&class).unwrap_or(&0)
    }

    fn is_ignore(&self, node: NodeId) -> bool {
        self.ignore.contains(&node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_nodes_get_increasing_ids() {
        let mut ir = ToyIr::new();
        let b = ir.new_block();
        let a = ir.add_node(b, NodeMode::Normal);
        let c = ir.add_node(b, NodeMode::Normal);
        assert!(a.index() < c.index());
    }
}
