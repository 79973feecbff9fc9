//! The height-analysis contract this pass consumes (spec §6), plus a
//! concrete implementation over a `petgraph` dependency graph.

use std::cell::RefCell;
use std::collections::HashMap;

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsSpace;
use rustc_hash::FxHashMap;

use crate::node_id::NodeId;

/// Longest-path and reachability queries within a single block, recomputed
/// after every edge the pass inserts.
pub trait HeightAnalysis {
    /// Recompute the longest-path height of every node in the block,
    /// returning the maximum height observed (`max_block_height` in §4.7).
    fn recompute_block(&mut self) -> u32;

    /// The longest path from `node` to the block's sink, as of the last
    /// [`HeightAnalysis::recompute_block`] call.
    fn height(&self, node: NodeId) -> u32;

    /// Whether `to` is reachable from `from` within the block's dependency
    /// graph, as of the last recompute.
    fn reachable(&self, from: NodeId, to: NodeId) -> bool;

    /// Add a new dependency edge to the height graph. Callers must call
    /// [`HeightAnalysis::recompute_block`] afterward before querying heights
    /// or reachability again (spec §11, admissibility-via-heights note).
    fn add_edge(&mut self, src: NodeId, tgt: NodeId);
}

/// A `petgraph`-backed height analysis over a single block's dependency
/// graph (data-flow edges plus every serialization edge inserted so far).
///
/// Mirrors `ReachabilityCache`'s shape: a owned graph plus a scratch
/// `DfsSpace` reused across queries so repeated `has_path_connecting` calls
/// don't reallocate.
pub struct BlockHeights {
    graph: DiGraph<NodeId, ()>,
    index_of: FxHashMap<NodeId, NodeIndex>,
    heights: HashMap<NodeId, u32>,
    sink: NodeId,
    space: RefCell<DfsSpace<NodeIndex, <DiGraph<NodeId, ()> as petgraph::visit::Visitable>::Map>>,
}

impl BlockHeights {
    /// Build a height analysis over `nodes` connected by `edges` (the
    /// block's real data-flow edges); `sink` is the block's synthetic sink.
    pub fn new(nodes: &[NodeId], edges: &[(NodeId, NodeId)], sink: NodeId) -> Self {
        let mut graph = DiGraph::new();
        let mut index_of = FxHashMap::default();
        for &n in nodes {
            let idx = graph.add_node(n);
            index_of.insert(n, idx);
        }
        for &(src, tgt) in edges {
            let (s, t) = (index_of[&src], index_of[&tgt]);
            graph.add_edge(s, t, ());
        }
        let space = RefCell::new(DfsSpace::new(&graph));
        let mut me = BlockHeights {
            graph,
            index_of,
            heights: HashMap::new(),
            sink,
            space,
        };
        me.recompute_block();
        me
    }
}

impl HeightAnalysis for BlockHeights {
    fn recompute_block(&mut self) -> u32 {
        let order = petgraph::algo::toposort(&self.graph, None)
            .expect("block dependency graph must be acyclic");
        self.heights.clear();
        let mut max_height = 0u32;
        for &idx in order.iter().rev() {
            let node = self.graph[idx];
            let h = if node == self.sink {
                0
            } else {
                self.graph
                    .neighbors(idx)
                    .map(|succ| 1 + self.heights.get(&self.graph[succ]).copied().unwrap_or(0))
                    .max()
                    .unwrap_or(0)
            };
            self.heights.insert(node, h);
            max_height = max_height.max(h);
        }
        max_height
    }

    fn height(&self, node: NodeId) -> u32 {
        self.heights.get(&node).copied().unwrap_or(0)
    }

    fn reachable(&self, from: NodeId, to: NodeId) -> bool {
        let (a, b) = (self.index_of[&from], self.index_of[&to]);
        has_path_connecting(&self.graph, a, b, Some(&mut self.space.borrow_mut()))
    }

    fn add_edge(&mut self, src: NodeId, tgt: NodeId) {
        let s = self.index_of[&src];
        let t = self.index_of[&tgt];
        self.graph.add_edge(s, t, ());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(i: u32) -> NodeId {
        NodeId::new(i)
    }

    #[test]
    fn straight_line_heights_decrease_toward_sink() {
        let sink = n(3);
        let nodes = [n(0), n(1), n(2), sink];
        let edges = [(n(0), n(1)), (n(1), n(2)), (n(2), sink)];
        let heights = BlockHeights::new(&nodes, &edges, sink);
        assert_eq!(heights.height(sink), 0);
        assert_eq!(heights.height(n(2)), 1);
        assert_eq!(heights.height(n(0)), 3);
    }

    #[test]
    fn reachability_respects_new_edges() {
        let sink = n(2);
        let nodes = [n(0), n(1), sink];
        let edges = [(n(0), sink), (n(1), sink)];
        let mut heights = BlockHeights::new(&nodes, &edges, sink);
        assert!(!heights.reachable(n(0), n(1)));
        heights.add_edge(n(0), n(1));
        heights.recompute_block();
        assert!(heights.reachable(n(0), n(1)));
    }
}
