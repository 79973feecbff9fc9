//! Per-block record storage (spec §3 "Lifecycles", §9 arena note).
//!
//! Every [`RssNode`] and the index that looks one up by [`NodeId`] lives in
//! a [`BlockArena`]; the whole thing is dropped when [`crate::driver`]
//! finishes a block. There is no cross-block state.

use rustc_hash::FxHashMap;

use crate::node_id::NodeId;

/// Per-candidate-node analysis record (spec §3 `RssNode`).
#[derive(Debug, Clone)]
pub struct RssNode {
    pub id: NodeId,
    /// Consumers inside the block, sorted by index; `Sink` if any consumer
    /// is outside the block.
    pub consumers: Vec<NodeId>,
    /// Transitively reachable in-block consumers, sorted by index, plus
    /// `Sink` if any path leaves the block.
    pub descendants: Vec<NodeId>,
    /// Values this node kills, populated by the bipartite decomposer.
    pub parents: Vec<NodeId>,
    /// v such that v is a potential killer of this node.
    pub pkillers: Vec<NodeId>,
    /// Inverse of `pkillers`: nodes this value is a potential killer of.
    pub kill_values: Vec<NodeId>,
    /// DVG analogue of `consumers`.
    pub dvg_users: Vec<NodeId>,
    /// DVG analogue of `pkillers`. `serialize::build_dvg_pkillers` computes
    /// this per DVG node into its own map rather than writing it back here;
    /// kept on the record for parity with `pkillers` above and for a future
    /// caller that wants it arena-resident instead of recomputed per pass.
    #[allow(dead_code)]
    pub dvg_pkillers: Vec<NodeId>,
    /// Selected killer from k*; starts as `Sink`.
    pub killer: NodeId,
    /// Index of the chain this node belongs to in the minimum chain
    /// partition, once computed. `antichain::min_chain_partition` keeps its
    /// own `chain_of` lookup rather than writing back here; kept for a
    /// future caller that wants chain membership arena-resident.
    #[allow(dead_code)]
    pub chain: Option<usize>,
    pub live_out: bool,
    pub handled: bool,
    pub visited: bool,
    #[allow(dead_code)]
    pub dumped: bool,
}

impl RssNode {
    fn fresh(id: NodeId, sink: NodeId) -> Self {
        RssNode {
            id,
            consumers: Vec::new(),
            descendants: Vec::new(),
            parents: Vec::new(),
            pkillers: Vec::new(),
            kill_values: Vec::new(),
            dvg_users: Vec::new(),
            dvg_pkillers: Vec::new(),
            killer: sink,
            chain: None,
            live_out: false,
            handled: false,
            visited: false,
            dumped: false,
        }
    }
}

/// The per-block record table, reset once per (block, register class) pair
/// (spec §4.8: "reset node list to {Sink}").
pub struct BlockArena {
    sink: NodeId,
    nodes: FxHashMap<NodeId, RssNode>,
}

impl BlockArena {
    /// A fresh arena containing only the sink record.
    pub fn new(sink: NodeId) -> Self {
        let mut nodes = FxHashMap::default();
        nodes.insert(sink, RssNode::fresh(sink, sink));
        BlockArena { sink, nodes }
    }

    /// Look up or create the record for `id`.
    pub fn entry(&mut self, id: NodeId) -> &mut RssNode {
        let sink = self.sink;
        self.nodes.entry(id).or_insert_with(|| RssNode::fresh(id, sink))
    }

    pub fn get(&self, id: NodeId) -> Option<&RssNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_arena_contains_only_sink() {
        let sink = NodeId::new(0);
        let arena = BlockArena::new(sink);
        assert_eq!(arena.len(), 1);
        assert!(arena.contains(sink));
        assert_eq!(arena.get(sink).unwrap().killer, sink);
    }

    #[test]
    fn entry_creates_node_with_sink_killer() {
        let sink = NodeId::new(0);
        let mut arena = BlockArena::new(sink);
        let n = arena.entry(NodeId::new(1));
        assert_eq!(n.killer, sink);
        assert!(!n.handled);
    }
}
