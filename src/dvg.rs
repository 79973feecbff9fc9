//! Component E — DVG Builder (spec §4.5).
//!
//! Builds the Disjoint Value DAG by following each candidate's killer
//! chain up to the sink. Only this construction is implemented; the
//! original's commented-out "descendants of the killer" alternative is
//! deliberately not built (spec §11, DESIGN.md).

use std::collections::BTreeSet;

use crate::arena::BlockArena;
use crate::error::RssBug;
use crate::node_id::NodeId;

/// The Disjoint Value DAG (spec §3): acyclic, with a path from every node
/// up its killer chain to the sink.
#[derive(Debug, Clone, Default)]
pub struct Dvg {
    pub nodes: BTreeSet<NodeId>,
    pub edges: BTreeSet<(NodeId, NodeId)>,
}

/// Build the DVG over `nodes` and populate each node's `dvg_users` in the
/// arena (the inverse of the killer-chain edge relation).
pub fn build(arena: &mut BlockArena, nodes: &[NodeId]) -> Dvg {
    let mut dvg = Dvg::default();

    for &u in nodes {
        let mut cur = u;
        dvg.nodes.insert(cur);
        loop {
            let killer = arena.get(cur).map(|r| r.killer).unwrap_or(cur);
            if killer == cur {
                break;
            }
            if dvg.edges.contains(&(killer, cur)) {
                panic!("{}", RssBug::DvgReverseEdgePresent { from: killer, to: cur });
            }
            dvg.edges.insert((cur, killer));
            dvg.nodes.insert(killer);
            cur = killer;
        }
    }

    for &(src, tgt) in &dvg.edges {
        let users = &mut arena.entry(tgt).dvg_users;
        if !users.contains(&src) {
            users.push(src);
        }
    }

    tracing::debug!(target: "rssp::dvg", nodes = dvg.nodes.len(), edges = dvg.edges.len(), "DVG built");
    dvg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::BlockArena;
    use crate::ir::NodeMode;
    use crate::{bipartite, killer, node_info, pk, toy_ir::ToyIr};

    #[test]
    fn dvg_is_acyclic_for_diamond_shaped_kills() {
        let mut ir = ToyIr::new();
        let block = ir.new_block();
        let a = ir.add_node(block, NodeMode::Normal);
        let b = ir.add_node(block, NodeMode::Normal);
        let c = ir.add_node(block, NodeMode::Normal);
        ir.add_edge(a, b);
        ir.add_edge(a, c);
        ir.mark_live_out(b);
        ir.mark_live_out(c);

        let arch = ir.trivial_arch();
        let mut arena = BlockArena::new(ir.sink());
        let nodes = [a, b, c];
        node_info::build_all(&ir, &arch, block, &nodes, &mut arena);
        pk::compute(&mut arena, &nodes);
        let components = bipartite::decompose(&mut arena, &nodes);
        killer::select_k_star(&mut arena, &components);
        let dvg = build(&mut arena, &nodes);

        // Acyclicity: no edge (x, y) also appears as (y, x).
        for &(s, t) in &dvg.edges {
            assert!(!dvg.edges.contains(&(t, s)));
        }
    }
}
