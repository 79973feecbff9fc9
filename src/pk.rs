//! Component B — Potential-Killer Analyzer (spec §4.2).
//!
//! `v ∈ PK(u)` iff `descendants(v) ∩ consumers(u) ⊆ {v}`: every path from
//! `u` to one of its consumers either ends at `v` or passes through it, so
//! scheduling `v` necessarily kills `u`.

use crate::arena::BlockArena;
use crate::node_id::NodeId;

/// `descendants(v) ∩ consumers(u) ⊆ {v}`, tested by walking the shorter of
/// the two sorted arrays against the other via binary search.
fn is_potential_killer(descendants_v: &[NodeId], consumers_u: &[NodeId], v: NodeId) -> bool {
    let (short, long) = if descendants_v.len() <= consumers_u.len() {
        (descendants_v, consumers_u)
    } else {
        (consumers_u, descendants_v)
    };
    short
        .iter()
        .filter(|&&d| d != v)
        .all(|d| long.binary_search(d).is_err())
}

/// Compute `pkillers`/`kill_values` for every candidate in `nodes`. Node
/// info (`consumers`/`descendants`) must already be built for all of them.
pub fn compute(arena: &mut BlockArena, nodes: &[NodeId]) {
    for &u in nodes {
        let consumers_u = arena
            .get(u)
            .expect("node info must be built before PK analysis")
            .consumers
            .clone();

        let mut pkillers = Vec::new();
        for &v in &consumers_u {
            let descendants_v = arena
                .get(v)
                .map(|r| r.descendants.clone())
                .unwrap_or_default();
            if is_potential_killer(&descendants_v, &consumers_u, v) {
                pkillers.push(v);
            }
        }
        pkillers.sort_by_key(|n| n.index());
        pkillers.dedup();
        tracing::trace!(target: "rssp::pk", node = ?u, pkillers = ?pkillers, "computed potential killers");

        for &v in &pkillers {
            arena.entry(v).kill_values.push(u);
        }
        arena.entry(u).pkillers = pkillers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::NodeMode;
    use crate::node_info;
    use crate::toy_ir::ToyIr;

    #[test]
    fn sole_consumer_is_a_potential_killer() {
        let mut ir = ToyIr::new();
        let block = ir.new_block();
        let a = ir.add_node(block, NodeMode::Normal);
        let b = ir.add_node(block, NodeMode::Normal);
        ir.add_edge(a, b);
        ir.mark_live_out(b);

        let arch = ir.trivial_arch();
        let mut arena = crate::arena::BlockArena::new(ir.sink());
        let nodes = [a, b];
        node_info::build_all(&ir, &arch, block, &nodes, &mut arena);
        compute(&mut arena, &nodes);

        assert!(arena.get(a).unwrap().pkillers.contains(&b));
    }

    #[test]
    fn invariant_one_holds_over_fan_out() {
        // a has two consumers b, c that both flow into the same sink.
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
        let mut arena = crate::arena::BlockArena::new(ir.sink());
        let nodes = [a, b, c];
        node_info::build_all(&ir, &arch, block, &nodes, &mut arena);
        compute(&mut arena, &nodes);

        for &u in &nodes {
            let consumers_u = arena.get(u).unwrap().consumers.clone();
            for &v in &arena.get(u).unwrap().pkillers.clone() {
                let descendants_v = arena.get(v).unwrap().descendants.clone();
                for d in descendants_v {
                    if d != v {
                        assert!(!consumers_u.contains(&d));
                    }
                }
            }
        }
    }
}
