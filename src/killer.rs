//! Component D — Greedy-k* Selector (spec §4.4).
//!
//! Per bipartite component, greedily builds a Selected Killing Set (SKS)
//! that covers every parent, then assigns each parent a unique killer by
//! processing the SKS in descending-cost order with first-write-wins.

use crate::arena::BlockArena;
use crate::bipartite::CbcComponent;
use crate::node_id::NodeId;

struct SksEntry {
    killer: NodeId,
    covers: Vec<NodeId>,
    cost: f64,
}

fn build_sks(arena: &BlockArena, cbc: &CbcComponent) -> Vec<SksEntry> {
    let mut x: std::collections::BTreeSet<NodeId> = cbc.parents.clone();
    let mut y_len = 0usize;
    let mut sks = Vec::new();

    while !x.is_empty() {
        let mut best: Option<SksEntry> = None;
        // `cbc.children` is a BTreeSet, so this iterates in ascending
        // NodeId order; the strict `>` below means the first (smallest
        // NodeId) maximal-cost candidate wins ties (spec §4.4's
        // "first-found", made deterministic).
        for &t in &cbc.children {
            let covers: Vec<NodeId> = x
                .iter()
                .copied()
                .filter(|p| cbc.kill_edges.contains(&(*p, t)))
                .collect();
            if covers.is_empty() {
                continue;
            }
            let descendants_t = arena.get(t).map(|r| r.descendants.len()).unwrap_or(0);
            let denom = (descendants_t + y_len).max(1) as f64;
            let cost = covers.len() as f64 / denom;
            if best.as_ref().map(|b| cost > b.cost).unwrap_or(true) {
                best = Some(SksEntry { killer: t, covers, cost });
            }
        }
        let entry = best.expect(
            "every remaining parent has at least one kill edge into some child (CBC invariant)",
        );
        for p in &entry.covers {
            x.remove(p);
        }
        y_len += arena.get(entry.killer).map(|r| r.descendants.len()).unwrap_or(0);
        sks.push(entry);
    }

    sks
}

/// Assign `killer` for every parent across all components.
pub fn select_k_star(arena: &mut BlockArena, components: &[CbcComponent]) {
    let sink = arena.sink();
    for cbc in components {
        let mut sks = build_sks(arena, cbc);
        sks.sort_by(|a, b| a.cost.partial_cmp(&b.cost).expect("cost is never NaN"));
        tracing::debug!(target: "rssp::killer", nr = cbc.nr, sks_size = sks.len(), "computed SKS for component");
        for entry in sks.iter().rev() {
            for &u in &entry.covers {
                let rec = arena.entry(u);
                if rec.killer == sink {
                    rec.killer = entry.killer;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::BlockArena;
    use crate::ir::NodeMode;
    use crate::{bipartite, node_info, pk, toy_ir::ToyIr};

    #[test]
    fn killer_is_always_a_pkiller_or_sink() {
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
        let sink = ir.sink();
        let mut arena = BlockArena::new(sink);
        let nodes = [a, b, c];
        node_info::build_all(&ir, &arch, block, &nodes, &mut arena);
        pk::compute(&mut arena, &nodes);
        let components = bipartite::decompose(&mut arena, &nodes);
        select_k_star(&mut arena, &components);

        for &u in &nodes {
            let rec = arena.get(u).unwrap();
            assert!(rec.killer == sink || rec.pkillers.contains(&rec.killer));
        }
    }
}
