//! Component C — Bipartite Decomposer (spec §4.3).
//!
//! Partitions the kill relation `EPK = {(u, v) : v ∈ pkillers(u)}` into
//! connected bipartite components, each a `(parents, children, kill_edges)`
//! triple with `parents ∩ children = ∅`.

use std::collections::BTreeSet;

use crate::arena::BlockArena;
use crate::node_id::NodeId;

/// A connected bipartite component of the kill relation (spec §3).
#[derive(Debug, Clone)]
pub struct CbcComponent {
    pub parents: BTreeSet<NodeId>,
    pub children: BTreeSet<NodeId>,
    pub kill_edges: BTreeSet<(NodeId, NodeId)>,
    pub nr: u32,
}

/// Decompose the kill relation over `nodes` into components. `nodes` must
/// already have `pkillers`/`kill_values` populated by [`crate::pk::compute`].
pub fn decompose(arena: &mut BlockArena, nodes: &[NodeId]) -> Vec<CbcComponent> {
    let mut components = Vec::new();
    let mut nr = 0u32;

    for &u in nodes {
        let already_visited = arena.get(u).map(|n| n.visited).unwrap_or(false);
        let has_pkillers = arena.get(u).map(|n| !n.pkillers.is_empty()).unwrap_or(false);
        if already_visited || !has_pkillers {
            continue;
        }

        let mut parents: BTreeSet<NodeId> = BTreeSet::new();
        let mut children: BTreeSet<NodeId> = BTreeSet::new();
        parents.insert(u);
        children.extend(arena.get(u).unwrap().pkillers.iter().copied());

        loop {
            let mut changed = false;

            for c in children.clone() {
                if let Some(rec) = arena.get(c) {
                    for &p in &rec.kill_values {
                        changed |= parents.insert(p);
                    }
                }
            }
            for p in parents.clone() {
                if let Some(rec) = arena.get(p) {
                    for &c in &rec.pkillers {
                        changed |= children.insert(c);
                    }
                }
            }

            if !changed {
                break;
            }
        }

        for &p in &parents {
            arena.entry(p).visited = true;
        }

        // Bipartite property: a node cannot be both a parent and a child.
        for overlap in parents.intersection(&children).copied().collect::<Vec<_>>() {
            children.remove(&overlap);
        }

        let mut kill_edges = BTreeSet::new();
        for &p in &parents {
            if let Some(rec) = arena.get(p) {
                for &v in &rec.pkillers {
                    if children.contains(&v) {
                        kill_edges.insert((p, v));
                    }
                }
            }
        }

        tracing::debug!(
            target: "rssp::bipartite",
            nr,
            parents = parents.len(),
            children = children.len(),
            "bipartite component inserted"
        );
        components.push(CbcComponent {
            parents,
            children,
            kill_edges,
            nr,
        });
        nr += 1;
    }

    components
}
