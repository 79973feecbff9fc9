//! Component F — Antichain Solver (spec §4.6).
//!
//! Reduces the DVG to a minimum chain partition via maximum-cardinality
//! bipartite matching, then extracts a maximum antichain from the chain
//! heads by repeatedly pushing down any representative found to dominate
//! another.
//!
//! The original used the Hungarian algorithm in maximize-utility mode;
//! since every matching edge here has unit weight, this crate uses Kuhn's
//! augmenting-path algorithm instead — equivalent for a 0/1 cost matrix and
//! the more idiomatic choice when weights are uniform (see DESIGN.md).

use std::collections::{BTreeSet, VecDeque};

use rustc_hash::FxHashMap;

use crate::dvg::Dvg;
use crate::node_id::NodeId;

/// One chain of the minimum chain partition, head-first: `nodes[0]` is the
/// unmatched (topmost) element, each subsequent element is its matched
/// successor, and the last real element's killer is the sink.
#[derive(Debug, Clone)]
pub struct Chain {
    pub nodes: Vec<NodeId>,
}

/// Result of the matching step: the chain partition plus a lookup from
/// node to the chain (and position within it) it belongs to.
pub struct ChainPartition {
    pub chains: Vec<Chain>,
    chain_of: FxHashMap<NodeId, (usize, usize)>,
}

fn try_kuhn(
    u: usize,
    adj: &[Vec<usize>],
    visited: &mut [bool],
    match_right: &mut [Option<usize>],
) -> bool {
    for &v in &adj[u] {
        if visited[v] {
            continue;
        }
        visited[v] = true;
        if match_right[v].is_none() || try_kuhn(match_right[v].unwrap(), adj, visited, match_right) {
            match_right[v] = Some(u);
            return true;
        }
    }
    false
}

/// Run maximum-cardinality bipartite matching over the DVG's edge relation
/// and derive the minimum chain partition (spec §4.6).
pub fn min_chain_partition(dvg: &Dvg) -> ChainPartition {
    let order: Vec<NodeId> = dvg.nodes.iter().copied().collect();
    let index_of: FxHashMap<NodeId, usize> =
        order.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let n = order.len();

    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(src, tgt) in &dvg.edges {
        adj[index_of[&src]].push(index_of[&tgt]);
    }

    let mut match_right: Vec<Option<usize>> = vec![None; n];
    for u in 0..n {
        let mut visited = vec![false; n];
        try_kuhn(u, &adj, &mut visited, &mut match_right);
    }

    let mut match_left: Vec<Option<usize>> = vec![None; n];
    for (j, mu) in match_right.iter().enumerate() {
        if let Some(i) = mu {
            match_left[*i] = Some(j);
        }
    }

    let heads: Vec<usize> = (0..n).filter(|&j| match_right[j].is_none()).collect();

    let mut chains = Vec::new();
    let mut chain_of = FxHashMap::default();
    for head in heads {
        let mut nodes = Vec::new();
        let mut cur = head;
        loop {
            nodes.push(order[cur]);
            match match_left[cur] {
                Some(next) => cur = next,
                None => break,
            }
        }
        let chain_idx = chains.len();
        for (pos, &node) in nodes.iter().enumerate() {
            chain_of.insert(node, (chain_idx, pos));
        }
        chains.push(Chain { nodes });
    }

    debug_assert_eq!(
        chain_of.len(),
        n,
        "chains must partition every DVG node exactly once"
    );

    ChainPartition { chains, chain_of }
}

fn reachable(adj: &FxHashMap<NodeId, Vec<NodeId>>, from: NodeId, to: NodeId) -> bool {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(from);
    seen.insert(from);
    while let Some(cur) = queue.pop_front() {
        if let Some(succs) = adj.get(&cur) {
            for &s in succs {
                if s == to {
                    return true;
                }
                if seen.insert(s) {
                    queue.push_back(s);
                }
            }
        }
    }
    false
}

/// Extract a maximum antichain from a chain partition (spec §4.6).
///
/// Seeds the candidate set with every chain head, then repeatedly removes
/// any candidate found to dominate another (b reachable from a via DVG
/// edges) and replaces it with its own chain successor — the standard
/// technique for turning a chain partition's maximal elements into a
/// genuine antichain. A chain with no successor left before the sink
/// simply drops out, which is why a maximum antichain can be smaller than
/// the chain count only in the degenerate single-node case; in general
/// |antichain| = |chains| (spec invariant 5).
pub fn extract_antichain(dvg: &Dvg, partition: &ChainPartition, sink: NodeId) -> Vec<NodeId> {
    let mut adj: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for &(src, tgt) in &dvg.edges {
        adj.entry(src).or_default().push(tgt);
    }

    let mut values: BTreeSet<NodeId> = partition
        .chains
        .iter()
        .filter_map(|c| c.nodes.first().copied())
        .collect();

    loop {
        let snapshot: Vec<NodeId> = values.iter().copied().collect();
        let mut dominating = Vec::new();
        for &a in &snapshot {
            for &b in &snapshot {
                if a != b && reachable(&adj, a, b) {
                    dominating.push(a);
                    break;
                }
            }
        }
        if dominating.is_empty() {
            break;
        }
        for a in dominating {
            values.remove(&a);
            if let Some(&(chain_idx, pos)) = partition.chain_of.get(&a) {
                let chain = &partition.chains[chain_idx];
                if let Some(&next) = chain.nodes.get(pos + 1) {
                    if next != sink {
                        values.insert(next);
                    }
                }
            }
        }
    }

    let result: Vec<NodeId> = values.into_iter().collect();
    tracing::debug!(target: "rssp::antichain", size = result.len(), "maximum antichain extracted");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::BlockArena;
    use crate::ir::NodeMode;
    use crate::{bipartite, dvg, killer, node_info, pk, toy_ir::ToyIr};

    fn run_pipeline(edges: &[(u32, u32)], live_out: &[u32], count: u32) -> (Dvg, ChainPartition, NodeId) {
        let mut ir = ToyIr::new();
        let block = ir.new_block();
        let mut made = Vec::new();
        for _ in 0..count {
            made.push(ir.add_node(block, NodeMode::Normal));
        }
        for &(a, b) in edges {
            ir.add_edge(made[a as usize], made[b as usize]);
        }
        for &l in live_out {
            ir.mark_live_out(made[l as usize]);
        }
        let arch = ir.trivial_arch();
        let sink = ir.sink();
        let mut arena = BlockArena::new(sink);
        node_info::build_all(&ir, &arch, block, &made, &mut arena);
        pk::compute(&mut arena, &made);
        let components = bipartite::decompose(&mut arena, &made);
        killer::select_k_star(&mut arena, &components);
        let d = dvg::build(&mut arena, &made);
        let partition = min_chain_partition(&d);
        (d, partition, sink)
    }

    #[test]
    fn chains_partition_every_dvg_node_exactly_once() {
        let (d, partition, _sink) = run_pipeline(&[(0, 2), (1, 2)], &[2], 3);
        let mut seen: Vec<NodeId> = partition.chains.iter().flat_map(|c| c.nodes.clone()).collect();
        seen.sort_by_key(|n| n.index());
        let mut expected: Vec<NodeId> = d.nodes.iter().copied().collect();
        expected.sort_by_key(|n| n.index());
        assert_eq!(seen, expected);
    }

    #[test]
    fn two_independent_loads_form_an_antichain_of_size_two() {
        // a = load; b = load; c = add a,b — a and b are incomparable.
        let (d, partition, sink) = run_pipeline(&[(0, 2), (1, 2)], &[2], 3);
        let antichain = extract_antichain(&d, &partition, sink);
        assert_eq!(antichain.len(), 2);
    }
}
