//! Component A — Node-Info Builder (spec §4.1).

use crate::arch::ArchDescription;
use crate::arena::BlockArena;
use crate::error::RssBug;
use crate::ir::{IrGraph, NodeMode};
use crate::node_id::{BlockId, NodeId};

/// Build `consumers`/`descendants`/`live_out` for `node`, recursing into
/// any successor that hasn't been handled yet so descendant sets are fully
/// transitive. Idempotent: a node with `handled = true` is skipped.
pub fn build<G: IrGraph, A: ArchDescription>(
    ir: &G,
    arch: &A,
    block: BlockId,
    node: NodeId,
    arena: &mut BlockArena,
) {
    if arena.get(node).map(|n| n.handled).unwrap_or(false) {
        return;
    }
    if ir.mode(node) == NodeMode::Tuple {
        panic!("{}", RssBug::TupleNodeInNodeInfo(node));
    }

    let mut consumers = Vec::new();
    let mut descendants = Vec::new();
    let mut live_out = false;
    let sink = ir.sink();

    for s in ir.successors(node) {
        if arch.is_ignore(s) {
            continue;
        }
        let in_block = ir.block_of(s) == block;
        let mode = ir.mode(s);
        if in_block && mode != NodeMode::Control {
            if mode == NodeMode::Tuple {
                for proj in ir.projs_of(s) {
                    if arch.is_ignore(proj) {
                        continue;
                    }
                    build(ir, arch, block, proj, arena);
                    consumers.push(proj);
                    descendants.push(proj);
                    if let Some(rec) = arena.get(proj) {
                        descendants.extend(rec.descendants.iter().copied());
                    }
                }
            } else {
                build(ir, arch, block, s, arena);
                consumers.push(s);
                descendants.push(s);
                if let Some(rec) = arena.get(s) {
                    descendants.extend(rec.descendants.iter().copied());
                }
            }
        } else {
            live_out = true;
            consumers.push(sink);
            descendants.push(sink);
        }
    }

    consumers.sort_by_key(|n| n.index());
    consumers.dedup();
    descendants.sort_by_key(|n| n.index());
    descendants.dedup();

    let rec = arena.entry(node);
    rec.consumers = consumers;
    rec.descendants = descendants;
    rec.live_out = live_out;
    rec.handled = true;
}

/// Run the builder over every candidate in `nodes`.
pub fn build_all<G: IrGraph, A: ArchDescription>(
    ir: &G,
    arch: &A,
    block: BlockId,
    nodes: &[NodeId],
    arena: &mut BlockArena,
) {
    for &n in nodes {
        build(ir, arch, block, n, arena);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toy_ir::ToyIr;

    #[test]
    fn live_out_value_gets_sink_consumer() {
        let mut ir = ToyIr::new();
        let block = ir.new_block();
        let a = ir.add_node(block, NodeMode::Normal);
        ir.mark_live_out(a);

        let arch = ir.trivial_arch();
        let mut arena = BlockArena::new(ir.sink());
        build(&ir, &arch, block, a, &mut arena);

        let rec = arena.get(a).unwrap();
        assert!(rec.live_out);
        assert!(rec.consumers.contains(&ir.sink()));
    }

    #[test]
    fn ignore_node_excluded_from_consumers() {
        let mut ir = ToyIr::new();
        let block = ir.new_block();
        let a = ir.add_node(block, NodeMode::Normal);
        let b = ir.add_node(block, NodeMode::Normal);
        ir.add_edge(a, b);
        let mut arch = ir.trivial_arch();
        arch.ignore.insert(b);

        let mut arena = BlockArena::new(ir.sink());
        build(&ir, &arch, block, a, &mut arena);
        let rec = arena.get(a).unwrap();
        assert!(!rec.consumers.contains(&b));
    }

    #[test]
    fn tuple_producer_consumers_traverse_to_projs() {
        let mut ir = ToyIr::new();
        let block = ir.new_block();
        let a = ir.add_node(block, NodeMode::Normal);
        let tup = ir.add_node(block, NodeMode::Tuple);
        let p0 = ir.add_node(block, NodeMode::Normal);
        let p1 = ir.add_node(block, NodeMode::Normal);
        ir.add_edge(a, tup);
        ir.set_projs(tup, vec![p0, p1]);

        let arch = ir.trivial_arch();
        let mut arena = BlockArena::new(ir.sink());
        build(&ir, &arch, block, a, &mut arena);

        let rec = arena.get(a).unwrap();
        assert!(rec.consumers.contains(&p0));
        assert!(rec.consumers.contains(&p1));
        assert!(!rec.consumers.contains(&tup));
    }
}
