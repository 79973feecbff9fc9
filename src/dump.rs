//! VCG debug dump sinks (spec §6 "Debug dumps").
//!
//! Mirrors the five `debug_vcg_dump_*` kinds: the connected-bipartite-
//! component graph, the killing function, the potential-killing DAG, the
//! disjoint value DAG, and the DVG's own potential-killer graph. Each sink
//! writes one `.vcg` file per (irg, class, block) triple; nothing here is on
//! the hot path, so failures are surfaced as a typed [`crate::error::DumpError`]
//! rather than swallowed.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::arena::BlockArena;
use crate::bipartite::CbcComponent;
use crate::dvg::Dvg;
use crate::error::DumpError;
use crate::node_id::{BlockId, NodeId, RegClassId};

/// Which VCG dumps to emit, bitset-style (spec's `DEBUG_*` mask family).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMask(u8);

impl DebugMask {
    pub const NONE: DebugMask = DebugMask(0);
    pub const CBC: DebugMask = DebugMask(1 << 0);
    pub const KILL: DebugMask = DebugMask(1 << 1);
    pub const PKG: DebugMask = DebugMask(1 << 2);
    pub const DVG: DebugMask = DebugMask(1 << 3);
    pub const DVG_PKG: DebugMask = DebugMask(1 << 4);
    pub const ALL: DebugMask = DebugMask(0b11111);

    pub fn contains(self, other: DebugMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for DebugMask {
    type Output = DebugMask;
    fn bitor(self, rhs: DebugMask) -> DebugMask {
        DebugMask(self.0 | rhs.0)
    }
}

/// A VCG dump destination. Implementations decide where the text lands;
/// the file-based one below is what `driver` uses outside of tests.
pub trait DumpSink {
    fn write_graph(&mut self, name: &str, body: &str) -> Result<(), DumpError>;
}

/// Writes each dump to `<dir>/<irg>-<class>-block-<n>-RSS-<KIND>.vcg`.
pub struct FileDumpSink {
    dir: PathBuf,
    irg: String,
}

impl FileDumpSink {
    pub fn new(dir: impl Into<PathBuf>, irg: impl Into<String>) -> Self {
        FileDumpSink { dir: dir.into(), irg: irg.into() }
    }

    fn file_name(&self, class: RegClassId, block: BlockId, kind: &str) -> PathBuf {
        self.dir.join(format!(
            "{}-{}-block-{}-RSS-{}.vcg",
            self.irg, class, block, kind
        ))
    }
}

impl DumpSink for FileDumpSink {
    fn write_graph(&mut self, name: &str, body: &str) -> Result<(), DumpError> {
        let path = self.dir.join(name);
        fs::write(&path, body).map_err(|source| DumpError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

fn vcg_header(out: &mut String, title: &str) {
    writeln!(out, "graph: {{ title: \"{}\"", title).ok();
    out.push_str("display_edge_labels: no\n");
    out.push_str("layoutalgorithm: mindepth\n");
    out.push_str("manhattan_edges: yes\n\n");
}

fn vcg_node(out: &mut String, node: NodeId, label: &str) {
    writeln!(out, "node: {{ title: \"n{}\" label: \"{}\" }}", node.index(), label).ok();
}

fn vcg_edge(out: &mut String, src: NodeId, tgt: NodeId) {
    writeln!(
        out,
        "edge: {{ sourcename: \"n{}\" targetname: \"n{}\" }}",
        src.index(),
        tgt.index()
    )
    .ok();
}

/// Dump the connected-bipartite-component graph (`*-RSS-CBC.vcg`).
pub fn dump_cbc(irg: &str, components: &[CbcComponent]) -> String {
    let mut out = String::new();
    vcg_header(&mut out, &format!("connected bipartite component graph of {irg}"));
    for c in components {
        writeln!(
            out,
            "graph: {{ title: \"cbc {0}\" label: \"cbc {0}\" status:clustered color:yellow",
            c.nr
        )
        .ok();
        for &n in c.parents.iter().chain(c.children.iter()) {
            writeln!(out, "node: {{ title: \"n{}_{}\" label: \"n{}\" }}", n.index(), c.nr, n.index()).ok();
        }
        for &(src, tgt) in &c.kill_edges {
            writeln!(
                out,
                "edge: {{ sourcename: \"n{}_{}\" targetname: \"n{}_{}\" }}",
                src.index(),
                c.nr,
                tgt.index(),
                c.nr
            )
            .ok();
        }
        out.push_str("}\n\n");
    }
    out.push_str("}\n");
    out
}

/// Dump the computed killing function (`*-RSS-KILL.vcg`): one edge per node
/// to its selected killer.
pub fn dump_kill(irg: &str, block: BlockId, arena: &BlockArena, nodes: &[NodeId]) -> String {
    let mut out = String::new();
    vcg_header(&mut out, &format!("computed kill graph of {irg}, block {block}"));
    for &n in nodes {
        vcg_node(&mut out, n, &format!("n{}", n.index()));
        if let Some(rec) = arena.get(n) {
            vcg_node(&mut out, rec.killer, &format!("n{}", rec.killer.index()));
            vcg_edge(&mut out, n, rec.killer);
        }
    }
    out.push_str("}\n");
    out
}

/// Dump the potential-killing DAG (`*-RSS-PKG.vcg`): every `u -> pkiller(u)`
/// edge for every node in the block.
pub fn dump_pkg(irg: &str, block: BlockId, arena: &BlockArena, nodes: &[NodeId]) -> String {
    let mut out = String::new();
    vcg_header(&mut out, &format!("potential killing DAG of {irg}, block {block}"));
    for &n in nodes {
        vcg_node(&mut out, n, &format!("n{}", n.index()));
        if let Some(rec) = arena.get(n) {
            for &pk in &rec.pkillers {
                vcg_node(&mut out, pk, &format!("n{}", pk.index()));
                vcg_edge(&mut out, n, pk);
            }
        }
    }
    out.push_str("}\n");
    out
}

/// Dump the disjoint value DAG (`*-RSS-DVG.vcg`).
pub fn dump_dvg(irg: &str, block: BlockId, dvg: &Dvg) -> String {
    let mut out = String::new();
    vcg_header(&mut out, &format!("disjoint value DAG of {irg}, block {block}"));
    for &n in &dvg.nodes {
        vcg_node(&mut out, n, &format!("n{}", n.index()));
    }
    for &(src, tgt) in &dvg.edges {
        vcg_edge(&mut out, src, tgt);
    }
    out.push_str("}\n");
    out
}

/// Dump the DVG's own potential-killer graph (`*-RSS-DVG-PKG.vcg`): the
/// result of `build_dvg_pkillers` against the current DVG.
pub fn dump_dvg_pkg(irg: &str, block: BlockId, dvg: &Dvg, pkillers: &[(NodeId, Vec<NodeId>)]) -> String {
    let mut out = String::new();
    vcg_header(&mut out, &format!("PKG of disjoint value DAG of {irg}, block {block}"));
    for &n in &dvg.nodes {
        vcg_node(&mut out, n, &format!("n{}", n.index()));
    }
    for (n, pk) in pkillers {
        for v in pk {
            vcg_node(&mut out, *v, &format!("n{}", v.index()));
            vcg_edge(&mut out, *n, *v);
        }
    }
    out.push_str("}\n");
    out
}

/// Emit whichever dumps `mask` selects for one (block, class) pass, via
/// `sink`. Called from `driver` when instrumentation is enabled; a no-op
/// cost otherwise since callers gate on `mask != DebugMask::NONE` first.
pub fn emit(
    sink: &mut dyn DumpSink,
    mask: DebugMask,
    irg: &str,
    class: RegClassId,
    block: BlockId,
    arena: &BlockArena,
    nodes: &[NodeId],
    components: &[CbcComponent],
    dvg: &Dvg,
    dvg_pkillers: &[(NodeId, Vec<NodeId>)],
) -> Result<(), DumpError> {
    if mask.contains(DebugMask::CBC) {
        let name = format!("{irg}-{class}-block-{block}-RSS-CBC.vcg");
        sink.write_graph(&name, &dump_cbc(irg, components))?;
    }
    if mask.contains(DebugMask::KILL) {
        let name = format!("{irg}-{class}-block-{block}-RSS-KILL.vcg");
        sink.write_graph(&name, &dump_kill(irg, block, arena, nodes))?;
    }
    if mask.contains(DebugMask::PKG) {
        let name = format!("{irg}-{class}-block-{block}-RSS-PKG.vcg");
        sink.write_graph(&name, &dump_pkg(irg, block, arena, nodes))?;
    }
    if mask.contains(DebugMask::DVG) {
        let name = format!("{irg}-{class}-block-{block}-RSS-DVG.vcg");
        sink.write_graph(&name, &dump_dvg(irg, block, dvg))?;
    }
    if mask.contains(DebugMask::DVG_PKG) {
        let name = format!("{irg}-{class}-block-{block}-RSS-DVG-PKG.vcg");
        sink.write_graph(&name, &dump_dvg_pkg(irg, block, dvg, dvg_pkillers))?;
    }
    Ok(())
}
