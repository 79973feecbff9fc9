//! Error handling (spec §7).
//!
//! The pass is analysis-only over a well-formed IR and cannot fail
//! observably: [`RssBug`] enumerates the three assertion conditions that
//! indicate a programmer bug in this crate, not a user error. Variants are
//! never returned as a `Result` — they're only ever the payload of a
//! `panic!`/`debug_assert!`. [`DumpError`] is the one genuinely fallible
//! path: writing a VCG dump file can fail on IO.
//!
//! Two conditions from the original's five-entry error table have no
//! well-formed call site in this crate and are not represented here: a
//! negative bipartite-matching cost (Kuhn's augmenting-path matching,
//! the substitute for the original's Hungarian algorithm, has no cost
//! concept to go negative — see `antichain.rs`) and a bsearch-not-found
//! on a required index (`pk.rs`'s only `binary_search` call treats "not
//! found" as the expected, non-bug outcome). See DESIGN.md.

use thiserror::Error;

use crate::node_id::NodeId;

/// A violated internal invariant, named after spec §7's error table.
#[derive(Debug, Error)]
pub enum RssBug {
    #[error("tuple-mode node {0:?} reached the node-info builder")]
    TupleNodeInNodeInfo(NodeId),

    #[error("DVG-edge insertion observed the reverse edge already present: {from:?} -> {to:?}")]
    DvgReverseEdgePresent { from: NodeId, to: NodeId },

    #[error("mu1 < mu2 in serialization heuristic for node {node:?}: mu1={mu1}, mu2={mu2}")]
    Mu1LessThanMu2 { node: NodeId, mu1: i64, mu2: i64 },
}

/// Failure writing a VCG debug dump (spec §6 dump sinks).
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("failed to write dump file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
