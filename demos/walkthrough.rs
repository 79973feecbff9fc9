// Walkthrough: builds a small toy IR graph, runs register-saturation
// scheduling preparation over it, and prints the resulting dependency
// edges plus a VCG dump of the final disjoint value DAG.

use std::env;

use anyhow::Result;
use rssp::dump::{DebugMask, FileDumpSink};
use rssp::ir::NodeMode;
use rssp::toy_ir::ToyIr;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // a = load; b = load; c = load; result = add (add a,b), c; ret result
    let mut ir = ToyIr::new();
    let block = ir.new_block();
    let a = ir.add_node(block, NodeMode::Normal);
    let b = ir.add_node(block, NodeMode::Normal);
    let c = ir.add_node(block, NodeMode::Normal);
    let result = ir.add_node(block, NodeMode::Normal);
    ir.add_edge(a, result);
    ir.add_edge(b, result);
    ir.add_edge(c, result);
    ir.mark_live_out(result);

    let mut arch = ir.trivial_arch();
    arch.non_ignore.insert(0, 2);

    let dump_dir = env::temp_dir();
    let mut sink = FileDumpSink::new(&dump_dir, "walkthrough");

    println!("edges before: {:?}", ir.all_edges());
    rssp::prepare_schedule(&mut ir, &arch, "walkthrough", Some((&mut sink, DebugMask::ALL)));
    println!("edges after:  {:?}", ir.all_edges());
    println!("VCG dumps written under {}", dump_dir.display());

    Ok(())
}
