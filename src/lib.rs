// Register-Saturation Scheduling Preparation (RSSP)
//
// Computes, for each basic block and register class, a minimal set of extra
// data-dependency edges that keep the maximum concurrently-live value count
// (the register saturation) within a target architecture's register budget,
// without altering the program's observable semantics. Consumes an external
// IR graph through the `IrGraph`/`ArchDescription` traits; owns no IR itself.

pub mod antichain;
pub mod arch;
pub mod arena;
pub mod bipartite;
pub mod driver;
pub mod dump;
pub mod dvg;
pub mod error;
pub mod heights;
pub mod ir;
pub mod killer;
pub mod node_id;
pub mod node_info;
pub mod pk;
pub mod serialize;
pub mod toy_ir;

pub use arch::ArchDescription;
pub use driver::prepare_schedule;
pub use error::{DumpError, RssBug};
pub use ir::{IrGraph, NodeMode};
pub use node_id::{BlockId, NodeId, RegClassId};
