//! Two-phase multiway merge sort (TPMMS).
//!
//! - `run`: phase 1 run generation and per-run read state.
//! - `merge`: phase 2 k-way merge.
//! - `external`: the threaded engine tying both phases to a pair of pipes.

pub mod external;
pub mod merge;
pub mod run;

pub use external::ExternalSort;
pub use merge::MultiwayMerger;
pub use run::{Run, RunGenerator, RunMeta, RunSet, RunState, SortStats};
