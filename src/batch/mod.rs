//! Batch infrastructure for the designer URL sweep: chunk splitting, the
//! parallel process runner, and the per-chunk worker.

pub mod parallel;
pub mod splitter;
pub mod worker;

pub use parallel::{run_batch, WorkerOutcome};
pub use splitter::{split_links, ChunkInfo, ChunkManifest};
pub use worker::run_chunk;
