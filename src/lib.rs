pub mod chunk_filler;
pub mod coordinator;
pub mod error;
pub mod gate;
pub mod parallelism_config;
pub mod partitioner;
pub mod recurrence;
pub mod sequence_cache;

pub use coordinator::{FillCoordinator, FillOutcome, FillRequest, FillStats};
pub use error::*;
pub use parallelism_config::ParallelismConfig;
pub use recurrence::{Fibonacci, FnRecurrence, Lucas, Recurrence, Window};
pub use sequence_cache::SequenceCache;
