//! User-facing observation space.
//!
//! Ties the pieces together: a backend selected by file extension loads one
//! observation file into the in-memory store, filtered to the analysis
//! window and partitioned across the process group; [`ObsSpace`] then serves
//! typed reads and derived-variable writes, and can dump the whole store
//! back out to a new file.

pub mod backend;
pub mod space;

pub use backend::ObsBackend;
pub use space::{ObsSpace, GROUP_UNDEFINED};
