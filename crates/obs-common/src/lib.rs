//! Shared primitives for the obs-access workspace.
//!
//! Provides the pieces every other crate needs:
//! - Error taxonomy ([`ObsError`], [`ObsResult`])
//! - Process-group handle ([`CommGroup`])
//! - Analysis window and reference-epoch time handling
//! - Canonical missing-value sentinels

pub mod comm;
pub mod error;
pub mod missing;
pub mod time;

pub use comm::CommGroup;
pub use error::{ObsError, ObsResult};
pub use missing::{MISSING_FLOAT, MISSING_INT32, MISSING_THRESHOLD};
pub use time::{date_encode, time_encode, ReferenceTime, TimeWindow};
