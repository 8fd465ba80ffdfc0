//! NetCDF backend for observation files.
//!
//! Handles both generations of the observation file layout, reconstructs
//! per-observation timestamps from the `date_time` reference attribute plus
//! fractional-hour offsets, filters locations to the analysis window, and
//! serves typed per-location reads restricted to the round-robin owned
//! subset.

pub mod io;
pub mod schema;

pub use io::{FileDimensions, FileMode, NetcdfIo, ATTR_DATE_TIME};
pub use schema::{split_qualified, ObsFileSchema, SchemaLayout, VarEntry};
