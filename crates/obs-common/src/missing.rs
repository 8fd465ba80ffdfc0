//! Canonical missing-value sentinels for observation data.

/// Canonical missing value for 32-bit floats.
pub const MISSING_FLOAT: f32 = -3.368_795_6e38;

/// Canonical missing value for 32-bit integers.
pub const MISSING_INT32: i32 = i32::MIN;

/// Magnitude threshold above which a float read from a file is treated as
/// missing and replaced by [`MISSING_FLOAT`].
///
/// This is a heuristic inherited from the upstream observation files, not a
/// bitwise missing-value marker: a legitimate value of that magnitude would
/// be clobbered. Kept at exactly 1.0e8 for compatibility.
pub const MISSING_THRESHOLD: f32 = 1.0e8;

/// True if a float read from a file should be treated as missing.
pub fn is_missing_float(value: f32) -> bool {
    value.abs() > MISSING_THRESHOLD
}
