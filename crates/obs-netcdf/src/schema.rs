//! Observation-file layout detection.
//!
//! Two generations of files are in circulation. Current files carry explicit
//! `nlocs`, `nobs`, `nrecs` and `nvars` dimensions. Legacy files carry only
//! `nobs` plus an optional channel dimension `nchans`; for those, `nvars` is
//! the channel count (1 if absent) and `nlocs = nobs / nvars`. The presence
//! of `nrecs` is what distinguishes the generations, and the decision is
//! made once at open time and fixed for the session.

use serde::Serialize;

use obs_common::{ObsError, ObsResult};

/// Dimension names of the current layout.
pub const DIM_NLOCS: &str = "nlocs";
pub const DIM_NOBS: &str = "nobs";
pub const DIM_NRECS: &str = "nrecs";
pub const DIM_NVARS: &str = "nvars";
/// Optional channel dimension of the legacy layout.
pub const DIM_NCHANS: &str = "nchans";

/// Which generation of file layout was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchemaLayout {
    /// Explicit `nlocs`/`nobs`/`nrecs`/`nvars` dimensions.
    Current,
    /// `nobs` plus optional `nchans`; other counts are inferred.
    Legacy,
}

/// Dimension summary for one open file.
///
/// `nlocs` here is the raw on-disk location count, before any time-window
/// filtering shrinks the session's effective count.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ObsFileSchema {
    pub layout: SchemaLayout,
    pub nlocs: usize,
    pub nobs: usize,
    pub nrecs: usize,
    pub nvars: usize,
}

impl ObsFileSchema {
    /// Detect the layout of an open file.
    ///
    /// `nrecs` present means the current layout wins and all four explicit
    /// dimensions are then required; any other combination is a schema
    /// error. Without `nrecs`, the legacy inference applies.
    pub fn detect(file: &netcdf::File, dataset: &str) -> ObsResult<Self> {
        let dim_len = |name: &str| file.dimension(name).map(|d| d.len());
        let require = |name: &str| {
            dim_len(name).ok_or_else(|| ObsError::InvalidSchema {
                dataset: dataset.to_string(),
                message: format!("current layout requires dimension '{}'", name),
            })
        };

        if let Some(nrecs) = dim_len(DIM_NRECS) {
            Ok(Self {
                layout: SchemaLayout::Current,
                nlocs: require(DIM_NLOCS)?,
                nobs: require(DIM_NOBS)?,
                nrecs,
                nvars: require(DIM_NVARS)?,
            })
        } else {
            let nobs = dim_len(DIM_NOBS).ok_or_else(|| ObsError::InvalidSchema {
                dataset: dataset.to_string(),
                message: format!("legacy layout requires dimension '{}'", DIM_NOBS),
            })?;
            // No channel dimension means a single variable
            let nvars = dim_len(DIM_NCHANS).unwrap_or(1);
            if nvars == 0 {
                return Err(ObsError::InvalidSchema {
                    dataset: dataset.to_string(),
                    message: format!("channel dimension '{}' is empty", DIM_NCHANS),
                });
            }
            if nobs % nvars != 0 {
                return Err(ObsError::InvalidSchema {
                    dataset: dataset.to_string(),
                    message: format!(
                        "'{}' length {} is not divisible by {} channels",
                        DIM_NOBS, nobs, nvars
                    ),
                });
            }
            let nlocs = nobs / nvars;
            Ok(Self {
                layout: SchemaLayout::Legacy,
                nlocs,
                nobs,
                nrecs: nlocs,
                nvars,
            })
        }
    }

    /// Name of the dimension that counts locations in this layout.
    ///
    /// Legacy files never define `nlocs`; their per-location variables are
    /// dimensioned by `nobs`.
    pub fn location_dim(&self) -> &'static str {
        match self.layout {
            SchemaLayout::Current => DIM_NLOCS,
            SchemaLayout::Legacy => DIM_NOBS,
        }
    }
}

/// A valid observation variable discovered in a file: the bare name plus the
/// `@`-qualifier group (empty when unqualified).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarEntry {
    pub name: String,
    pub group: String,
}

impl VarEntry {
    /// The on-disk dataset name, `name@group` or just `name`.
    pub fn db_name(&self) -> String {
        if self.group.is_empty() {
            self.name.clone()
        } else {
            format!("{}@{}", self.name, self.group)
        }
    }
}

/// Split a raw dataset name on its `@` qualifier.
pub fn split_qualified(raw: &str) -> (String, String) {
    match raw.split_once('@') {
        Some((name, group)) => (name.to_string(), group.to_string()),
        None => (raw.to_string(), String::new()),
    }
}
