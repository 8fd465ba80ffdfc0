//! Backend selection keyed on the file extension.

use std::path::Path;

use obs_common::{ObsError, ObsResult};

/// Which file backend serves a given observation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObsBackend {
    Netcdf,
}

impl ObsBackend {
    /// Pick the backend from the path's extension.
    pub fn from_path(path: &Path) -> ObsResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("nc") | Some("nc4") => Ok(ObsBackend::Netcdf),
            Some(other) => Err(ObsError::UnrecognizedFormat(format!(
                "extension '.{}' in '{}'",
                other,
                path.display()
            ))),
            None => Err(ObsError::UnrecognizedFormat(format!(
                "no extension in '{}'",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netcdf_extensions() {
        assert_eq!(ObsBackend::from_path(Path::new("obs/sondes.nc")).unwrap(), ObsBackend::Netcdf);
        assert_eq!(ObsBackend::from_path(Path::new("amsua_n19.nc4")).unwrap(), ObsBackend::Netcdf);
    }

    #[test]
    fn test_unrecognized_format() {
        assert!(matches!(
            ObsBackend::from_path(Path::new("obs.grib2")),
            Err(ObsError::UnrecognizedFormat(_))
        ));
        assert!(matches!(
            ObsBackend::from_path(Path::new("obsfile")),
            Err(ObsError::UnrecognizedFormat(_))
        ));
    }
}
