//! Generators for synthetic observation NetCDF files.
//!
//! Builds small, predictable files in both dimension layouts so the backend
//! tests do not depend on external data downloads.

use std::path::Path;

/// Per-location payload for one generated variable.
#[derive(Debug, Clone)]
pub enum VarData {
    Int32(Vec<i32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl VarData {
    fn len(&self) -> usize {
        match self {
            VarData::Int32(v) => v.len(),
            VarData::Float32(v) => v.len(),
            VarData::Float64(v) => v.len(),
        }
    }
}

/// Builder for a synthetic observation file.
///
/// Current-layout files define all four explicit dimensions; legacy files
/// define only `nobs` plus an optional `nchans`. Every added variable is
/// rank-1 over the location dimension of the chosen layout.
///
/// # Example
///
/// ```ignore
/// ObsFileBuilder::current(4, 4, 4, 1)
///     .date_time(2018041500)
///     .float_var("time", &[-0.5, -0.25, 0.0, 0.25])
///     .float_var("air_temperature@ObsValue", &[251.5, 252.0, 253.25, 254.0])
///     .write(&path)
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObsFileBuilder {
    dims: Vec<(String, usize)>,
    loc_dim: String,
    date_time: Option<i32>,
    vars: Vec<(String, VarData)>,
}

impl ObsFileBuilder {
    /// A current-layout file with explicit `nlocs`/`nobs`/`nrecs`/`nvars`.
    pub fn current(nlocs: usize, nobs: usize, nrecs: usize, nvars: usize) -> Self {
        Self {
            dims: vec![
                ("nlocs".to_string(), nlocs),
                ("nobs".to_string(), nobs),
                ("nrecs".to_string(), nrecs),
                ("nvars".to_string(), nvars),
            ],
            loc_dim: "nlocs".to_string(),
            ..Default::default()
        }
    }

    /// A legacy-layout file with `nobs` and an optional channel dimension.
    pub fn legacy(nobs: usize, nchans: Option<usize>) -> Self {
        let mut dims = vec![("nobs".to_string(), nobs)];
        if let Some(nchans) = nchans {
            dims.push(("nchans".to_string(), nchans));
        }
        Self {
            dims,
            loc_dim: "nobs".to_string(),
            ..Default::default()
        }
    }

    /// Set the `date_time` global attribute (integer `YYYYMMDDHH`).
    pub fn date_time(mut self, encoded: i32) -> Self {
        self.date_time = Some(encoded);
        self
    }

    /// Add an extra dimension (for building rank-2 variables that the
    /// backend must skip).
    pub fn dimension(mut self, name: &str, len: usize) -> Self {
        self.dims.push((name.to_string(), len));
        self
    }

    pub fn int_var(mut self, name: &str, values: &[i32]) -> Self {
        self.vars.push((name.to_string(), VarData::Int32(values.to_vec())));
        self
    }

    pub fn float_var(mut self, name: &str, values: &[f32]) -> Self {
        self.vars.push((name.to_string(), VarData::Float32(values.to_vec())));
        self
    }

    pub fn double_var(mut self, name: &str, values: &[f64]) -> Self {
        self.vars.push((name.to_string(), VarData::Float64(values.to_vec())));
        self
    }

    /// Write the file, overwriting any existing one at `path`.
    pub fn write(&self, path: &Path) -> Result<(), netcdf::Error> {
        let mut file = netcdf::create(path)?;
        for (name, len) in &self.dims {
            file.add_dimension(name, *len)?;
        }
        if let Some(encoded) = self.date_time {
            file.add_attribute("date_time", encoded)?;
        }
        for (name, data) in &self.vars {
            self.write_var(&mut file, name, data)?;
        }
        Ok(())
    }

    fn write_var(
        &self,
        file: &mut netcdf::FileMut,
        name: &str,
        data: &VarData,
    ) -> Result<(), netcdf::Error> {
        let loc_len = self
            .dims
            .iter()
            .find(|(dim, _)| dim == &self.loc_dim)
            .map(|(_, len)| *len)
            .unwrap_or(0);
        assert_eq!(
            data.len(),
            loc_len,
            "variable '{}' must cover the {} dimension",
            name,
            self.loc_dim
        );

        let loc_dim = self.loc_dim.as_str();
        match data {
            VarData::Int32(values) => {
                let mut var = file.add_variable::<i32>(name, &[loc_dim])?;
                var.put_values(values, ..)?;
            }
            VarData::Float32(values) => {
                let mut var = file.add_variable::<f32>(name, &[loc_dim])?;
                var.put_values(values, ..)?;
            }
            VarData::Float64(values) => {
                let mut var = file.add_variable::<f64>(name, &[loc_dim])?;
                var.put_values(values, ..)?;
            }
        }
        Ok(())
    }
}

/// Evenly spaced fractional-hour offsets starting at `start`.
pub fn hour_offsets(count: usize, start: f32, step: f32) -> Vec<f32> {
    (0..count).map(|i| start + step * i as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_offsets() {
        let offsets = hour_offsets(4, -1.5, 0.5);
        assert_eq!(offsets, vec![-1.5, -1.0, -0.5, 0.0]);
    }

    #[test]
    fn test_builder_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.nc");

        ObsFileBuilder::current(3, 3, 3, 1)
            .date_time(2018041500)
            .float_var("time", &[-0.5, 0.0, 0.5])
            .int_var("scan_position@MetaData", &[1, 2, 3])
            .write(&path)
            .unwrap();

        let file = netcdf::open(&path).unwrap();
        assert_eq!(file.dimension("nlocs").unwrap().len(), 3);
        assert_eq!(file.dimension("nrecs").unwrap().len(), 3);
        let values: Vec<i32> = file
            .variable("scan_position@MetaData")
            .unwrap()
            .get_values(..)
            .unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }
}
