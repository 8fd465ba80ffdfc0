//! NetCDF adapter: open/create, typed variable I/O, timestamp
//! reconstruction and time-window filtering.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use netcdf::types::{FloatType, IntType, NcVariableType};
use tracing::{debug, error, trace};

use obs_common::missing::{is_missing_float, MISSING_FLOAT};
use obs_common::{date_encode, time_encode, CommGroup, ObsError, ObsResult, ReferenceTime, TimeWindow};
use obs_distribution::RoundRobin;
use obs_store::ValueBuffer;

use crate::schema::{split_qualified, ObsFileSchema, SchemaLayout, VarEntry, DIM_NLOCS, DIM_NOBS, DIM_NRECS, DIM_NVARS};

/// Global attribute holding the reference epoch as integer `YYYYMMDDHH`.
pub const ATTR_DATE_TIME: &str = "date_time";

/// Conventional names for the hour-offset variable, in precedence order.
const TIME_VAR_NAMES: [&str; 2] = ["time", "time@MetaData"];

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Open an existing file read-only.
    Read,
    /// Create a new file; fail if the path already exists.
    Write,
    /// Create a new file, overwriting any existing one.
    Overwrite,
}

impl FileMode {
    /// Parse the conventional single-letter mode strings.
    pub fn parse(mode: &str) -> ObsResult<Self> {
        match mode {
            "r" => Ok(FileMode::Read),
            "w" => Ok(FileMode::Write),
            "W" => Ok(FileMode::Overwrite),
            other => Err(ObsError::UnrecognizedMode(other.to_string())),
        }
    }
}

/// Caller-supplied sizes for the dimensions of a file created for writing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDimensions {
    pub nlocs: usize,
    pub nobs: usize,
    pub nrecs: usize,
    pub nvars: usize,
}

#[derive(Debug)]
enum NcHandle {
    Read(netcdf::File),
    Write(netcdf::FileMut),
}

/// One open observation file.
///
/// A read session detects the file layout, discovers the valid observation
/// variables, builds the round-robin distribution over the raw location
/// count, reconstructs per-observation timestamps from the reference epoch,
/// and erases locations outside the analysis window. A write session
/// defines the four explicit dimensions and accepts typed variable writes
/// sized to the full location dimension.
#[derive(Debug)]
pub struct NetcdfIo {
    path: PathBuf,
    mode: FileMode,
    handle: NcHandle,
    schema: ObsFileSchema,
    var_list: Vec<VarEntry>,
    dist: Option<RoundRobin>,
    reference: Option<ReferenceTime>,
    /// `YYYYMMDD` per surviving owned location.
    date_cache: Vec<i32>,
    /// `HHMMSS` per surviving owned location.
    time_cache: Vec<i32>,
    /// Effective location count for this session (post-filter for reads,
    /// declared for writes).
    nlocs: usize,
}

impl NetcdfIo {
    /// Open an existing file read-only and prepare the session.
    pub fn open_read(path: impl AsRef<Path>, window: &TimeWindow, comm: &CommGroup) -> ObsResult<Self> {
        let path = path.as_ref().to_path_buf();
        trace!(path = %path.display(), mode = "r", "opening observation file");

        let file = netcdf::open(&path).map_err(|e| nc_err("open", &path, e))?;
        let schema = ObsFileSchema::detect(&file, &path.display().to_string())?;
        debug!(
            path = %path.display(),
            layout = ?schema.layout,
            nlocs = schema.nlocs,
            nobs = schema.nobs,
            nrecs = schema.nrecs,
            nvars = schema.nvars,
            "detected file schema"
        );

        let var_list = discover_variables(&file, &schema);
        let mut dist = RoundRobin::new(comm, schema.nlocs);

        // Reconstruct timestamps and filter out locations outside the
        // window. A file without a reference epoch is left unfiltered.
        let mut date_cache = Vec::new();
        let mut time_cache = Vec::new();
        let reference = read_reference_time(&file)?;
        match reference {
            Some(reference) => {
                let datetimes = reconstruct_datetimes(&file, &path, reference)?;
                if datetimes.len() < schema.nlocs {
                    return Err(ObsError::InvalidSchema {
                        dataset: path.display().to_string(),
                        message: format!(
                            "time variable holds {} offsets for {} locations",
                            datetimes.len(),
                            schema.nlocs
                        ),
                    });
                }
                let mut removed = Vec::new();
                for &index in dist.index() {
                    let t = &datetimes[index];
                    if window.contains(t) {
                        date_cache.push(date_encode(t));
                        time_cache.push(time_encode(t));
                    } else {
                        removed.push(index);
                    }
                }
                for index in removed {
                    dist.erase(index);
                }
                debug_assert_eq!(date_cache.len(), dist.size());
            }
            None => {
                debug!(path = %path.display(), "reference date_time attribute not found, skipping window filter");
            }
        }

        let nlocs = dist.size();
        Ok(Self {
            path,
            mode: FileMode::Read,
            handle: NcHandle::Read(file),
            schema,
            var_list,
            dist: Some(dist),
            reference,
            date_cache,
            time_cache,
            nlocs,
        })
    }

    /// Create a file for writing and define its dimensions.
    ///
    /// `mode` must be one of the two write modes: `Write` refuses an
    /// existing path, `Overwrite` truncates it.
    pub fn create(path: impl AsRef<Path>, mode: FileMode, dims: &FileDimensions) -> ObsResult<Self> {
        let path = path.as_ref().to_path_buf();
        trace!(path = %path.display(), mode = ?mode, "creating observation file");

        match mode {
            FileMode::Read => {
                return Err(ObsError::UnrecognizedMode(
                    "r (create requires a write mode)".to_string(),
                ))
            }
            FileMode::Write => {
                if path.exists() {
                    return Err(nc_msg("create", &path, "file exists and mode 'w' disallows overwrite"));
                }
            }
            FileMode::Overwrite => {}
        }

        let mut file = netcdf::create(&path).map_err(|e| nc_err("create", &path, e))?;
        for (name, len) in [
            (DIM_NLOCS, dims.nlocs),
            (DIM_NOBS, dims.nobs),
            (DIM_NRECS, dims.nrecs),
            (DIM_NVARS, dims.nvars),
        ] {
            file.add_dimension(name, len)
                .map_err(|e| nc_err("add_dimension", &path, e))?;
        }

        let schema = ObsFileSchema {
            layout: SchemaLayout::Current,
            nlocs: dims.nlocs,
            nobs: dims.nobs,
            nrecs: dims.nrecs,
            nvars: dims.nvars,
        };
        Ok(Self {
            path,
            mode,
            handle: NcHandle::Write(file),
            schema,
            var_list: Vec::new(),
            dist: None,
            reference: None,
            date_cache: Vec::new(),
            time_cache: Vec::new(),
            nlocs: dims.nlocs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn schema(&self) -> &ObsFileSchema {
        &self.schema
    }

    /// Effective location count for this session.
    pub fn nlocs(&self) -> usize {
        self.nlocs
    }

    pub fn nvars(&self) -> usize {
        self.schema.nvars
    }

    /// Valid observation variables discovered at open time (read sessions).
    pub fn var_list(&self) -> &[VarEntry] {
        &self.var_list
    }

    /// The location distribution (read sessions only).
    pub fn dist(&self) -> Option<&RoundRobin> {
        self.dist.as_ref()
    }

    /// Reference epoch from the `date_time` attribute, if the file had one.
    pub fn reference_time(&self) -> Option<ReferenceTime> {
        self.reference
    }

    /// Read one variable, restricted to the locations this process owns.
    ///
    /// `date…`/`time…` names are served from the timestamp caches built at
    /// open time. Everything else dispatches on the on-disk element type:
    /// 32-bit ints are read directly, 64-bit floats are narrowed to 32-bit,
    /// and float magnitudes above the missing threshold are replaced by the
    /// canonical missing value.
    pub fn read_var(&self, db_name: &str) -> ObsResult<ValueBuffer> {
        trace!(path = %self.path.display(), variable = db_name, "reading variable");

        // Timestamps were reconstructed at open time
        if db_name.starts_with("date") {
            return self.cached_ints(&self.date_cache);
        }
        if db_name.starts_with("time") {
            return self.cached_ints(&self.time_cache);
        }

        let file = self.read_handle()?;
        let var = file
            .variable(db_name)
            .ok_or_else(|| ObsError::NotFound(format!("dataset '{}' in '{}'", db_name, self.path.display())))?;

        match var.vartype() {
            NcVariableType::Int(IntType::I32) => {
                let raw: Vec<i32> = var
                    .get_values(..)
                    .map_err(|e| nc_err("read", &self.path, e))?;
                Ok(ValueBuffer::Int32(self.subset_owned(&raw)))
            }
            NcVariableType::Float(FloatType::F32) => {
                let raw: Vec<f32> = var
                    .get_values(..)
                    .map_err(|e| nc_err("read", &self.path, e))?;
                Ok(ValueBuffer::Float32(substitute_missing(self.subset_owned(&raw))))
            }
            NcVariableType::Float(FloatType::F64) => {
                // Narrow to the uniform in-memory representation
                let raw: Vec<f64> = var
                    .get_values(..)
                    .map_err(|e| nc_err("read", &self.path, e))?;
                let narrowed: Vec<f32> = self.subset_owned(&raw).into_iter().map(|v| v as f32).collect();
                Ok(ValueBuffer::Float32(substitute_missing(narrowed)))
            }
            other => Err(ObsError::UnsupportedType {
                name: db_name.to_string(),
                message: format!("on-disk type {:?}", other),
            }),
        }
    }

    /// Write one variable sized to the full location dimension, creating a
    /// matching-typed dataset on first write.
    ///
    /// Only int32 and float32 payloads have an on-disk representation;
    /// string and timestamp buffers are refused with `UnsupportedType`.
    pub fn write_var(&mut self, db_name: &str, buffer: &ValueBuffer) -> ObsResult<()> {
        trace!(path = %self.path.display(), variable = db_name, "writing variable");
        match buffer {
            ValueBuffer::Int32(values) => self.write_typed::<i32>(db_name, values),
            ValueBuffer::Float32(values) => self.write_typed::<f32>(db_name, values),
            other => Err(ObsError::UnsupportedType {
                name: db_name.to_string(),
                message: format!("{} buffers have no on-disk representation", other.element_type()),
            }),
        }
    }

    /// Write the reference epoch as the `date_time` global attribute.
    pub fn write_reference_time(&mut self, reference: ReferenceTime) -> ObsResult<()> {
        let path = self.path.clone();
        let file = self.write_handle()?;
        file.add_attribute(ATTR_DATE_TIME, reference.0)
            .map_err(|e| nc_err("add_attribute", &path, e))?;
        self.reference = Some(reference);
        Ok(())
    }

    fn write_typed<T: netcdf::NcTypeDescriptor + Copy>(&mut self, db_name: &str, values: &[T]) -> ObsResult<()> {
        let path = self.path.clone();
        let file = self.write_handle()?;
        if file.variable(db_name).is_none() {
            file.add_variable::<T>(db_name, &[DIM_NLOCS])
                .map_err(|e| nc_err("create_variable", &path, e))?;
        }
        let mut var = file
            .variable_mut(db_name)
            .ok_or_else(|| ObsError::NotFound(format!("dataset '{}' in '{}'", db_name, path.display())))?;
        var.put_values(values, ..)
            .map_err(|e| nc_err("write", &path, e))?;
        Ok(())
    }

    fn read_handle(&self) -> ObsResult<&netcdf::File> {
        match &self.handle {
            NcHandle::Read(file) => Ok(file),
            NcHandle::Write(_) => Err(nc_msg("read", &self.path, "file opened write-only")),
        }
    }

    fn write_handle(&mut self) -> ObsResult<&mut netcdf::FileMut> {
        match &mut self.handle {
            NcHandle::Write(file) => Ok(file),
            NcHandle::Read(_) => Err(nc_msg("write", &self.path, "file opened read-only")),
        }
    }

    fn cached_ints(&self, cache: &[i32]) -> ObsResult<ValueBuffer> {
        if cache.len() != self.nlocs {
            return Err(ObsError::NotFound(format!(
                "reconstructed timestamps in '{}' (no '{}' attribute)",
                self.path.display(),
                ATTR_DATE_TIME
            )));
        }
        Ok(ValueBuffer::Int32(cache.to_vec()))
    }

    fn subset_owned<T: Copy>(&self, raw: &[T]) -> Vec<T> {
        match &self.dist {
            Some(dist) => dist.index().iter().map(|&i| raw[i]).collect(),
            None => raw.to_vec(),
        }
    }
}

/// Walk the file's variables and collect the valid observation variables: a
/// dataset is valid iff it is rank-1 and its sole dimension is the location
/// dimension. A `time…` prefixed name synthesizes a companion `date` entry
/// in the same group, derived from the same reconstructed timestamps.
fn discover_variables(file: &netcdf::File, schema: &ObsFileSchema) -> Vec<VarEntry> {
    let loc_dim = schema.location_dim();
    let mut entries = Vec::new();
    for var in file.variables() {
        let dims = var.dimensions();
        if dims.len() != 1 || dims[0].name() != loc_dim {
            continue;
        }
        let (name, group) = split_qualified(&var.name());
        if name.starts_with("time") {
            entries.push(VarEntry {
                name: "date".to_string(),
                group: group.clone(),
            });
        }
        entries.push(VarEntry { name, group });
    }
    entries
}

/// Read the `date_time` global attribute, if present.
fn read_reference_time(file: &netcdf::File) -> ObsResult<Option<ReferenceTime>> {
    let attr = match file.attribute(ATTR_DATE_TIME) {
        Some(attr) => attr,
        None => return Ok(None),
    };
    let value = attr
        .value()
        .map_err(|e| ObsError::backend_io("read_attribute", ATTR_DATE_TIME, e))?;
    let encoded = i32::try_from(value)
        .map_err(|e| ObsError::backend_io("read_attribute", ATTR_DATE_TIME, e))?;
    Ok(Some(ReferenceTime(encoded)))
}

/// Reconstruct every raw location's absolute timestamp from the reference
/// epoch plus the hour-offset variable.
fn reconstruct_datetimes(
    file: &netcdf::File,
    path: &Path,
    reference: ReferenceTime,
) -> ObsResult<Vec<DateTime<Utc>>> {
    let time_var = TIME_VAR_NAMES
        .iter()
        .find_map(|name| file.variable(name))
        .ok_or_else(|| {
            error!(path = %path.display(), "unable to find time variable: time OR time@MetaData");
            ObsError::NotFound(format!("time offset variable in '{}'", path.display()))
        })?;

    let offsets: Vec<f32> = time_var
        .get_values(..)
        .map_err(|e| nc_err("read", path, e))?;

    offsets
        .iter()
        .map(|&offset| reference.apply_offset_hours(offset))
        .collect()
}

/// Replace float values whose magnitude exceeds the missing threshold with
/// the canonical missing value. This is the inherited magnitude heuristic,
/// not a bitwise marker; see `obs_common::missing`.
fn substitute_missing(values: Vec<f32>) -> Vec<f32> {
    values
        .into_iter()
        .map(|v| if is_missing_float(v) { MISSING_FLOAT } else { v })
        .collect()
}

fn nc_err(operation: &str, path: &Path, err: netcdf::Error) -> ObsError {
    error!(operation = operation, dataset = %path.display(), error = %err, "backend call failed");
    ObsError::backend_io(operation, path.display().to_string(), err)
}

fn nc_msg(operation: &str, path: &Path, message: &str) -> ObsError {
    error!(operation = operation, dataset = %path.display(), message, "backend call failed");
    ObsError::backend_io(operation, path.display().to_string(), message)
}
