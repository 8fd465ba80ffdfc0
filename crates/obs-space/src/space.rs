//! The per-file observation space.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use obs_common::{CommGroup, ObsError, ObsResult, ReferenceTime, TimeWindow};
use obs_netcdf::{FileDimensions, FileMode, NetcdfIo, ATTR_DATE_TIME};
use obs_store::{Attribute, Mutability, ObsStore, Record, StoreElement};

use crate::backend::ObsBackend;

/// Group assigned to variables with no `@` qualifier.
pub const GROUP_UNDEFINED: &str = "GroupUndefined";

/// One observation file loaded into memory.
///
/// Loading opens the file through the extension-selected backend, pulls
/// every valid variable this process owns into the store, and closes the
/// file; all later access is in-memory. The reference epoch travels along
/// as a store-global attribute so a dump can write it back.
#[derive(Debug)]
pub struct ObsSpace {
    path: PathBuf,
    window: TimeWindow,
    comm: CommGroup,
    nlocs: usize,
    nvars: usize,
    store: ObsStore,
}

impl ObsSpace {
    /// Load an observation file, filtered to `window` and restricted to the
    /// locations `comm` owns.
    pub fn from_file(
        path: impl AsRef<Path>,
        window: TimeWindow,
        comm: CommGroup,
    ) -> ObsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let ObsBackend::Netcdf = ObsBackend::from_path(&path)?;

        let io = NetcdfIo::open_read(&path, &window, &comm)?;
        let nlocs = io.nlocs();
        let nvars = io.nvars();

        let mut store = ObsStore::new();
        if let Some(reference) = io.reference_time() {
            store
                .attrs_mut()
                .create(ATTR_DATE_TIME, Attribute::scalar(reference.0))?;
        }

        for entry in io.var_list() {
            let group = if entry.group.is_empty() {
                debug!(variable = %entry.name, "variable has no group qualifier");
                GROUP_UNDEFINED
            } else {
                entry.group.as_str()
            };
            match io.read_var(&entry.db_name()) {
                Ok(buffer) => {
                    let len = buffer.len();
                    let record = Record::new(group, &entry.name, Mutability::ReadOnly, len, buffer)?;
                    match store.insert(record) {
                        Ok(()) => {}
                        // A file that stores its own date dataset next to a
                        // time variable yields the same key twice; the first
                        // record wins
                        Err(ObsError::DuplicateKey { .. }) => {
                            warn!(variable = %entry.db_name(), "skipping duplicate variable entry");
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(ObsError::UnsupportedType { name, message }) => {
                    warn!(variable = %name, %message, "skipping variable with unsupported element type");
                }
                Err(ObsError::NotFound(what)) => {
                    warn!(variable = %entry.db_name(), %what, "skipping variable with no readable data");
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            path = %path.display(),
            nlocs,
            nvars,
            nrecords = store.nrecords(),
            "loaded observation file"
        );
        Ok(Self {
            path,
            window,
            comm,
            nlocs,
            nvars,
            store,
        })
    }

    /// Write every stored variable to a new file at `path`, overwriting any
    /// existing file.
    ///
    /// Records go out in variable order under their `variable@group` dataset
    /// names; the reference epoch attribute is written back when present.
    /// String and timestamp records have no on-disk form and are skipped
    /// with a warning. Any other backend failure aborts the dump.
    pub fn dump(&self, path: impl AsRef<Path>) -> ObsResult<()> {
        let path = path.as_ref();
        let dims = FileDimensions {
            nlocs: self.nlocs,
            nobs: self.nlocs * self.nvars,
            nrecs: self.nlocs,
            nvars: self.nvars,
        };
        let mut io = NetcdfIo::create(path, FileMode::Overwrite, &dims)?;

        if self.store.attrs().exists(ATTR_DATE_TIME) {
            let encoded = self.store.attrs().open(ATTR_DATE_TIME)?.read_values::<i32>()?[0];
            io.write_reference_time(ReferenceTime(encoded))?;
        }

        for record in self.store.records() {
            match io.write_var(&record.qualified_name(), record.data()) {
                Ok(()) => {}
                Err(ObsError::UnsupportedType { name, message }) => {
                    warn!(variable = %name, %message, "skipping record with no on-disk representation");
                }
                Err(e) => return Err(e),
            }
        }

        info!(path = %path.display(), nrecords = self.store.nrecords(), "dumped observation space");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn comm(&self) -> &CommGroup {
        &self.comm
    }

    /// Locations this process holds after window filtering.
    pub fn nlocs(&self) -> usize {
        self.nlocs
    }

    pub fn nvars(&self) -> usize {
        self.nvars
    }

    pub fn nrecords(&self) -> usize {
        self.store.nrecords()
    }

    pub fn has(&self, group: &str, variable: &str) -> bool {
        self.store.has(group, variable)
    }

    /// Read a whole stored variable, type-checked.
    pub fn get<T: StoreElement>(&self, group: &str, variable: &str) -> ObsResult<Vec<T>> {
        self.store.get(group, variable)
    }

    /// Store a derived variable, or overwrite one previously stored this way.
    pub fn put<T: StoreElement>(
        &mut self,
        group: &str,
        variable: &str,
        values: &[T],
    ) -> ObsResult<()> {
        self.store.put(group, variable, values)
    }

    pub fn store(&self) -> &ObsStore {
        &self.store
    }
}

impl fmt::Display for ObsSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ObsSpace '{}': {} locations, {} variables",
            self.path.display(),
            self.nlocs,
            self.nvars
        )?;
        write!(f, "{}", self.store)
    }
}
