//! The multiply-indexed observation container.

use std::collections::BTreeMap;
use std::fmt;

use obs_common::{ObsError, ObsResult};
use tracing::trace;

use crate::attrs::AttributeSet;
use crate::record::{Mutability, Record};
use crate::value::StoreElement;

/// Primary key, ordered by variable then group.
///
/// The key set is the same as (group, variable), so one map provides both
/// the uniqueness guarantee and the deterministic variable-ordered iteration
/// that dump and print need. A single insertion point keeps the two views
/// consistent by construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct StoreKey {
    variable: String,
    group: String,
}

impl StoreKey {
    fn new(group: &str, variable: &str) -> Self {
        Self {
            variable: variable.to_string(),
            group: group.to_string(),
        }
    }
}

/// In-memory registry of all loaded and derived variables, keyed uniquely
/// by (group, variable).
#[derive(Debug, Default)]
pub struct ObsStore {
    records: BTreeMap<StoreKey, Record>,
    attrs: AttributeSet,
}

impl ObsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record; fails with `DuplicateKey` if its (group, variable)
    /// is already present, leaving the existing record unchanged.
    pub fn insert(&mut self, record: Record) -> ObsResult<()> {
        let key = StoreKey::new(record.group(), record.variable());
        if self.records.contains_key(&key) {
            return Err(ObsError::DuplicateKey {
                group: record.group().to_string(),
                variable: record.variable().to_string(),
            });
        }
        trace!(
            group = record.group(),
            variable = record.variable(),
            len = record.len(),
            "inserting record"
        );
        self.records.insert(key, record);
        Ok(())
    }

    /// Membership test on the primary key.
    pub fn has(&self, group: &str, variable: &str) -> bool {
        self.records.contains_key(&StoreKey::new(group, variable))
    }

    /// Look up a record.
    pub fn find(&self, group: &str, variable: &str) -> ObsResult<&Record> {
        self.records
            .get(&StoreKey::new(group, variable))
            .ok_or_else(|| ObsError::NotFound(format!("{}@{}", variable, group)))
    }

    fn find_mut(&mut self, group: &str, variable: &str) -> ObsResult<&mut Record> {
        self.records
            .get_mut(&StoreKey::new(group, variable))
            .ok_or_else(|| ObsError::NotFound(format!("{}@{}", variable, group)))
    }

    /// Remove a record.
    pub fn remove(&mut self, group: &str, variable: &str) -> ObsResult<Record> {
        self.records
            .remove(&StoreKey::new(group, variable))
            .ok_or_else(|| ObsError::NotFound(format!("{}@{}", variable, group)))
    }

    /// Iterate records ordered by variable name, ties broken by group.
    ///
    /// The order is independent of insertion order, which keeps dump and
    /// print output deterministic.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn nrecords(&self) -> usize {
        self.records.len()
    }

    /// Store-global attributes (e.g. the reference epoch of a backend file).
    pub fn attrs(&self) -> &AttributeSet {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut AttributeSet {
        &mut self.attrs
    }

    /// Store a whole variable, creating a read-write record or overwriting
    /// an existing read-write record in place.
    ///
    /// Overwrites are type- and length-checked; read-only records (data
    /// sourced from a file) are refused.
    pub fn put<T: StoreElement>(
        &mut self,
        group: &str,
        variable: &str,
        values: &[T],
    ) -> ObsResult<()> {
        if !self.has(group, variable) {
            let record = Record::new(
                group,
                variable,
                Mutability::ReadWrite,
                values.len(),
                T::from_vec(values.to_vec()),
            )?;
            return self.insert(record);
        }

        let record = self.find_mut(group, variable)?;
        if record.mutability() == Mutability::ReadOnly {
            return Err(ObsError::ReadOnly(record.qualified_name()));
        }
        if values.len() != record.len() {
            return Err(ObsError::InvalidShape {
                name: record.qualified_name(),
                message: format!(
                    "cannot resize from {} to {} values",
                    record.len(),
                    values.len()
                ),
            });
        }
        let name = record.qualified_name();
        let stored_type = record.element_type();
        let stored = T::as_vec_mut(record.data_mut()).ok_or_else(|| ObsError::TypeMismatch {
            name,
            requested: T::ELEMENT.to_string(),
            stored: stored_type.to_string(),
        })?;
        stored.clear();
        stored.extend_from_slice(values);
        Ok(())
    }

    /// Read a whole variable out, type-checked.
    pub fn get<T: StoreElement>(&self, group: &str, variable: &str) -> ObsResult<Vec<T>> {
        Ok(self.find(group, variable)?.values::<T>()?.to_vec())
    }

    /// Store one contiguous segment of a variable.
    ///
    /// The first segment creates a read-write record with the declared total
    /// length; later segments append. Filling past the declared length is an
    /// error. `total_len` must agree across all segments of one variable.
    pub fn store_segment<T: StoreElement>(
        &mut self,
        group: &str,
        variable: &str,
        total_len: usize,
        segment: &[T],
    ) -> ObsResult<()> {
        if !self.has(group, variable) {
            let record = Record::with_capacity(group, variable, T::ELEMENT, total_len);
            self.insert(record)?;
        }

        let record = self.find_mut(group, variable)?;
        if record.mutability() == Mutability::ReadOnly {
            return Err(ObsError::ReadOnly(record.qualified_name()));
        }
        if record.len() != total_len {
            return Err(ObsError::InvalidShape {
                name: record.qualified_name(),
                message: format!(
                    "declared length {} does not match record length {}",
                    total_len,
                    record.len()
                ),
            });
        }
        if record.filled() + segment.len() > record.len() {
            return Err(ObsError::InvalidShape {
                name: record.qualified_name(),
                message: format!(
                    "segment of {} values overflows record of length {} ({} already stored)",
                    segment.len(),
                    record.len(),
                    record.filled()
                ),
            });
        }
        let name = record.qualified_name();
        let stored_type = record.element_type();
        let stored = T::as_vec_mut(record.data_mut()).ok_or_else(|| ObsError::TypeMismatch {
            name,
            requested: T::ELEMENT.to_string(),
            stored: stored_type.to_string(),
        })?;
        stored.extend_from_slice(segment);
        Ok(())
    }

    /// Load one contiguous segment of a variable.
    pub fn load_segment<T: StoreElement>(
        &self,
        group: &str,
        variable: &str,
        start: usize,
        count: usize,
    ) -> ObsResult<Vec<T>> {
        let record = self.find(group, variable)?;
        let values = record.values::<T>()?;
        if start + count > values.len() {
            return Err(ObsError::InvalidShape {
                name: record.qualified_name(),
                message: format!(
                    "segment [{}, {}) out of range for {} stored values",
                    start,
                    start + count,
                    values.len()
                ),
            });
        }
        Ok(values[start..start + count].to_vec())
    }
}

impl fmt::Display for ObsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Observation store ({} records)", self.records.len())?;
        for record in self.records.values() {
            writeln!(f, "{} @ {}", record.variable(), record.group())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueBuffer;

    fn int_record(group: &str, variable: &str, values: Vec<i32>) -> Record {
        let len = values.len();
        Record::new(group, variable, Mutability::ReadOnly, len, ValueBuffer::Int32(values))
            .unwrap()
    }

    #[test]
    fn test_duplicate_key_leaves_first_unchanged() {
        let mut store = ObsStore::new();
        store.insert(int_record("MetaData", "latitude", vec![1, 2, 3])).unwrap();

        let err = store
            .insert(int_record("MetaData", "latitude", vec![9, 9, 9]))
            .unwrap_err();
        assert!(matches!(err, ObsError::DuplicateKey { .. }));
        assert_eq!(store.get::<i32>("MetaData", "latitude").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_iteration_ordered_by_variable_then_group() {
        let mut store = ObsStore::new();
        store.insert(int_record("ObsValue", "brightness_temperature", vec![1])).unwrap();
        store.insert(int_record("MetaData", "latitude", vec![2])).unwrap();
        store.insert(int_record("GroupUndefined", "brightness_temperature", vec![3])).unwrap();

        let order: Vec<(String, String)> = store
            .records()
            .map(|r| (r.variable().to_string(), r.group().to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("brightness_temperature".to_string(), "GroupUndefined".to_string()),
                ("brightness_temperature".to_string(), "ObsValue".to_string()),
                ("latitude".to_string(), "MetaData".to_string()),
            ]
        );
    }

    #[test]
    fn test_read_only_refuses_overwrite() {
        let mut store = ObsStore::new();
        store.insert(int_record("ObsValue", "airs", vec![1, 2])).unwrap();
        assert!(matches!(
            store.put::<i32>("ObsValue", "airs", &[3, 4]),
            Err(ObsError::ReadOnly(_))
        ));
    }

    #[test]
    fn test_put_overwrites_in_place_only() {
        let mut store = ObsStore::new();
        store.put::<f32>("Derived", "omb", &[0.1, 0.2]).unwrap();
        store.put::<f32>("Derived", "omb", &[0.3, 0.4]).unwrap();
        assert_eq!(store.get::<f32>("Derived", "omb").unwrap(), vec![0.3, 0.4]);

        // Shape is fixed at creation
        assert!(matches!(
            store.put::<f32>("Derived", "omb", &[1.0]),
            Err(ObsError::InvalidShape { .. })
        ));
        // As is the element type
        assert!(matches!(
            store.put::<i32>("Derived", "omb", &[1, 2]),
            Err(ObsError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_find_not_found() {
        let store = ObsStore::new();
        assert!(!store.has("MetaData", "latitude"));
        assert!(matches!(
            store.find("MetaData", "latitude"),
            Err(ObsError::NotFound(_))
        ));
    }

    #[test]
    fn test_segment_overflow_rejected() {
        let mut store = ObsStore::new();
        store.store_segment::<i32>("G", "v", 3, &[1, 2]).unwrap();
        assert!(matches!(
            store.store_segment::<i32>("G", "v", 3, &[3, 4]),
            Err(ObsError::InvalidShape { .. })
        ));
        // Mismatched declared total is also rejected
        assert!(matches!(
            store.store_segment::<i32>("G", "v", 5, &[3]),
            Err(ObsError::InvalidShape { .. })
        ));
    }
}
