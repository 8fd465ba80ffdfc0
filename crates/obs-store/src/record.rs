//! A single stored observation variable.

use obs_common::{ObsError, ObsResult};

use crate::attrs::AttributeSet;
use crate::value::{ElementType, StoreElement, ValueBuffer};

/// Whether a record's payload may be overwritten after ingest.
///
/// Data sourced from a file is never treated as safely overwritable in
/// place; algorithms that need to mutate store a new, read-write record
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    ReadOnly,
    ReadWrite,
}

/// One stored variable: a (group, variable) key, a fixed length, a typed
/// payload, and metadata attributes.
///
/// The length is fixed at creation. The payload may be shorter than the
/// declared length while segmented stores are still filling it; it never
/// exceeds the declared length and is never resized downward.
#[derive(Debug, Clone)]
pub struct Record {
    group: String,
    variable: String,
    mutability: Mutability,
    len: usize,
    data: ValueBuffer,
    attrs: AttributeSet,
}

impl Record {
    /// Create a record with a fully populated payload.
    pub fn new(
        group: impl Into<String>,
        variable: impl Into<String>,
        mutability: Mutability,
        len: usize,
        data: ValueBuffer,
    ) -> ObsResult<Self> {
        let group = group.into();
        let variable = variable.into();
        if data.len() != len {
            return Err(ObsError::InvalidShape {
                name: format!("{}@{}", variable, group),
                message: format!("payload holds {} values, declared length {}", data.len(), len),
            });
        }
        Ok(Self {
            group,
            variable,
            mutability,
            len,
            data,
            attrs: AttributeSet::new(),
        })
    }

    /// Create an empty read-write record to be filled by segmented stores.
    pub fn with_capacity(
        group: impl Into<String>,
        variable: impl Into<String>,
        element_type: ElementType,
        len: usize,
    ) -> Self {
        Self {
            group: group.into(),
            variable: variable.into(),
            mutability: Mutability::ReadWrite,
            len,
            data: ValueBuffer::empty(element_type),
            attrs: AttributeSet::new(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The `variable@group` form used as the on-disk dataset name.
    pub fn qualified_name(&self) -> String {
        format!("{}@{}", self.variable, self.group)
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    /// Declared length (the full variable size, not the filled portion).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of values stored so far; equals `len()` once fully populated.
    pub fn filled(&self) -> usize {
        self.data.len()
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn data(&self) -> &ValueBuffer {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut ValueBuffer {
        &mut self.data
    }

    pub fn attrs(&self) -> &AttributeSet {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut AttributeSet {
        &mut self.attrs
    }

    /// Type-checked view of the stored values.
    pub fn values<T: StoreElement>(&self) -> ObsResult<&[T]> {
        T::as_slice(&self.data).ok_or_else(|| ObsError::TypeMismatch {
            name: self.qualified_name(),
            requested: T::ELEMENT.to_string(),
            stored: self.data.element_type().to_string(),
        })
    }
}
