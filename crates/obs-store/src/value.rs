//! Typed value buffers for observation data.
//!
//! Variables have heterogeneous element types but share identical storage and
//! lookup machinery, so payloads are type-erased at the container level and
//! type-checked at the access boundary. The erasure is a closed tagged enum,
//! one variant per supported element type; [`StoreElement`] is the only
//! bridge between compile-time types and the runtime tag.

use chrono::{DateTime, Utc};
use std::fmt;

/// The closed set of element types a variable may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Int32,
    Float32,
    Str,
    DateTime,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Int32 => "int32",
            ElementType::Float32 => "float32",
            ElementType::Str => "string",
            ElementType::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// A contiguous block of values with a runtime type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueBuffer {
    Int32(Vec<i32>),
    Float32(Vec<f32>),
    Str(Vec<String>),
    DateTime(Vec<DateTime<Utc>>),
}

impl ValueBuffer {
    /// An empty buffer of the given element type.
    pub fn empty(element_type: ElementType) -> Self {
        match element_type {
            ElementType::Int32 => ValueBuffer::Int32(Vec::new()),
            ElementType::Float32 => ValueBuffer::Float32(Vec::new()),
            ElementType::Str => ValueBuffer::Str(Vec::new()),
            ElementType::DateTime => ValueBuffer::DateTime(Vec::new()),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            ValueBuffer::Int32(_) => ElementType::Int32,
            ValueBuffer::Float32(_) => ElementType::Float32,
            ValueBuffer::Str(_) => ElementType::Str,
            ValueBuffer::DateTime(_) => ElementType::DateTime,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ValueBuffer::Int32(v) => v.len(),
            ValueBuffer::Float32(v) => v.len(),
            ValueBuffer::Str(v) => v.len(),
            ValueBuffer::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Element types storable in a [`ValueBuffer`].
///
/// Implemented for exactly `i32`, `f32`, `String` and `DateTime<Utc>`.
/// The accessors return `None` when the buffer's tag disagrees with `Self`;
/// callers turn that into a `TypeMismatch` error with the variable's name.
pub trait StoreElement: Clone + Sized {
    const ELEMENT: ElementType;

    fn from_vec(values: Vec<Self>) -> ValueBuffer;
    fn as_slice(buffer: &ValueBuffer) -> Option<&[Self]>;
    fn as_vec_mut(buffer: &mut ValueBuffer) -> Option<&mut Vec<Self>>;
}

macro_rules! impl_store_element {
    ($type:ty, $variant:ident, $element:expr) => {
        impl StoreElement for $type {
            const ELEMENT: ElementType = $element;

            fn from_vec(values: Vec<Self>) -> ValueBuffer {
                ValueBuffer::$variant(values)
            }

            fn as_slice(buffer: &ValueBuffer) -> Option<&[Self]> {
                match buffer {
                    ValueBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn as_vec_mut(buffer: &mut ValueBuffer) -> Option<&mut Vec<Self>> {
                match buffer {
                    ValueBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_store_element!(i32, Int32, ElementType::Int32);
impl_store_element!(f32, Float32, ElementType::Float32);
impl_store_element!(String, Str, ElementType::Str);
impl_store_element!(DateTime<Utc>, DateTime, ElementType::DateTime);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_matches_variant() {
        let buf = ValueBuffer::Int32(vec![1, 2, 3]);
        assert_eq!(buf.element_type(), ElementType::Int32);
        assert_eq!(buf.len(), 3);
        assert_eq!(i32::as_slice(&buf), Some(&[1, 2, 3][..]));
        assert!(f32::as_slice(&buf).is_none());
    }

    #[test]
    fn test_empty_buffers() {
        for et in [
            ElementType::Int32,
            ElementType::Float32,
            ElementType::Str,
            ElementType::DateTime,
        ] {
            let buf = ValueBuffer::empty(et);
            assert_eq!(buf.element_type(), et);
            assert!(buf.is_empty());
        }
    }
}
