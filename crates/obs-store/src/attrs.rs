//! Metadata attributes for variables and for the store itself.

use std::collections::BTreeMap;

use obs_common::{ObsError, ObsResult};

use crate::value::{ElementType, StoreElement, ValueBuffer};

/// A named, dimensioned, typed block of metadata values.
///
/// Attributes are small (a scalar or short array) and, unlike records, may be
/// freely created and destroyed; their shape is still fixed at creation and
/// every read or write is type-checked against the stored tag.
#[derive(Debug, Clone)]
pub struct Attribute {
    dims: Vec<usize>,
    data: ValueBuffer,
}

impl Attribute {
    /// Create an attribute holding `values` with shape `dims`.
    pub fn new<T: StoreElement>(dims: Vec<usize>, values: Vec<T>) -> ObsResult<Self> {
        let expected: usize = dims.iter().product();
        if expected != values.len() {
            return Err(ObsError::InvalidShape {
                name: "attribute".to_string(),
                message: format!("shape {:?} does not hold {} values", dims, values.len()),
            });
        }
        Ok(Self {
            dims,
            data: T::from_vec(values),
        })
    }

    /// A scalar attribute.
    pub fn scalar<T: StoreElement>(value: T) -> Self {
        Self {
            dims: vec![1],
            data: T::from_vec(vec![value]),
        }
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dims
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn is_of_type(&self, element_type: ElementType) -> bool {
        self.data.element_type() == element_type
    }

    /// Type-checked read of the attribute values.
    pub fn read_values<T: StoreElement>(&self) -> ObsResult<&[T]> {
        T::as_slice(&self.data).ok_or_else(|| ObsError::TypeMismatch {
            name: "attribute".to_string(),
            requested: T::ELEMENT.to_string(),
            stored: self.data.element_type().to_string(),
        })
    }

    /// Type-checked in-place overwrite; the shape may not change.
    pub fn write_values<T: StoreElement>(&mut self, values: &[T]) -> ObsResult<()> {
        if values.len() != self.data.len() {
            return Err(ObsError::InvalidShape {
                name: "attribute".to_string(),
                message: format!(
                    "cannot resize from {} to {} values",
                    self.data.len(),
                    values.len()
                ),
            });
        }
        let stored_type = self.data.element_type();
        let stored = T::as_vec_mut(&mut self.data).ok_or_else(|| ObsError::TypeMismatch {
            name: "attribute".to_string(),
            requested: T::ELEMENT.to_string(),
            stored: stored_type.to_string(),
        })?;
        stored.clear();
        stored.extend_from_slice(values);
        Ok(())
    }
}

/// A set of attributes addressed by name.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    attrs: BTreeMap<String, Attribute>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new attribute; fails if the name is taken.
    pub fn create(&mut self, name: &str, attr: Attribute) -> ObsResult<()> {
        if self.attrs.contains_key(name) {
            return Err(ObsError::DuplicateAttribute(name.to_string()));
        }
        self.attrs.insert(name.to_string(), attr);
        Ok(())
    }

    /// Open an existing attribute.
    pub fn open(&self, name: &str) -> ObsResult<&Attribute> {
        self.attrs
            .get(name)
            .ok_or_else(|| ObsError::NotFound(format!("attribute '{}'", name)))
    }

    /// Open an existing attribute for writing.
    pub fn open_mut(&mut self, name: &str) -> ObsResult<&mut Attribute> {
        self.attrs
            .get_mut(name)
            .ok_or_else(|| ObsError::NotFound(format!("attribute '{}'", name)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Remove an attribute.
    pub fn remove(&mut self, name: &str) -> ObsResult<()> {
        self.attrs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ObsError::NotFound(format!("attribute '{}'", name)))
    }

    /// Rename an attribute; the new name must be free.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> ObsResult<()> {
        if self.attrs.contains_key(new_name) {
            return Err(ObsError::DuplicateAttribute(new_name.to_string()));
        }
        let attr = self
            .attrs
            .remove(old_name)
            .ok_or_else(|| ObsError::NotFound(format!("attribute '{}'", old_name)))?;
        self.attrs.insert(new_name.to_string(), attr);
        Ok(())
    }

    /// Attribute names in lexical order.
    pub fn list(&self) -> Vec<String> {
        self.attrs.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obs_common::ObsError;

    #[test]
    fn test_create_open_list() {
        let mut set = AttributeSet::new();
        set.create("units", Attribute::scalar("K".to_string())).unwrap();
        set.create("date_time", Attribute::scalar(2018041500_i32)).unwrap();

        assert!(set.exists("units"));
        assert_eq!(set.list(), vec!["date_time", "units"]);

        let dt = set.open("date_time").unwrap();
        assert_eq!(dt.read_values::<i32>().unwrap(), &[2018041500]);
        assert!(dt.is_of_type(ElementType::Int32));
    }

    #[test]
    fn test_duplicate_create() {
        let mut set = AttributeSet::new();
        set.create("units", Attribute::scalar(1.0_f32)).unwrap();
        let err = set.create("units", Attribute::scalar(2.0_f32)).unwrap_err();
        assert!(matches!(err, ObsError::DuplicateAttribute(_)));
        // First attribute is unchanged
        assert_eq!(set.open("units").unwrap().read_values::<f32>().unwrap(), &[1.0]);
    }

    #[test]
    fn test_rename_and_remove() {
        let mut set = AttributeSet::new();
        set.create("a", Attribute::scalar(1_i32)).unwrap();
        set.create("b", Attribute::scalar(2_i32)).unwrap();

        assert!(matches!(set.rename("a", "b"), Err(ObsError::DuplicateAttribute(_))));
        set.rename("a", "c").unwrap();
        assert!(!set.exists("a"));
        assert_eq!(set.open("c").unwrap().read_values::<i32>().unwrap(), &[1]);

        set.remove("b").unwrap();
        assert!(matches!(set.remove("b"), Err(ObsError::NotFound(_))));
        assert_eq!(set.list(), vec!["c"]);
    }

    #[test]
    fn test_type_checked_access() {
        let mut set = AttributeSet::new();
        set.create("levels", Attribute::new(vec![3], vec![850_i32, 500, 250]).unwrap())
            .unwrap();

        let attr = set.open_mut("levels").unwrap();
        assert!(matches!(attr.read_values::<f32>(), Err(ObsError::TypeMismatch { .. })));
        assert!(matches!(
            attr.write_values(&[1.0_f32, 2.0, 3.0]),
            Err(ObsError::TypeMismatch { .. })
        ));
        assert!(matches!(
            attr.write_values(&[1_i32, 2]),
            Err(ObsError::InvalidShape { .. })
        ));

        attr.write_values(&[925_i32, 700, 300]).unwrap();
        assert_eq!(attr.read_values::<i32>().unwrap(), &[925, 700, 300]);
    }

    #[test]
    fn test_shape_must_hold_values() {
        assert!(Attribute::new(vec![2, 2], vec![1_i32, 2, 3]).is_err());
        assert!(Attribute::new(vec![2, 2], vec![1_i32, 2, 3, 4]).is_ok());
    }
}
