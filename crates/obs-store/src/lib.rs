//! In-memory observation store.
//!
//! Holds every loaded or derived variable in a type-erased, multiply-indexed
//! container keyed by (group, variable):
//! - [`value`]: the closed tagged buffer type and the typed access bridge
//! - [`attrs`]: named, dimensioned metadata attributes
//! - [`record`]: one stored variable (key, mutability, payload, attributes)
//! - [`container`]: the [`ObsStore`] registry itself

pub mod attrs;
pub mod container;
pub mod record;
pub mod value;

pub use attrs::{Attribute, AttributeSet};
pub use container::ObsStore;
pub use record::{Mutability, Record};
pub use value::{ElementType, StoreElement, ValueBuffer};
