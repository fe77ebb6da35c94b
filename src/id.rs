//! Code for handling IDs
use anyhow::{Context, Result};
use indexmap::IndexMap;

/// A trait alias for ID types
pub trait IDLike:
    Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}
impl<T> IDLike for T where
    T: Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone, std::hash::Hash, PartialEq, Eq, serde::Deserialize, Debug, serde::Serialize,
        )]
        /// An ID type (e.g. `ComponentID`, `ProfileID`, etc.)
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }
        }
    };
}
pub(crate) use define_id_type;

#[cfg(test)]
define_id_type!(GenericID);

/// Indicates that the struct has an ID field
pub trait HasID<ID: IDLike> {
    /// Get the struct's ID
    fn get_id(&self) -> &ID;
}

/// Implement the `HasID` trait for the given type, assuming it has a field called `id`
macro_rules! define_id_getter {
    ($t:ty, $id_ty:ty) => {
        impl crate::id::HasID<$id_ty> for $t {
            fn get_id(&self) -> &$id_ty {
                &self.id
            }
        }
    };
}
pub(crate) use define_id_getter;

/// A map keyed by ID which can be queried with the string form of the ID
pub trait IDMap<ID: IDLike, V> {
    /// Look up a value by the string representation of its ID.
    ///
    /// # Returns
    ///
    /// The value stored against the ID, or an error if not found.
    fn get_by_str(&self, id: &str) -> Result<&V>;
}

impl<ID: IDLike, V> IDMap<ID, V> for IndexMap<ID, V> {
    fn get_by_str(&self, id: &str) -> Result<&V> {
        self.get(id).with_context(|| format!("Unknown ID {id} found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;

    #[derive(Debug)]
    struct Record {
        id: GenericID,
    }
    define_id_getter! {Record, GenericID}

    #[test]
    fn test_get_by_str() {
        let record = Record { id: "a".into() };
        let map: IndexMap<GenericID, Record> =
            [(record.get_id().clone(), record)].into_iter().collect();
        assert_eq!(map.get_by_str("a").unwrap().id, GenericID::new("a"));
        assert_error!(map.get_by_str("b"), "Unknown ID b found");
    }
}
