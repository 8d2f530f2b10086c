//! Named container
//!
//! An ordered mapping from case-insensitive names to elements. Iteration
//! and positional access follow insertion order; lookups fold case.

use indexmap::IndexMap;
use nosql_core::{ElementKind, NosqlError, Result};
use unicase::UniCase;

/// Anything identified by a non-empty name
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for String {
    fn name(&self) -> &str {
        self
    }
}

/// Ordered, case-insensitively name-unique collection of elements
#[derive(Debug, Clone)]
pub struct NamedContainer<T> {
    kind: ElementKind,
    entries: IndexMap<UniCase<String>, T>,
}

impl<T: Named> NamedContainer<T> {
    /// Create an empty container holding elements of `kind`
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Kind of element held, used in error messages
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Add an element
    ///
    /// With `overwrite == false` an existing element of the same name is a
    /// `DuplicateElement` error naming the existing element. With
    /// `overwrite == true` the existing element is replaced in place and
    /// returned.
    pub fn add(&mut self, element: T, overwrite: bool) -> Result<Option<T>> {
        validate_name(self.kind, element.name())?;
        let key = UniCase::new(element.name().to_string());
        match self.entries.get_mut(&key) {
            Some(existing) if !overwrite => {
                Err(NosqlError::duplicate(self.kind, existing.name()))
            }
            Some(existing) => Ok(Some(std::mem::replace(existing, element))),
            None => {
                self.entries.insert(key, element);
                Ok(None)
            }
        }
    }

    /// Look up an element by name, ignoring case
    pub fn get(&self, name: &str) -> Result<&T> {
        self.find(name)
            .ok_or_else(|| NosqlError::no_such(self.kind, name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut T> {
        let kind = self.kind;
        self.entries
            .get_mut(&UniCase::new(name.to_string()))
            .ok_or_else(|| NosqlError::no_such(kind, name))
    }

    /// Look up an element by its 0-based insertion position
    pub fn get_at(&self, index: usize) -> Result<&T> {
        self.entries
            .get_index(index)
            .map(|(_, element)| element)
            .ok_or_else(|| NosqlError::no_such_index(self.kind, index))
    }

    /// Like `get`, without the error
    pub fn find(&self, name: &str) -> Option<&T> {
        self.entries.get(&UniCase::new(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.entries.get_index_of(&UniCase::new(name.to_string()))
    }

    /// Remove an element, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Result<T> {
        self.entries
            .shift_remove(&UniCase::new(name.to_string()))
            .ok_or_else(|| NosqlError::no_such(self.kind, name))
    }

    /// Remove every element, returning them in insertion order
    pub fn clear(&mut self) -> Vec<T> {
        self.entries.drain(..).map(|(_, element)| element).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Element names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.iter().map(|e| e.name().to_string()).collect()
    }
}

/// Structural, order-sensitive equality
impl<T: Named + PartialEq> PartialEq for NamedContainer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<'a, T: Named> IntoIterator for &'a NamedContainer<T> {
    type Item = &'a T;
    type IntoIter = indexmap::map::Values<'a, UniCase<String>, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

/// Reject empty or blank names
pub fn validate_name(kind: ElementKind, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(NosqlError::invalid_argument(format!(
            "{kind} name must not be empty"
        )));
    }
    Ok(())
}
