//! Schema element primitives
//!
//! Elements live in an arena owned by their `Datamodel` and refer to each
//! other by typed ids. A child records its owner's id; a container records
//! its children's ids in a `NamedContainer` of `Member`s.

use crate::container::Named;
use slotmap::new_key_type;

new_key_type! {
    pub struct SchemaId;
    pub struct TableId;
    pub struct FieldId;
    pub struct IndexId;
}

/// Owner marker for elements owned directly by the datamodel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelRoot;

/// Identity, owner and fetch state shared by every element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementHeader<O> {
    name: String,
    owner: Option<O>,
    fetched: bool,
}

impl<O: Copy + Eq> ElementHeader<O> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            fetched: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<O> {
        self.owner
    }

    pub fn is_fetched(&self) -> bool {
        self.fetched
    }

    pub(crate) fn set_owner(&mut self, owner: Option<O>) {
        self.owner = owner;
    }

    pub(crate) fn set_fetched(&mut self, fetched: bool) {
        self.fetched = fetched;
    }
}

/// Common read access to a schema element
pub trait SchemaElement {
    type Owner: Copy + Eq;

    fn header(&self) -> &ElementHeader<Self::Owner>;

    fn name(&self) -> &str {
        self.header().name()
    }

    /// Owning container, or `None` while detached
    fn owner(&self) -> Option<Self::Owner> {
        self.header().owner()
    }

    /// Whether this element's details have been loaded from the store
    fn is_fetched(&self) -> bool {
        self.header().is_fetched()
    }
}

/// A container's reference to one child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member<Id> {
    name: String,
    pub id: Id,
}

impl<Id: Copy> Member<Id> {
    pub(crate) fn new(name: impl Into<String>, id: Id) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

impl<Id> Named for Member<Id> {
    fn name(&self) -> &str {
        &self.name
    }
}
