//! # Merge Updates
//!
//! Partial updates are applied field by field: a field present in the patch overwrites the
//! stored one, an absent field leaves it alone. Nested value objects merge recursively.
//!
//! Collections use [`CollectionPatch`], which makes "leave as is" and "clear" two explicit
//! variants. `Replace` with an empty list counts as "leave as is", which is also how an empty
//! list on the wire is read (see `From<Option<Vec<T>>>`); clearing needs `Clear`, sent as
//! `{"clear": true}`.
//!
//! Merging never validates. Callers re-validate the merged record before it is stored.

use serde::Deserialize;

/// A value object or record that accepts a partial update.
pub trait Merge {
    type Patch;

    fn merge(&mut self, patch: Self::Patch);
}

pub fn merge_field<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Sets an optional field when the patch carries a value. An absent value never clears.
pub fn merge_optional<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

pub fn merge_nested<M: Merge>(target: &mut M, patch: Option<M::Patch>) {
    if let Some(patch) = patch {
        target.merge(patch);
    }
}

/// Merges into an optional value object, starting from `M::default()` when there is none yet.
pub fn merge_nested_optional<M: Merge + Default>(target: &mut Option<M>, patch: Option<M::Patch>) {
    if let Some(patch) = patch {
        target.get_or_insert_with(M::default).merge(patch);
    }
}

/// Wire forms: absent, `null` or `[]` leave the collection alone, a non-empty list replaces
/// it, `{"clear": true}` empties it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "CollectionPatchWire<T>")]
pub enum CollectionPatch<T> {
    Unchanged,
    Replace(Vec<T>),
    Clear,
}

impl<T> Default for CollectionPatch<T> {
    fn default() -> Self {
        Self::Unchanged
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CollectionPatchWire<T> {
    Clear { clear: bool },
    Items(Option<Vec<T>>),
}

impl<T> From<CollectionPatchWire<T>> for CollectionPatch<T> {
    fn from(wire: CollectionPatchWire<T>) -> Self {
        match wire {
            CollectionPatchWire::Clear { clear: true } => Self::Clear,
            CollectionPatchWire::Clear { clear: false } => Self::Unchanged,
            CollectionPatchWire::Items(items) => items.into(),
        }
    }
}

impl<T> From<Option<Vec<T>>> for CollectionPatch<T> {
    fn from(value: Option<Vec<T>>) -> Self {
        match value {
            Some(items) if !items.is_empty() => Self::Replace(items),
            _ => Self::Unchanged,
        }
    }
}

impl<T> CollectionPatch<T> {
    pub fn is_unchanged(&self) -> bool {
        match self {
            Self::Unchanged => true,
            Self::Replace(items) => items.is_empty(),
            Self::Clear => false,
        }
    }

    /// Applies the patch; returns whether `target` changed.
    pub fn apply(self, target: &mut Vec<T>) -> bool
    where
        T: PartialEq,
    {
        let next = match self {
            Self::Unchanged => return false,
            Self::Replace(items) if items.is_empty() => return false,
            Self::Replace(items) => items,
            Self::Clear => Vec::new(),
        };
        let changed = *target != next;
        *target = next;
        changed
    }
}
