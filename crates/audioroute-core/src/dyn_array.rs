//! Granular growable array.
//!
//! Every collection in the configuration model is a [`DynArray`]. The array is
//! filled one element at a time while the config file is parsed, growing in
//! steps of [`DYN_ARRAY_GRANULE`] so a file with thousands of controls does not
//! reallocate on every push. Once an entity's children are complete the loader
//! calls [`DynArray::compress`] to give back the unused tail.
//!
//! The element count is limited to a 16-bit range. Exceeding it is reported as
//! [`Error::OutOfMemory`], the same way a failed allocation is.

use std::ops::{Deref, DerefMut};

use crate::error::{Error, Result};

/// Number of elements added to the capacity each time the array grows.
pub const DYN_ARRAY_GRANULE: usize = 16;

/// Upper bound on the capacity of a [`DynArray`].
pub const DYN_ARRAY_MAX_CAPACITY: usize = 0xFFFF;

/// Growable typed array with granular growth.
///
/// Invariant: `len() <= capacity() <= DYN_ARRAY_MAX_CAPACITY`.
#[derive(Debug, Clone, PartialEq)]
pub struct DynArray<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> DynArray<T> {
    /// Create an empty array with no storage.
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            capacity: 0,
        }
    }

    /// Number of populated elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of elements the array can hold before growing again.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one element, growing by a granule if the array is full.
    ///
    /// Returns a mutable reference to the new element.
    pub fn push(&mut self, value: T) -> Result<&mut T> {
        self.grow_for_one()?;
        self.items.push(value);
        let last = self.items.len() - 1;
        Ok(&mut self.items[last])
    }

    /// Append one default-initialised element.
    pub fn extend(&mut self) -> Result<&mut T>
    where
        T: Default,
    {
        self.push(T::default())
    }

    /// Shrink capacity to exactly the element count.
    ///
    /// Called once per array when the loader has finished populating it.
    pub fn compress(&mut self) {
        self.items.shrink_to_fit();
        self.capacity = self.items.len();
    }

    /// Drop all elements and release the storage.
    pub fn free(&mut self) {
        self.items = Vec::new();
        self.capacity = 0;
    }

    fn grow_for_one(&mut self) -> Result<()> {
        if self.items.len() < self.capacity {
            return Ok(());
        }

        if self.capacity > DYN_ARRAY_MAX_CAPACITY - DYN_ARRAY_GRANULE {
            tracing::error!(capacity = self.capacity, "array at maximum capacity");
            return Err(Error::OutOfMemory);
        }

        self.items
            .try_reserve_exact(self.capacity + DYN_ARRAY_GRANULE - self.items.len())
            .map_err(|e| {
                tracing::error!(capacity = self.capacity, error = %e, "array allocation failed");
                Error::OutOfMemory
            })?;
        self.capacity += DYN_ARRAY_GRANULE;
        Ok(())
    }
}

impl<T> Default for DynArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for DynArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> DerefMut for DynArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<'a, T> IntoIterator for &'a DynArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynArray<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}
