//! Growable storage of doubles with a logical length distinct from capacity.

use crate::error::{Error, Result};

/// Base capacity used by the doubling growth policy of
/// [`ValueBuffer::change_length`].
pub const DEFAULT_CAPACITY: usize = 64;

/// The empty sentinel.
pub const EMPTY: f64 = f64::NAN;

/// Returns true when `value` is the empty sentinel.
#[inline]
pub fn is_empty_value(value: f64) -> bool {
    value.is_nan()
}

/// Growable array of doubles.
///
/// Every allocated slot past the logical length holds [`EMPTY`], so growing
/// the length never exposes stale values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueBuffer {
    // `slots.len()` is the capacity.
    slots: Vec<f64>,
    len: usize,
}

impl ValueBuffer {
    /// An empty buffer with no storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty buffer with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut buffer = Self::new();
        buffer.set_capacity(capacity)?;
        Ok(buffer)
    }

    /// Take ownership of `values`; length and capacity both equal `values.len()`.
    pub fn from_vec(values: Vec<f64>) -> Self {
        let len = values.len();
        Self { slots: values, len }
    }

    /// A single element buffer, the canonical scalar.
    pub fn scalar(value: f64) -> Self {
        Self::from_vec(vec![value])
    }

    /// Logical length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the logical length is zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// True for length-1 buffers.
    pub fn is_scalar(&self) -> bool {
        self.len == 1
    }

    /// The logically visible values.
    pub fn as_slice(&self) -> &[f64] {
        &self.slots[..self.len]
    }

    /// The logically visible values, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.slots[..self.len]
    }

    /// Copy the visible values out.
    pub fn to_vec(&self) -> Vec<f64> {
        self.as_slice().to_vec()
    }

    /// Consume the buffer, keeping only the visible values.
    pub fn into_vec(mut self) -> Vec<f64> {
        self.slots.truncate(self.len);
        self.slots
    }

    /// Reallocate to exactly `capacity` slots, preserving content.
    ///
    /// When `capacity` is below the current length the length is clipped.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        let current = self.slots.len();
        if capacity > current {
            let additional = capacity - current;
            self.slots.try_reserve_exact(additional).map_err(|_| {
                tracing::warn!(requested = capacity, "vector allocation failed");
                Error::OutOfMemory {
                    requested: capacity,
                }
            })?;
            self.slots.resize(capacity, EMPTY);
        } else if capacity < current {
            self.slots.truncate(capacity);
            self.slots.shrink_to_fit();
            self.len = self.len.min(capacity);
        }
        Ok(())
    }

    /// Set the logical length, growing capacity to exactly `len` when needed.
    ///
    /// Newly exposed slots hold [`EMPTY`]. Shrinking only moves the length.
    pub fn set_length(&mut self, len: usize) -> Result<()> {
        if len > self.capacity() {
            self.set_capacity(len)?;
        }
        self.expose(len);
        Ok(())
    }

    /// Like [`ValueBuffer::set_length`], but capacity grows to the smallest
    /// power-of-two multiple of [`DEFAULT_CAPACITY`] that holds `len`.
    pub fn change_length(&mut self, len: usize) -> Result<()> {
        if len > self.capacity() {
            self.set_capacity(grown_capacity(len)?)?;
        }
        self.expose(len);
        Ok(())
    }

    /// Append values at the end, growing with the doubling policy.
    pub fn extend_from_slice(&mut self, values: &[f64]) -> Result<()> {
        let start = self.len;
        let end = start
            .checked_add(values.len())
            .ok_or(Error::OutOfMemory {
                requested: usize::MAX,
            })?;
        self.change_length(end)?;
        self.slots[start..end].copy_from_slice(values);
        Ok(())
    }

    /// Append one value at the end.
    pub fn push(&mut self, value: f64) -> Result<()> {
        self.extend_from_slice(&[value])
    }

    /// Replace all content with `values`.
    pub fn assign(&mut self, values: &[f64]) -> Result<()> {
        self.change_length(values.len())?;
        self.slots[..values.len()].copy_from_slice(values);
        Ok(())
    }

    /// Drop every value, keeping the storage.
    pub fn clear(&mut self) {
        self.expose(0);
    }

    /// Remove the contiguous span `first..=last`, shifting the tail down.
    pub fn remove_span(&mut self, first: usize, last: usize) {
        debug_assert!(first <= last && last < self.len);
        let removed = last - first + 1;
        self.slots.copy_within(last + 1..self.len, first);
        let new_len = self.len - removed;
        self.slots[new_len..self.len].fill(EMPTY);
        self.len = new_len;
    }

    fn expose(&mut self, len: usize) {
        if len > self.len {
            self.slots[self.len..len].fill(EMPTY);
        } else {
            self.slots[len..self.len].fill(EMPTY);
        }
        self.len = len;
    }
}

fn grown_capacity(len: usize) -> Result<usize> {
    let mut capacity = DEFAULT_CAPACITY;
    while capacity < len {
        capacity = capacity.checked_mul(2).ok_or(Error::OutOfMemory { requested: len })?;
    }
    Ok(capacity)
}

impl From<Vec<f64>> for ValueBuffer {
    fn from(values: Vec<f64>) -> Self {
        Self::from_vec(values)
    }
}

impl From<&[f64]> for ValueBuffer {
    fn from(values: &[f64]) -> Self {
        Self::from_vec(values.to_vec())
    }
}
