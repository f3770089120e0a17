//! The vector entity: values, cached extrema, index offset and the
//! notification bookkeeping the store drives.

mod access;
mod ops;

pub use access::IndexValue;

use crate::buffer::{ValueBuffer, DEFAULT_CAPACITY};
use crate::error::{Error, Result};
use crate::notify::{ClientRegistry, NotifyPolicy, NotifyState};
use crate::stats;
use core::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Extrema {
    min: f64,
    max: f64,
}

/// A named, observable array of doubles.
#[derive(Debug)]
pub struct Vector {
    name: String,
    buffer: ValueBuffer,
    // `None` while dirty; recomputed on demand.
    extrema: Cell<Option<Extrema>>,
    offset: i64,
    pub(crate) policy: NotifyPolicy,
    pub(crate) state: NotifyState,
    pub(crate) clients: ClientRegistry,
    pub(crate) destroying: bool,
    // Set while clients of this vector are being called.
    pub(crate) notifying: bool,
}

impl Vector {
    /// An empty vector with the default capacity.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::with_capacity(name, DEFAULT_CAPACITY)
    }

    /// An empty vector with room for `capacity` values.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Result<Self> {
        Ok(Self::from_buffer(
            name,
            ValueBuffer::with_capacity(capacity)?,
        ))
    }

    /// A vector holding `values`.
    pub fn from_values(name: impl Into<String>, values: &[f64]) -> Result<Self> {
        let mut vector = Self::new(name)?;
        vector.set_values(values)?;
        Ok(vector)
    }

    fn from_buffer(name: impl Into<String>, buffer: ValueBuffer) -> Self {
        Self {
            name: name.into(),
            buffer,
            extrema: Cell::new(None),
            offset: 0,
            policy: NotifyPolicy::default(),
            state: NotifyState::default(),
            clients: ClientRegistry::default(),
            destroying: false,
            notifying: false,
        }
    }

    /// The vector's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Allocated slots.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// All values, empty slots included.
    pub fn values(&self) -> &[f64] {
        self.buffer.as_slice()
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &ValueBuffer {
        &self.buffer
    }

    /// Bias subtracted from external indices.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Set the index bias.
    pub fn set_offset(&mut self, offset: i64) {
        self.offset = offset;
    }

    /// Notification policy.
    pub fn notify_policy(&self) -> NotifyPolicy {
        self.policy
    }

    /// Notification state.
    pub fn notify_state(&self) -> NotifyState {
        self.state
    }

    /// Registered clients.
    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Value at `index`, if readable.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values().get(index).copied()
    }

    /// Smallest finite value, empty when none.
    pub fn min(&self) -> f64 {
        self.extrema().min
    }

    /// Largest finite value, empty when none.
    pub fn max(&self) -> f64 {
        self.extrema().max
    }

    fn extrema(&self) -> Extrema {
        if let Some(cached) = self.extrema.get() {
            return cached;
        }
        let values = self.values();
        let fresh = Extrema {
            min: stats::min(values),
            max: stats::max(values),
        };
        self.extrema.set(Some(fresh));
        fresh
    }

    /// Drop the cached extrema.
    pub fn invalidate(&mut self) {
        self.extrema.set(None);
    }

    /// Replace every value.
    pub fn set_values(&mut self, values: &[f64]) -> Result<()> {
        self.buffer.assign(values)?;
        self.invalidate();
        Ok(())
    }

    /// Set the length exactly; new slots are empty.
    pub fn set_length(&mut self, len: usize) -> Result<()> {
        self.buffer.set_length(len)?;
        self.invalidate();
        Ok(())
    }

    /// Set the length using the doubling growth policy.
    pub fn change_length(&mut self, len: usize) -> Result<()> {
        self.buffer.change_length(len)?;
        self.invalidate();
        Ok(())
    }

    /// Reallocate storage to `capacity` slots.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        self.buffer.set_capacity(capacity)?;
        self.invalidate();
        Ok(())
    }

    /// Append values.
    pub fn append(&mut self, values: &[f64]) -> Result<()> {
        self.buffer.extend_from_slice(values)?;
        self.invalidate();
        Ok(())
    }

    /// Write `value` at `index`. `index == len()` appends one element.
    pub fn set(&mut self, index: usize, value: f64) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(Error::bad_index(index.to_string()));
        }
        if index == len {
            self.buffer.change_length(len + 1)?;
        }
        self.buffer.as_mut_slice()[index] = value;
        self.invalidate();
        Ok(())
    }

    /// Fill `first..=last` with `value`.
    pub fn fill(&mut self, first: usize, last: usize, value: f64) -> Result<()> {
        if first > last || last >= self.len() {
            return Err(Error::bad_index(format!("{first}:{last}")));
        }
        self.buffer.as_mut_slice()[first..=last].fill(value);
        self.invalidate();
        Ok(())
    }

    /// Remove the contiguous span `first..=last`.
    pub fn remove_span(&mut self, first: usize, last: usize) -> Result<()> {
        if first > last || last >= self.len() {
            return Err(Error::bad_index(format!("{first}:{last}")));
        }
        self.buffer.remove_span(first, last);
        self.invalidate();
        Ok(())
    }

    /// Empty the vector, keeping its storage.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.invalidate();
    }

    /// Mutable access for in-place transforms.
    pub fn values_mut(&mut self) -> &mut [f64] {
        self.extrema.set(None);
        self.buffer.as_mut_slice()
    }
}
