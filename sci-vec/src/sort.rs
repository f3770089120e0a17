//! Multi-key sorting of parallel vectors.
//!
//! The comparator carries its key vectors and direction as state, so sorts
//! are reentrant and several can be in flight at once.

use crate::buffer::is_empty_value;
use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle};
use core::cmp::Ordering;

/// Compare two values. Empty sorts after every finite value and equals
/// another empty value.
pub fn compare_values(a: f64, b: f64) -> Ordering {
    match (is_empty_value(a), is_empty_value(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Key vectors compared in order, ties falling through to the next key.
#[derive(Debug, Clone)]
pub struct SortKeys<'a> {
    keys: Vec<&'a [f64]>,
    decreasing: bool,
}

impl<'a> SortKeys<'a> {
    /// Build a comparator over `keys`. Every key must have the same length.
    pub fn new(keys: Vec<&'a [f64]>, decreasing: bool) -> Result<Self, ExecInvariantViolation> {
        let Some(first) = keys.first() else {
            return Err(ConfigError::EmptyInput { arg: "keys" }.into());
        };
        let expected = first.len();
        if let Some(bad) = keys.iter().find(|k| k.len() != expected) {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "keys",
                expected,
                got: bad.len(),
            });
        }
        Ok(Self { keys, decreasing })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.keys.first().map_or(0, |k| k.len())
    }

    /// True without rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compare rows `a` and `b` across every key, ignoring direction.
    pub fn compare_rows(&self, a: usize, b: usize) -> Ordering {
        self.keys
            .iter()
            .map(|key| compare_values(key[a], key[b]))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Compare rows `a` and `b` in the configured direction.
    pub fn compare(&self, a: usize, b: usize) -> Ordering {
        let ord = self.compare_rows(a, b);
        if self.decreasing {
            ord.reverse()
        } else {
            ord
        }
    }

    /// Stable sort permutation over `0..len()`.
    pub fn permutation(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.compare(a, b));
        order
    }

    /// Keep the first row of every run of equal rows in `permutation`.
    pub fn unique(&self, permutation: &[usize]) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::with_capacity(permutation.len());
        for &row in permutation {
            match out.last() {
                Some(&prev) if self.compare_rows(prev, row).is_eq() => {}
                _ => out.push(row),
            }
        }
        out
    }
}

/// Sort permutation for the multi-key comparator over `keys`.
pub fn sort_permutation(
    keys: &[&[f64]],
    decreasing: bool,
) -> Result<Vec<usize>, ExecInvariantViolation> {
    Ok(SortKeys::new(keys.to_vec(), decreasing)?.permutation())
}

/// Drop rows of `permutation` equal to their predecessor under `keys`.
pub fn unique_compress(
    keys: &[&[f64]],
    permutation: &[usize],
) -> Result<Vec<usize>, ExecInvariantViolation> {
    Ok(SortKeys::new(keys.to_vec(), false)?.unique(permutation))
}

/// Reorder `values` by `permutation`.
pub fn apply_permutation(values: &[f64], permutation: &[usize]) -> Vec<f64> {
    permutation.iter().map(|&i| values[i]).collect()
}

/// Config for [`SortKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortConfig {
    /// Sort largest first.
    pub decreasing: bool,
    /// Keep one row per run of equal rows.
    pub unique: bool,
}

/// Produces sort permutations over parallel key vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKernel {
    decreasing: bool,
    unique: bool,
}

impl KernelLifecycle for SortKernel {
    type Config = SortConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self {
            decreasing: config.decreasing,
            unique: config.unique,
        })
    }
}

impl SortKernel {
    /// Permutation ordering the rows of `keys`.
    pub fn run(&self, keys: &[&[f64]]) -> Result<Vec<usize>, ExecInvariantViolation> {
        let keys = SortKeys::new(keys.to_vec(), self.decreasing)?;
        let permutation = keys.permutation();
        Ok(if self.unique {
            keys.unique(&permutation)
        } else {
            permutation
        })
    }
}

/// Values sorted increasing, empty elements last.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| compare_values(*a, *b));
    out
}
