//! Resolution of textual indices.
//!
//! An index token is one of
//!
//! - an integer, biased by the vector's offset (`5`, `-1`),
//! - `end`, the last element,
//! - `++end`, one past the last element (write only),
//! - a registered aggregate keyword such as `min` or `mean` (read only),
//! - a range `first:last` of integers or `end`. An omitted left side means
//!   the first element and an omitted right side means the last.

use crate::error::{Error, Result};
use crate::stats;
use std::collections::HashMap;

/// Zero-argument pseudo-index computed from the vector's values.
pub type AggregateFn = fn(&[f64]) -> f64;

/// Whether an index is resolved for reading or writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Only existing elements are valid.
    Read,
    /// One past the end is valid and appends.
    Write,
}

/// A resolved index.
#[derive(Debug, Clone, Copy)]
pub enum Index {
    /// A single existing element.
    Element(usize),
    /// One past the last element.
    Append,
    /// An inclusive span. `first > last` iterates backwards when read.
    Range {
        /// First position visited.
        first: usize,
        /// Last position visited.
        last: usize,
    },
    /// A computed pseudo-index.
    Aggregate(AggregateFn),
}

impl Index {
    /// Positions covered, in visiting order. Empty for aggregates and appends.
    pub fn positions(&self) -> Vec<usize> {
        match *self {
            Index::Element(i) => vec![i],
            Index::Range { first, last } if first <= last => (first..=last).collect(),
            Index::Range { first, last } => (last..=first).rev().collect(),
            Index::Append | Index::Aggregate(_) => Vec::new(),
        }
    }

    /// The covered span as `(low, high)`, whatever the direction.
    pub fn span(&self) -> Option<(usize, usize)> {
        match *self {
            Index::Element(i) => Some((i, i)),
            Index::Range { first, last } => Some((first.min(last), first.max(last))),
            Index::Append | Index::Aggregate(_) => None,
        }
    }
}

/// Maps index tokens to concrete positions.
#[derive(Debug, Clone)]
pub struct IndexResolver {
    aggregates: HashMap<String, AggregateFn>,
}

impl Default for IndexResolver {
    fn default() -> Self {
        let mut resolver = Self {
            aggregates: HashMap::new(),
        };
        resolver.register("min", stats::min::<f64>);
        resolver.register("max", stats::max::<f64>);
        resolver.register("mean", stats::mean::<f64>);
        resolver.register("sum", stats::sum::<f64>);
        resolver.register("prod", stats::prod::<f64>);
        resolver.register("median", stats::median::<f64>);
        resolver
    }
}

impl IndexResolver {
    /// Register (or replace) an aggregate keyword.
    pub fn register(&mut self, name: impl Into<String>, aggregate: AggregateFn) {
        self.aggregates.insert(name.into(), aggregate);
    }

    /// Whether `name` is an aggregate keyword.
    pub fn is_aggregate(&self, name: &str) -> bool {
        self.aggregates.contains_key(name)
    }

    /// Resolve `token` against a vector of length `len` biased by `offset`.
    pub fn resolve(&self, token: &str, len: usize, offset: i64, mode: IndexMode) -> Result<Index> {
        let trimmed = token.trim();
        if let Some((left, right)) = trimmed.split_once(':') {
            if len == 0 {
                return Err(Error::bad_index(token));
            }
            let first = match left.trim() {
                "" => 0,
                side => self.position(side, token, len, offset)?,
            };
            let last = match right.trim() {
                "" => len - 1,
                side => self.position(side, token, len, offset)?,
            };
            return Ok(Index::Range { first, last });
        }

        if trimmed == "++end" {
            return match mode {
                IndexMode::Write => Ok(Index::Append),
                IndexMode::Read => Err(Error::bad_index(token)),
            };
        }
        if let Some(aggregate) = self.aggregates.get(trimmed) {
            return match mode {
                IndexMode::Read => Ok(Index::Aggregate(*aggregate)),
                IndexMode::Write => Err(Error::bad_index(token)),
            };
        }

        match (mode, self.internal(trimmed, token, len, offset)?) {
            (_, i) if i < len => Ok(Index::Element(i)),
            (IndexMode::Write, i) if i == len => Ok(Index::Append),
            _ => Err(Error::bad_index(token)),
        }
    }

    // An existing element position.
    fn position(&self, side: &str, token: &str, len: usize, offset: i64) -> Result<usize> {
        let i = self.internal(side, token, len, offset)?;
        if i < len {
            Ok(i)
        } else {
            Err(Error::bad_index(token))
        }
    }

    // Offset-corrected position, not yet bounds checked against `len`.
    fn internal(&self, side: &str, token: &str, len: usize, offset: i64) -> Result<usize> {
        if side == "end" {
            return len.checked_sub(1).ok_or_else(|| Error::bad_index(token));
        }
        let external: i64 = side.parse().map_err(|_| Error::bad_index(token))?;
        let internal = external
            .checked_sub(offset)
            .ok_or_else(|| Error::bad_index(token))?;
        usize::try_from(internal).map_err(|_| Error::bad_index(token))
    }
}
