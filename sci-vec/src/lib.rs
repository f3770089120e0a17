//! Observable numeric vectors for an embedding interpreter.
//!
//! A [`VectorStore`] owns named [`Vector`]s of `f64`, where NaN marks an
//! empty element. On top of the store sit
//!
//! - an expression language evaluated element-wise over whole vectors
//!   ([`expr`]),
//! - statistics that skip empty elements ([`stats`]),
//! - reentrant multi-key sorting ([`sort`]),
//! - forward and inverse FFTs ([`signal`]),
//! - binary import and export ([`codec`]),
//! - client notification with idle-time coalescing ([`notify`]).
//!
//! Hosts that prefer a verb interface drive the store through
//! [`command::Command`].
//!
//! ```
//! use sci_vec::expr::NoHost;
//! use sci_vec::VectorStore;
//!
//! let mut store = VectorStore::default();
//! let x = store.create(Some("x")).unwrap();
//! store.update(x, |v| v.set_values(&[1.0, f64::NAN, 3.0])).unwrap();
//!
//! let doubled = store.evaluate("x * 2", &mut NoHost).unwrap();
//! assert_eq!(doubled.as_slice()[0], 2.0);
//! assert!(doubled.as_slice()[1].is_nan());
//! assert_eq!(store.evaluate("mean(x)", &mut NoHost).unwrap().as_slice(), &[2.0]);
//! ```

pub mod buffer;
pub mod codec;
pub mod command;
mod error;
pub mod expr;
pub mod index;
pub mod kernel;
pub mod notify;
pub mod signal;
pub mod sort;
pub mod stats;
pub mod store;
pub mod vector;

pub use buffer::ValueBuffer;
pub use command::{Command, Reply};
pub use error::{Error, Result};
pub use store::{StoreConfig, VectorId, VectorStore};
pub use vector::Vector;
