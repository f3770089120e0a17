//! Shared kernel substrate.
//!
//! Constructor validation and 1D read adapters used by the statistics,
//! sorting and Fourier kernels.

mod errors;
mod io;
mod lifecycle;

pub use errors::*;
pub use io::*;
pub use lifecycle::*;
