//! Trait interfaces for the Fourier kernels.

use super::fft::{FftResult, InverseFftResult};
use crate::kernel::{ExecInvariantViolation, Read1D, Write1D};

/// Forward transform of a real signal.
pub trait Fft1D<T> {
    /// Transform `input`, padding it to the next power of two.
    fn run<I>(&self, input: &I) -> Result<FftResult, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// Inverse transform of a half spectrum.
pub trait InverseFft1D<T> {
    /// Reconstruct the time-domain signal from `real` and optional `imag`
    /// bins, DC first and Nyquist last.
    fn run<R, I>(&self, real: &R, imag: Option<&I>) -> Result<InverseFftResult, ExecInvariantViolation>
    where
        R: Read1D<T> + ?Sized,
        I: Read1D<T> + ?Sized;
}

/// Window weights applied before a transform.
pub trait WindowGenerate<T: Copy> {
    /// Weights for `len` samples of a signal padded to `padded`.
    fn run_alloc(&self, len: usize, padded: usize) -> Vec<T>;

    /// Write the weights for `out.len()` samples into `out`.
    fn run_into<O>(&self, padded: usize, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<T> + ?Sized,
    {
        let out = out.write_slice_mut().map_err(ExecInvariantViolation::from)?;
        if out.len() > padded {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: padded,
                got: out.len(),
            });
        }
        let weights = self.run_alloc(out.len(), padded);
        out.copy_from_slice(&weights);
        Ok(())
    }
}
