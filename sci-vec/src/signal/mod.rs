//! Fourier transforms of vectors.

pub mod fft;
pub mod traits;
pub mod windows;

pub use fft::{
    fft, inverse_fft, next_pow2, FftConfig, FftKernel, FftResult, InverseFftConfig,
    InverseFftKernel, InverseFftResult,
};
pub use windows::FftWindow;
