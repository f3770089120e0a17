//! Forward and inverse discrete Fourier transforms of vectors.
//!
//! The forward transform pads its input with zeros to the next power of
//! two `N` and keeps bins `0..=N/2`. The inverse transform takes such a half
//! spectrum, mirrors it with conjugate symmetry and scales by `1/N`.

use super::traits::{Fft1D, InverseFft1D, WindowGenerate};
use super::windows::FftWindow;
use crate::buffer::is_empty_value;
use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use tracing::debug;

/// Smallest power of two `>= n` (1 for an empty input).
pub fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

fn to_complex(values: &[f64], weights: &[f64], padded: usize) -> Vec<Complex<f64>> {
    let mut buf = vec![Complex::new(0.0, 0.0); padded];
    for ((dst, x), w) in buf.iter_mut().zip(values).zip(weights) {
        if !is_empty_value(*x) {
            *dst = Complex::new(x * w, 0.0);
        }
    }
    buf
}

/// Constructor config for [`FftKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FftConfig {
    /// Window applied to the source samples.
    pub window: FftWindow,
    /// Keep the DC (index 0) bin in the outputs.
    pub include_constant: bool,
    /// Double the spectrum of bins mirrored by negative frequencies.
    pub fold: bool,
    /// Sample spacing used for the frequency axis.
    pub delta: f64,
}

impl Default for FftConfig {
    fn default() -> Self {
        Self {
            window: FftWindow::Rectangular,
            include_constant: true,
            fold: true,
            delta: 1.0,
        }
    }
}

/// Output of the forward transform. Every vector holds one entry per kept
/// bin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FftResult {
    /// Transform length after padding.
    pub padded_len: usize,
    /// Unnormalized real parts.
    pub real: Vec<f64>,
    /// Unnormalized imaginary parts.
    pub imag: Vec<f64>,
    /// Normalized magnitudes.
    pub spectrum: Vec<f64>,
    /// Phase angles in radians.
    pub phase: Vec<f64>,
    /// Bin frequencies.
    pub frequencies: Vec<f64>,
}

/// Trait-first forward FFT kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FftKernel {
    config: FftConfig,
}

impl KernelLifecycle for FftKernel {
    type Config = FftConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if !(config.delta.is_finite() && config.delta > 0.0) {
            return Err(ConfigError::InvalidArgument {
                arg: "delta",
                reason: "sample spacing must be finite and > 0",
            });
        }
        Ok(Self { config })
    }
}

impl Fft1D<f64> for FftKernel {
    fn run<I>(&self, input: &I) -> Result<FftResult, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        if input.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "input" }.into());
        }
        let padded = next_pow2(input.len());
        let weights = self.config.window.run_alloc(input.len(), padded);
        let norm = self.config.window.norm(&weights, padded);
        debug!(len = input.len(), padded, norm, "forward fft");

        let mut buf = to_complex(input, &weights, padded);
        let mut planner = FftPlanner::<f64>::new();
        planner.plan_fft_forward(padded).process(&mut buf);

        let half = padded / 2;
        let first = usize::from(!self.config.include_constant);
        let bins = first..=half;
        let scale = 1.0 / (self.config.delta * padded as f64);
        let mut out = FftResult {
            padded_len: padded,
            ..FftResult::default()
        };
        for k in bins {
            let x = buf[k];
            let mut magnitude = x.norm() / norm;
            if self.config.fold && k > 0 && k < half {
                magnitude *= 2.0;
            }
            out.real.push(x.re);
            out.imag.push(x.im);
            out.spectrum.push(magnitude);
            out.phase.push(x.im.atan2(x.re));
            out.frequencies.push(k as f64 * scale);
        }
        Ok(out)
    }
}

/// Constructor config for [`InverseFftKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InverseFftConfig {
    /// The input starts at the DC bin. When false a zero DC bin is assumed.
    pub includes_constant: bool,
}

impl Default for InverseFftConfig {
    fn default() -> Self {
        Self {
            includes_constant: true,
        }
    }
}

/// Output of the inverse transform, `N` samples each.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InverseFftResult {
    /// Real parts of the reconstructed signal.
    pub real: Vec<f64>,
    /// Imaginary parts; near zero for a conjugate-symmetric spectrum.
    pub imag: Vec<f64>,
}

/// Trait-first inverse FFT kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InverseFftKernel {
    includes_constant: bool,
}

impl KernelLifecycle for InverseFftKernel {
    type Config = InverseFftConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self {
            includes_constant: config.includes_constant,
        })
    }
}

impl InverseFft1D<f64> for InverseFftKernel {
    fn run<R, I>(&self, real: &R, imag: Option<&I>) -> Result<InverseFftResult, ExecInvariantViolation>
    where
        R: Read1D<f64> + ?Sized,
        I: Read1D<f64> + ?Sized,
    {
        let real = real.read_slice().map_err(ExecInvariantViolation::from)?;
        let imag = match imag {
            Some(imag) => Some(imag.read_slice().map_err(ExecInvariantViolation::from)?),
            None => None,
        };
        if real.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "real" }.into());
        }
        if let Some(imag) = imag {
            if imag.len() != real.len() {
                return Err(ExecInvariantViolation::LengthMismatch {
                    arg: "imag",
                    expected: real.len(),
                    got: imag.len(),
                });
            }
        }

        let lead = usize::from(!self.includes_constant);
        let bins = real.len() + lead;
        let padded = if bins <= 1 { 1 } else { next_pow2(2 * (bins - 1)) };
        debug!(bins, padded, "inverse fft");

        let mut buf = vec![Complex::new(0.0, 0.0); padded];
        for (i, re) in real.iter().enumerate() {
            let im = imag.map_or(0.0, |imag| imag[i]);
            buf[i + lead] = Complex::new(
                if is_empty_value(*re) { 0.0 } else { *re },
                if is_empty_value(im) { 0.0 } else { im },
            );
        }
        for k in 1..padded / 2 {
            buf[padded - k] = buf[k].conj();
        }

        let mut planner = FftPlanner::<f64>::new();
        planner.plan_fft_inverse(padded).process(&mut buf);
        let scale = 1.0 / padded as f64;
        Ok(InverseFftResult {
            real: buf.iter().map(|c| c.re * scale).collect(),
            imag: buf.iter().map(|c| c.im * scale).collect(),
        })
    }
}

/// Forward transform with `config`.
pub fn fft(input: &[f64], config: FftConfig) -> Result<FftResult, ExecInvariantViolation> {
    let kernel = FftKernel::try_new(config).map_err(ExecInvariantViolation::from)?;
    kernel.run(input)
}

/// Inverse transform of a half spectrum that starts at the DC bin.
pub fn inverse_fft(
    real: &[f64],
    imag: Option<&[f64]>,
) -> Result<InverseFftResult, ExecInvariantViolation> {
    let kernel = InverseFftKernel::try_new(InverseFftConfig::default())
        .map_err(ExecInvariantViolation::from)?;
    kernel.run(real, imag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn constant_signal_has_only_dc() {
        let out = fft(&[1.0, 1.0, 1.0, 1.0], FftConfig::default()).expect("fft");
        assert_eq!(out.padded_len, 4);
        assert_eq!(out.real.len(), 3);
        assert_abs_diff_eq!(out.real[0], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.spectrum[0], 1.0, epsilon = 1e-12);
        for k in 1..3 {
            assert_abs_diff_eq!(out.real[k], 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(out.imag[k], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn pads_to_power_of_two_and_drops_dc_on_request() {
        let config = FftConfig {
            include_constant: false,
            delta: 0.5,
            ..FftConfig::default()
        };
        let out = fft(&[1.0, 2.0, 3.0, 4.0, 5.0], config).expect("fft");
        assert_eq!(out.padded_len, 8);
        assert_eq!(out.frequencies.len(), 4);
        assert_abs_diff_eq!(out.frequencies[0], 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(out.frequencies[3], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn folding_doubles_interior_bins() {
        let signal: Vec<f64> = (0..8)
            .map(|i| (core::f64::consts::PI * i as f64 / 2.0).cos())
            .collect();
        let folded = fft(&signal, FftConfig::default()).expect("fft");
        let unfolded = fft(
            &signal,
            FftConfig {
                fold: false,
                ..FftConfig::default()
            },
        )
        .expect("fft");
        assert_abs_diff_eq!(folded.spectrum[2], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(unfolded.spectrum[2], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(folded.phase[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn bartlett_normalizes_by_window_sum() {
        let config = FftConfig {
            window: FftWindow::Bartlett,
            ..FftConfig::default()
        };
        let out = fft(&[1.0; 8], config).expect("fft");
        // DC = sum of weights, divided by the same sum.
        assert_abs_diff_eq!(out.real[0], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.spectrum[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_elements_are_zero() {
        let a = fft(&[1.0, f64::NAN, 3.0, 0.0], FftConfig::default()).expect("fft");
        let b = fft(&[1.0, 0.0, 3.0, 0.0], FftConfig::default()).expect("fft");
        assert_eq!(a, b);
    }

    #[test]
    fn inverse_recovers_the_signal() {
        let signal = [0.5, -1.0, 2.0, 3.5, 0.0, 1.0, -2.0, 4.0];
        let forward = fft(&signal, FftConfig::default()).expect("fft");
        let back = inverse_fft(&forward.real, Some(&forward.imag)).expect("ifft");
        assert_eq!(back.real.len(), 8);
        for (a, b) in back.real.iter().zip(signal.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        }
        for im in back.imag {
            assert_abs_diff_eq!(im, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn inverse_without_dc_bin() {
        let signal = [1.0, -1.0, 1.0, -1.0];
        let forward = fft(
            &signal,
            FftConfig {
                include_constant: false,
                ..FftConfig::default()
            },
        )
        .expect("fft");
        let kernel = InverseFftKernel::try_new(InverseFftConfig {
            includes_constant: false,
        })
        .expect("kernel");
        let back = kernel.run(&forward.real, Some(&forward.imag)).expect("ifft");
        for (a, b) in back.real.iter().zip(signal.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn validation() {
        assert_eq!(
            fft(&[], FftConfig::default()).map(|out| out.padded_len),
            Err(ExecInvariantViolation::Config(ConfigError::EmptyInput {
                arg: "input"
            }))
        );
        assert_eq!(
            inverse_fft(&[], None).map(|out| out.real),
            Err(ExecInvariantViolation::Config(ConfigError::EmptyInput {
                arg: "real"
            }))
        );
        assert!(matches!(
            FftKernel::try_new(FftConfig {
                delta: 0.0,
                ..FftConfig::default()
            }),
            Err(ConfigError::InvalidArgument { arg: "delta", .. })
        ));
        assert_eq!(
            inverse_fft(&[1.0, 2.0], Some(&[0.0])),
            Err(ExecInvariantViolation::LengthMismatch {
                arg: "imag",
                expected: 2,
                got: 1
            })
        );
    }
}
