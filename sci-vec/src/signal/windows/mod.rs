//! Windows applied to a signal before the forward transform.

use crate::signal::traits::WindowGenerate;

/// Window applied to the source samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FftWindow {
    /// Every sample weighted 1.
    #[default]
    Rectangular,
    /// Triangular window peaking at the middle of the padded length.
    Bartlett,
}

impl FftWindow {
    /// Normalization factor for a transform of `padded` points: the sum of
    /// the weights for a tapered window, `padded` otherwise.
    pub fn norm(self, weights: &[f64], padded: usize) -> f64 {
        match self {
            FftWindow::Rectangular => padded as f64,
            FftWindow::Bartlett => {
                let sum: f64 = weights.iter().sum();
                if sum > 0.0 {
                    sum
                } else {
                    padded as f64
                }
            }
        }
    }
}

impl WindowGenerate<f64> for FftWindow {
    fn run_alloc(&self, len: usize, padded: usize) -> Vec<f64> {
        match self {
            FftWindow::Bartlett if padded >= 2 => {
                let half = padded as f64 * 0.5;
                (0..len)
                    .map(|i| 1.0 - ((i as f64 - half) / half).abs())
                    .collect()
            }
            _ => vec![1.0; len],
        }
    }
}
