//! Statistics over vector values.
//!
//! Every reducer skips empty (NaN) elements and only looks at finite
//! values. Sums are Kahan-compensated.

use crate::buffer::is_empty_value;
use crate::error::Error;
use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D};
use core::cmp::Ordering;
use core::str::FromStr;
use num_traits::Float;

/// 1D reduction capability.
pub trait Reduce1D<T> {
    /// Compute the statistic and the number of finite samples it covered.
    fn run<I>(&self, input: &I) -> Result<(T, usize), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// Scalar statistics known to [`StatsKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    /// Kahan-compensated sum.
    Sum,
    /// Product.
    Prod,
    /// Arithmetic mean.
    Mean,
    /// Sample variance.
    Variance,
    /// Sample standard deviation.
    Stdev,
    /// Average absolute deviation from the mean.
    Adev,
    /// Third standardized moment.
    Skew,
    /// Excess kurtosis.
    Kurtosis,
    /// Median.
    Median,
    /// First quartile.
    Q1,
    /// Third quartile.
    Q3,
    /// Smallest finite value.
    Min,
    /// Largest finite value.
    Max,
}

impl Statistic {
    /// Evaluate over `y`.
    pub fn evaluate(self, y: &[f64]) -> f64 {
        match self {
            Statistic::Sum => sum(y),
            Statistic::Prod => prod(y),
            Statistic::Mean => mean(y),
            Statistic::Variance => variance(y),
            Statistic::Stdev => stdev(y),
            Statistic::Adev => adev(y),
            Statistic::Skew => skew(y),
            Statistic::Kurtosis => kurtosis(y),
            Statistic::Median => median(y),
            Statistic::Q1 => q1(y),
            Statistic::Q3 => q3(y),
            Statistic::Min => min(y),
            Statistic::Max => max(y),
        }
    }
}

/// Config for [`StatsKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsConfig {
    /// Which statistic the kernel computes.
    pub statistic: Statistic,
}

/// Trait-first statistics kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsKernel {
    statistic: Statistic,
}

impl KernelLifecycle for StatsKernel {
    type Config = StatsConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self {
            statistic: config.statistic,
        })
    }
}

impl Reduce1D<f64> for StatsKernel {
    fn run<I>(&self, input: &I) -> Result<(f64, usize), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        Ok((self.statistic.evaluate(input), finite(input).count()))
    }
}

/// Classification used by the count and indices queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    /// Empty (NaN) elements.
    Empty,
    /// Elements exactly equal to zero.
    Zero,
    /// Non-empty elements other than zero.
    Nonzero,
    /// Any non-empty element.
    Nonempty,
}

impl ElementClass {
    /// Whether `value` belongs to this class.
    pub fn matches(self, value: f64) -> bool {
        match self {
            ElementClass::Empty => is_empty_value(value),
            ElementClass::Zero => value == 0.0,
            ElementClass::Nonzero => !is_empty_value(value) && value != 0.0,
            ElementClass::Nonempty => !is_empty_value(value),
        }
    }
}

impl FromStr for ElementClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('-') {
            "empty" => Ok(ElementClass::Empty),
            "zero" => Ok(ElementClass::Zero),
            "nonzero" => Ok(ElementClass::Nonzero),
            "nonempty" => Ok(ElementClass::Nonempty),
            other => Err(Error::invalid_arg(
                other,
                "expected one of empty, zero, nonzero, nonempty",
            )),
        }
    }
}

/// Count the elements of `y` in `class`.
///
/// ```
/// use sci_vec::stats::{count, ElementClass};
///
/// let y = [1.0, f64::NAN, 3.0, 0.0];
/// assert_eq!(count(&y, ElementClass::Nonempty), 3);
/// assert_eq!(count(&y, ElementClass::Empty), 1);
/// assert_eq!(count(&y, ElementClass::Nonzero), 2);
/// ```
pub fn count(y: &[f64], class: ElementClass) -> usize {
    y.iter().filter(|v| class.matches(**v)).count()
}

/// Positions of the elements of `y` in `class`.
pub fn indices(y: &[f64], class: ElementClass) -> Vec<usize> {
    y.iter()
        .enumerate()
        .filter(|(_, v)| class.matches(**v))
        .map(|(i, _)| i)
        .collect()
}

/// Iterate over the finite values of `y`.
pub fn finite<F: Float>(y: &[F]) -> impl Iterator<Item = F> + Clone + '_ {
    y.iter().copied().filter(|v| v.is_finite())
}

/// Kahan-compensated sum of an iterator.
pub fn kahan_sum<F, YI>(y: YI) -> F
where
    F: Float,
    YI: Iterator<Item = F>,
{
    let mut sum = F::zero();
    // Compensation for lost low-order bits
    let mut c = F::zero();
    for v in y {
        let t = v - c;
        let next = sum + t;
        c = (next - sum) - t;
        sum = next;
    }
    sum
}

///
/// Sum of the finite values of `y`.
///
/// ```
/// use sci_vec::stats::sum;
///
/// let y = [1.0, f64::NAN, 3.0];
/// assert_eq!(4.0, sum(&y));
///
/// let y: [f64; 0] = [];
/// assert_eq!(0.0, sum(&y));
/// ```
///
pub fn sum<F: Float>(y: &[F]) -> F {
    kahan_sum(finite(y))
}

/// Product of the finite values of `y`; 1 when there are none.
pub fn prod<F: Float>(y: &[F]) -> F {
    finite(y).fold(F::one(), |acc, v| acc * v)
}

///
/// Mean of the finite values of `y`, empty (NaN) when there are none.
///
/// ```
/// use approx::assert_relative_eq;
/// use sci_vec::stats::mean;
///
/// let y = [1.0, f64::NAN, 3.0];
/// assert_relative_eq!(2.0, mean(&y));
///
/// let y: [f64; 0] = [];
/// assert!(mean(&y).is_nan());
/// ```
///
pub fn mean<F: Float>(y: &[F]) -> F {
    let n = finite(y).count();
    if n == 0 {
        return F::nan();
    }
    sum(y) / F::from(n).unwrap_or_else(F::one)
}

fn deviations<F: Float>(y: &[F]) -> (F, usize, impl Iterator<Item = F> + Clone + '_) {
    let avg = mean(y);
    let n = finite(y).count();
    (avg, n, finite(y).map(move |v| v - avg))
}

///
/// Sample variance (`n - 1` denominator) of the finite values of `y`.
///
/// Fewer than two finite values give `0.0`.
///
/// ```
/// use approx::assert_relative_eq;
/// use sci_vec::stats::variance;
///
/// let y = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_relative_eq!(2.5, variance(&y));
///
/// assert_eq!(0.0, variance(&[7.0]));
/// ```
///
pub fn variance<F: Float>(y: &[F]) -> F {
    let (_, n, deltas) = deviations(y);
    if n < 2 {
        return F::zero();
    }
    let ss = kahan_sum(deltas.map(|d| d * d));
    ss / F::from(n - 1).unwrap_or_else(F::one)
}

/// Sample standard deviation; `0.0` unless the variance is positive.
pub fn stdev<F: Float>(y: &[F]) -> F {
    let var = variance(y);
    if var > F::zero() {
        var.sqrt()
    } else {
        F::zero()
    }
}

/// Average absolute deviation from the mean; `0.0` for fewer than two values.
pub fn adev<F: Float>(y: &[F]) -> F {
    let (_, n, deltas) = deviations(y);
    if n < 2 {
        return F::zero();
    }
    kahan_sum(deltas.map(|d| d.abs())) / F::from(n).unwrap_or_else(F::one)
}

/// Skewness, the third standardized moment.
pub fn skew<F: Float>(y: &[F]) -> F {
    let (_, n, deltas) = deviations(y);
    let var = variance(y);
    if n < 2 || var == F::zero() {
        return F::zero();
    }
    let n = F::from(n).unwrap_or_else(F::one);
    let m3 = kahan_sum(deltas.map(|d| d * d * d));
    m3 / (n * var * var.sqrt())
}

///
/// Excess kurtosis, the fourth standardized moment minus 3.
///
/// ```
/// use approx::assert_relative_eq;
/// use sci_vec::stats::kurtosis;
///
/// let y = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_relative_eq!(-1.912, kurtosis(&y), epsilon = 1e-12);
/// ```
///
pub fn kurtosis<F: Float>(y: &[F]) -> F {
    let (_, n, deltas) = deviations(y);
    let var = variance(y);
    if n < 2 || var == F::zero() {
        return F::zero();
    }
    let n = F::from(n).unwrap_or_else(F::one);
    let m4 = kahan_sum(deltas.map(|d| d * d * d * d));
    m4 / (n * var * var) - F::from(3.0).unwrap_or_else(F::zero)
}

/// Smallest finite value, empty when there is none.
pub fn min<F: Float>(y: &[F]) -> F {
    finite(y).reduce(F::min).unwrap_or_else(F::nan)
}

/// Largest finite value, empty when there is none.
pub fn max<F: Float>(y: &[F]) -> F {
    finite(y).reduce(F::max).unwrap_or_else(F::nan)
}

/// The finite values of `y` in ascending order.
pub fn sorted_finite<F: Float>(y: &[F]) -> Vec<F> {
    let mut sorted: Vec<F> = finite(y).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

///
/// Median of the finite values of `y`.
///
/// ```
/// use approx::assert_relative_eq;
/// use sci_vec::stats::median;
///
/// assert_relative_eq!(3.0, median(&[5.0, 1.0, 3.0, 2.0, 4.0]));
/// assert_relative_eq!(2.5, median(&[1.0, 2.0, 3.0, 4.0]));
/// assert!(median::<f64>(&[]).is_nan());
/// ```
///
pub fn median<F: Float>(y: &[F]) -> F {
    let sorted = sorted_finite(y);
    let n = sorted.len();
    if n == 0 {
        return F::nan();
    }
    let mid = (n - 1) / 2;
    if n % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid] + sorted[mid + 1]) * half::<F>()
    }
}

///
/// First quartile by splitting at the midpoint of the sorted finite values.
///
/// Fewer than four values give the minimum. Otherwise, with
/// `mid = (n - 1) / 2` and `q = mid / 2`, an odd `mid` picks `sorted[q]`
/// and an even `mid` averages `sorted[q]` and `sorted[q + 1]`.
///
/// ```
/// use sci_vec::stats::q1;
///
/// assert_eq!(1.0, q1(&[4.0, 3.0, 2.0, 1.0]));
/// assert_eq!(3.5, q1(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]));
/// assert_eq!(2.0, q1(&[3.0, 2.0, 5.0]));
/// ```
///
pub fn q1<F: Float>(y: &[F]) -> F {
    let sorted = sorted_finite(y);
    let n = sorted.len();
    if n == 0 {
        return F::nan();
    }
    if n < 4 {
        return sorted[0];
    }
    let mid = (n - 1) / 2;
    let q = mid / 2;
    if mid % 2 == 1 {
        sorted[q]
    } else {
        (sorted[q] + sorted[q + 1]) * half::<F>()
    }
}

///
/// Third quartile, mirroring [`q1`] on the upper half.
///
/// Fewer than four values give the maximum. Otherwise, with
/// `mid = (n - 1) / 2` and `q = (n + mid) / 2`, an odd `mid` picks
/// `sorted[q]` and an even `mid` averages `sorted[q]` and `sorted[q + 1]`.
///
/// ```
/// use sci_vec::stats::q3;
///
/// assert_eq!(3.0, q3(&[4.0, 3.0, 2.0, 1.0]));
/// assert_eq!(7.5, q3(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]));
/// assert_eq!(5.0, q3(&[3.0, 2.0, 5.0]));
/// ```
///
pub fn q3<F: Float>(y: &[F]) -> F {
    let sorted = sorted_finite(y);
    let n = sorted.len();
    if n == 0 {
        return F::nan();
    }
    if n < 4 {
        return sorted[n - 1];
    }
    let mid = (n - 1) / 2;
    let q = (n + mid) / 2;
    if mid % 2 == 1 {
        sorted[q]
    } else {
        (sorted[q] + sorted[q + 1]) * half::<F>()
    }
}

/// Rescale `y` so its finite range maps onto `[0, 1]`.
///
/// Returned unchanged when every finite value is equal (or there are none).
/// Empty elements stay empty.
///
/// ```
/// use sci_vec::stats::normalize;
///
/// assert_eq!(normalize(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
/// assert_eq!(normalize(&[5.0, 5.0]), vec![5.0, 5.0]);
/// ```
pub fn normalize(y: &[f64]) -> Vec<f64> {
    let (lo, hi) = (min(y), max(y));
    let range = hi - lo;
    if !range.is_finite() || range == 0.0 {
        return y.to_vec();
    }
    y.iter().map(|v| (v - lo) / range).collect()
}

fn half<F: Float>() -> F {
    F::from(0.5).unwrap_or_else(F::one)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    #[test]
    fn empty_elements_are_ignored() {
        let y = [1.0, f64::NAN, 3.0];
        assert_eq!(count(&y, ElementClass::Nonempty), 2);
        assert_relative_eq!(mean(&y), 2.0);
        assert_relative_eq!(sum(&y), 4.0);
        assert_eq!(indices(&y, ElementClass::Empty), vec![1]);
    }

    #[test]
    fn kahan_sum_recovers_small_terms() {
        let mut y = vec![1.0e16];
        y.extend(core::iter::repeat_n(1.0, 1000));
        y.push(-1.0e16);
        assert_relative_eq!(sum(&y), 1000.0);
    }

    #[test]
    fn degenerate_moments_are_zero() {
        assert_eq!(variance(&[3.0]), 0.0);
        assert_eq!(stdev(&[3.0, 3.0, 3.0]), 0.0);
        assert_eq!(skew(&[2.0, 2.0]), 0.0);
        assert_eq!(kurtosis(&[f64::NAN, 1.0]), 0.0);
    }

    #[test]
    fn skew_sign_follows_the_tail() {
        assert!(skew(&[1.0, 1.0, 1.0, 10.0]) > 0.0);
        assert!(skew(&[-10.0, 1.0, 1.0, 1.0]) < 0.0);
        assert_relative_eq!(skew(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn quartiles_of_four_values() {
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(median(&y), 2.5);
        assert_relative_eq!(q1(&y), 1.0);
        assert_relative_eq!(q3(&y), 3.0);
    }

    #[test]
    fn quartiles_of_even_midpoint() {
        // n = 5: mid = 2, q1 index 1, q3 index 3
        let y = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert_relative_eq!(q1(&y), 2.5);
        assert_relative_eq!(q3(&y), 4.5);
    }

    #[test]
    fn extrema_skip_empty() {
        let y = [f64::NAN, -2.0, 7.0, f64::NAN];
        assert_eq!(min(&y), -2.0);
        assert_eq!(max(&y), 7.0);
        assert!(min::<f64>(&[f64::NAN]).is_nan());
    }

    #[test]
    fn kernel_matches_free_functions() {
        let input = Array1::from(vec![6.0, 7.0, 7.0, 8.0, 12.0, 14.0, 15.0, f64::NAN]);
        for statistic in [
            Statistic::Mean,
            Statistic::Variance,
            Statistic::Median,
            Statistic::Q3,
        ] {
            let kernel = StatsKernel::try_new(StatsConfig { statistic }).expect("kernel");
            let (value, n) = kernel.run(&input).expect("run");
            assert_eq!(n, 7);
            let slice = input.as_slice().expect("contiguous");
            assert_relative_eq!(value, statistic.evaluate(slice));
        }
    }

    #[test]
    fn element_class_parses_with_or_without_dash() {
        assert_eq!("-nonzero".parse::<ElementClass>(), Ok(ElementClass::Nonzero));
        assert_eq!("empty".parse::<ElementClass>(), Ok(ElementClass::Empty));
        assert!("bogus".parse::<ElementClass>().is_err());
    }
}
