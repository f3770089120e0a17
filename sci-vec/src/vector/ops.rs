use super::Vector;
use crate::buffer::is_empty_value;
use crate::error::{Error, Result};
use crate::stats;
use itertools::Itertools;

impl Vector {
    /// Values rescaled so the finite range maps onto `[0, 1]`.
    ///
    /// Returned unchanged when every finite value is equal (or there are
    /// none). Empty elements stay empty.
    pub fn normalized(&self) -> Vec<f64> {
        stats::normalize(self.values())
    }

    /// Fill with the arithmetic sequence `start, start + step, ...` up to
    /// and including `stop`.
    pub fn fill_sequence(&mut self, start: f64, stop: f64, step: f64) -> Result<()> {
        if step == 0.0 || !step.is_finite() {
            return Err(Error::invalid_arg("step", "step must be finite and non-zero"));
        }
        if !start.is_finite() || !stop.is_finite() {
            return Err(Error::invalid_arg("start", "sequence bounds must be finite"));
        }
        let steps = ((stop - start) / step + 1e-9).floor();
        if steps < 0.0 {
            return Err(Error::invalid_arg("step", "step moves away from stop"));
        }
        // Infinite once `stop - start` or the quotient overflows.
        let n = (steps < usize::MAX as f64)
            .then(|| steps as usize)
            .and_then(|steps| steps.checked_add(1))
            .ok_or(Error::OutOfMemory {
                requested: usize::MAX,
            })?;
        self.change_length(n)?;
        for (i, slot) in self.values_mut().iter_mut().enumerate() {
            *slot = start + i as f64 * step;
        }
        Ok(())
    }

    /// Positions of the values within `[low, high]`.
    pub fn search(&self, low: f64, high: f64) -> Vec<usize> {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        self.values()
            .iter()
            .positions(|v| !is_empty_value(*v) && *v >= low && *v <= high)
            .collect()
    }

    /// The values with `density` linearly interpolated points inserted
    /// between each neighbouring pair.
    pub fn populated(&self, density: usize) -> Result<Vec<f64>> {
        let values = self.values();
        if values.len() < 2 {
            return Ok(values.to_vec());
        }
        let len = density
            .checked_add(1)
            .and_then(|per_gap| (values.len() - 1).checked_mul(per_gap))
            .and_then(|len| len.checked_add(1))
            .ok_or(Error::OutOfMemory {
                requested: usize::MAX,
            })?;
        let mut out = Vec::new();
        out.try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory { requested: len })?;
        let slope = 1.0 / (density as f64 + 1.0);
        for (a, b) in values.iter().copied().tuple_windows() {
            out.push(a);
            out.extend((1..=density).map(|k| a + (b - a) * k as f64 * slope));
        }
        out.extend(values.last().copied());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vector(values: &[f64]) -> Vector {
        Vector::from_values("v", values).expect("vector")
    }

    #[test]
    fn normalize_rescales_and_keeps_empty() {
        let v = vector(&[2.0, f64::NAN, 4.0, 3.0]);
        let n = v.normalized();
        assert_eq!(n[0], 0.0);
        assert!(n[1].is_nan());
        assert_eq!(n[2], 1.0);
        assert_relative_eq!(n[3], 0.5);
    }

    #[test]
    fn normalize_is_a_no_op_on_flat_vectors() {
        let v = vector(&[5.0, 5.0]);
        assert_eq!(v.normalized(), vec![5.0, 5.0]);
    }

    #[test]
    fn sequences_include_stop() {
        let mut v = Vector::new("v").expect("vector");
        v.fill_sequence(0.0, 1.0, 0.25).expect("seq");
        assert_eq!(v.values(), &[0.0, 0.25, 0.5, 0.75, 1.0]);

        v.fill_sequence(3.0, 1.0, -1.0).expect("descending seq");
        assert_eq!(v.values(), &[3.0, 2.0, 1.0]);

        assert!(v.fill_sequence(0.0, 1.0, 0.0).is_err());
        assert!(v.fill_sequence(0.0, 1.0, -1.0).is_err());
    }

    #[test]
    fn oversized_sequences_are_out_of_memory() {
        let mut v = vector(&[1.0, 2.0]);
        for (start, stop, step) in [(0.0, 1e300, 1e-300), (-1e308, 1e308, 1.0), (0.0, 1e30, 1.0)] {
            assert!(matches!(
                v.fill_sequence(start, stop, step),
                Err(Error::OutOfMemory { .. })
            ));
        }
        assert_eq!(v.values(), &[1.0, 2.0]);
    }

    #[test]
    fn search_skips_empty() {
        let v = vector(&[1.0, f64::NAN, 5.0, 3.0]);
        assert_eq!(v.search(2.0, 5.0), vec![2, 3]);
        assert_eq!(v.search(5.0, 2.0), vec![2, 3]);
    }

    #[test]
    fn populate_interpolates() {
        let v = vector(&[0.0, 4.0, 8.0]);
        assert_eq!(v.populated(1), Ok(vec![0.0, 2.0, 4.0, 6.0, 8.0]));
        assert_eq!(v.populated(0), Ok(vec![0.0, 4.0, 8.0]));
    }

    #[test]
    fn oversized_populate_is_out_of_memory() {
        let v = vector(&[0.0, 4.0, 8.0]);
        for density in [usize::MAX, usize::MAX / 2] {
            assert!(matches!(
                v.populated(density),
                Err(Error::OutOfMemory { .. })
            ));
        }
        assert_eq!(vector(&[3.0]).populated(usize::MAX), Ok(vec![3.0]));
    }
}
