//! Verbs that read or write several vectors of a store at once.
//!
//! Each verb computes its complete result before touching any target, so a
//! failure leaves every vector as it was.

use super::{VectorId, VectorStore};
use crate::codec::{self, ByteOrder, NumericFormat};
use crate::error::{Error, Result};
use crate::kernel::{ExecInvariantViolation, KernelLifecycle};
use crate::signal::traits::{Fft1D, InverseFft1D};
use crate::signal::{FftConfig, FftKernel, InverseFftConfig, InverseFftKernel};
use crate::sort::{apply_permutation, SortConfig, SortKernel};
use crate::stats::{self, ElementClass, Statistic};
use itertools::Itertools;
use tracing::debug;

/// Destinations of a forward transform. Outputs without a target are
/// discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FftTargets {
    /// Real parts.
    pub real: Option<VectorId>,
    /// Imaginary parts.
    pub imag: Option<VectorId>,
    /// Normalized magnitudes.
    pub spectrum: Option<VectorId>,
    /// Phase angles.
    pub phase: Option<VectorId>,
    /// Frequency axis.
    pub frequencies: Option<VectorId>,
}

impl FftTargets {
    fn named(&self) -> impl Iterator<Item = (&'static str, VectorId)> {
        [
            ("real", self.real),
            ("imag", self.imag),
            ("spectrum", self.spectrum),
            ("phase", self.phase),
            ("frequencies", self.frequencies),
        ]
        .into_iter()
        .filter_map(|(arg, id)| id.map(|id| (arg, id)))
    }
}

// Rejects a target equal to a source, then targets repeated among
// themselves.
fn check_targets(sources: &[VectorId], targets: &[(&'static str, VectorId)]) -> Result<()> {
    if let Some((arg, _)) = targets.iter().find(|(_, t)| sources.contains(t)) {
        return Err(ExecInvariantViolation::Aliased { arg: *arg }.into());
    }
    if let Some((arg, _)) = targets.iter().duplicates_by(|(_, t)| *t).next() {
        return Err(Error::invalid_arg(*arg, "each output needs its own vector"));
    }
    Ok(())
}

impl VectorStore {
    fn values_of(&self, id: VectorId) -> Result<Vec<f64>> {
        Ok(self.get(id)?.values().to_vec())
    }

    // Apply precomputed contents to several vectors, notifying only once
    // every target holds its new values.
    fn commit(&mut self, writes: Vec<(VectorId, Vec<f64>)>) -> Result<()> {
        let ids: Vec<VectorId> = writes.iter().map(|(id, _)| *id).collect();
        for (id, values) in writes {
            self.get_mut(id)?.set_values(&values)?;
        }
        for id in ids {
            // An earlier callback may have destroyed a later target.
            if self.contains(id) {
                self.mark_dirty(id)?;
            }
        }
        Ok(())
    }

    /// Copy the values of `source` into `target`.
    pub fn dup(&mut self, source: VectorId, target: VectorId) -> Result<()> {
        let values = self.values_of(source)?;
        self.get(target)?;
        if source == target {
            return Ok(());
        }
        self.update(target, |vector| vector.set_values(&values))
    }

    /// Interleave `sources` row by row into `target`.
    ///
    /// Every source must have the same length.
    pub fn merge(&mut self, target: VectorId, sources: &[VectorId]) -> Result<()> {
        let columns = sources
            .iter()
            .map(|&id| self.values_of(id))
            .collect::<Result<Vec<_>>>()?;
        let rows = columns.first().map_or(0, Vec::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(Error::LengthMismatch {
                left: rows,
                right: bad.len(),
            });
        }
        let merged: Vec<f64> = (0..rows)
            .flat_map(|row| columns.iter().map(move |column| column[row]))
            .collect();
        self.get(target)?;
        self.update(target, |vector| vector.set_values(&merged))
    }

    /// Deal the values of `source` round-robin into `targets`, undoing
    /// [`VectorStore::merge`].
    pub fn split(&mut self, source: VectorId, targets: &[VectorId]) -> Result<()> {
        if targets.is_empty() {
            return Err(Error::invalid_arg("targets", "at least one target is required"));
        }
        let values = self.values_of(source)?;
        if values.len() % targets.len() != 0 {
            return Err(Error::invalid_arg(
                "targets",
                format!(
                    "{} values do not split evenly into {} vectors",
                    values.len(),
                    targets.len()
                ),
            ));
        }
        if targets.iter().duplicates().next().is_some() {
            return Err(Error::invalid_arg("targets", "each target must be distinct"));
        }
        for &id in targets {
            self.get(id)?;
        }
        let n = targets.len();
        let writes = targets
            .iter()
            .enumerate()
            .map(|(k, &id)| (id, values.iter().skip(k).step_by(n).copied().collect()))
            .collect();
        self.commit(writes)
    }

    /// Rescale `id` onto `[0, 1]`, in place or into `target`.
    pub fn normalize(&mut self, id: VectorId, target: Option<VectorId>) -> Result<()> {
        let normalized = self.get(id)?.normalized();
        let target = target.unwrap_or(id);
        self.get(target)?;
        self.update(target, |vector| vector.set_values(&normalized))
    }

    /// Sort `keys` and reorder `companions` along with them. Returns the
    /// permutation applied.
    ///
    /// With `config.unique` rows equal across every key collapse to one, and
    /// every vector shrinks accordingly.
    pub fn sort(
        &mut self,
        keys: &[VectorId],
        companions: &[VectorId],
        config: SortConfig,
    ) -> Result<Vec<usize>> {
        let key_values = keys
            .iter()
            .map(|&id| self.values_of(id))
            .collect::<Result<Vec<_>>>()?;
        let key_slices: Vec<&[f64]> = key_values.iter().map(Vec::as_slice).collect();
        let permutation = SortKernel::try_new(config)?.run(&key_slices)?;
        let rows = key_slices.first().map_or(0, |k| k.len());

        let mut writes = Vec::new();
        for &id in keys.iter().chain(companions).unique() {
            let values = self.values_of(id)?;
            if values.len() != rows {
                return Err(Error::LengthMismatch {
                    left: rows,
                    right: values.len(),
                });
            }
            writes.push((id, apply_permutation(&values, &permutation)));
        }
        debug!(rows, kept = permutation.len(), vectors = writes.len(), "sorted vectors");
        self.commit(writes)?;
        Ok(permutation)
    }

    /// Forward transform of `source` into `targets`. Returns the padded
    /// transform length.
    pub fn fft(&mut self, source: VectorId, targets: &FftTargets, config: FftConfig) -> Result<usize> {
        let named: Vec<_> = targets.named().collect();
        check_targets(&[source], &named)?;
        for (_, id) in &named {
            self.get(*id)?;
        }
        let kernel = FftKernel::try_new(config)?;
        let out = kernel.run(self.get(source)?.values())?;

        let padded = out.padded_len;
        let mut writes = Vec::with_capacity(named.len());
        let outputs = [
            (targets.real, out.real),
            (targets.imag, out.imag),
            (targets.spectrum, out.spectrum),
            (targets.phase, out.phase),
            (targets.frequencies, out.frequencies),
        ];
        for (target, values) in outputs {
            if let Some(id) = target {
                writes.push((id, values));
            }
        }
        self.commit(writes)?;
        Ok(padded)
    }

    /// Inverse transform of the half spectrum in `real` (and `imag`) into
    /// `target_real` (and `target_imag`).
    pub fn inverse_fft(
        &mut self,
        real: VectorId,
        imag: Option<VectorId>,
        target_real: VectorId,
        target_imag: Option<VectorId>,
        config: InverseFftConfig,
    ) -> Result<()> {
        let sources: Vec<VectorId> = core::iter::once(real).chain(imag).collect();
        let mut named = vec![("real", target_real)];
        named.extend(target_imag.map(|id| ("imag", id)));
        check_targets(&sources, &named)?;
        for (_, id) in &named {
            self.get(*id)?;
        }

        let kernel = InverseFftKernel::try_new(config)?;
        let imag_values = match imag {
            Some(id) => Some(self.get(id)?.values()),
            None => None,
        };
        let out = kernel.run(self.get(real)?.values(), imag_values)?;

        let mut writes = vec![(target_real, out.real)];
        writes.extend(target_imag.map(|id| (id, out.imag)));
        self.commit(writes)
    }

    /// Decode `bytes` into `id`. Values are appended, or written from
    /// position `at` onwards, growing the vector as needed. Returns the
    /// number of values read.
    pub fn binread(
        &mut self,
        id: VectorId,
        bytes: &[u8],
        format: NumericFormat,
        order: ByteOrder,
        at: Option<usize>,
    ) -> Result<usize> {
        let decoded = codec::decode(bytes, format, order)?;
        let count = decoded.len();
        self.update(id, |vector| {
            let at = at.unwrap_or(vector.len());
            if at > vector.len() {
                return Err(Error::bad_index(at.to_string()));
            }
            let end = at + count;
            if end > vector.len() {
                vector.change_length(end)?;
            }
            vector.values_mut()[at..end].copy_from_slice(&decoded);
            Ok(count)
        })
    }

    /// Encode the values of `id`.
    pub fn binwrite(
        &self,
        id: VectorId,
        format: NumericFormat,
        order: ByteOrder,
        skip_empty: bool,
    ) -> Result<Vec<u8>> {
        codec::encode(self.get(id)?.values(), format, order, skip_empty)
    }

    /// Fill `target` with the values of `source`, inserting `density`
    /// interpolated points between neighbours.
    pub fn populate(&mut self, target: VectorId, source: VectorId, density: usize) -> Result<()> {
        let values = self.get(source)?.populated(density)?;
        self.get(target)?;
        self.update(target, |vector| vector.set_values(&values))
    }

    /// Fill `id` with an arithmetic sequence.
    pub fn seq(&mut self, id: VectorId, start: f64, stop: f64, step: f64) -> Result<()> {
        self.update(id, |vector| vector.fill_sequence(start, stop, step))
    }

    /// External indices of the values within `[low, high]`. Without `high`
    /// the values equal to `low`.
    pub fn search(&self, id: VectorId, low: f64, high: Option<f64>) -> Result<Vec<i64>> {
        let vector = self.get(id)?;
        let offset = vector.offset();
        Ok(vector
            .search(low, high.unwrap_or(low))
            .into_iter()
            .map(|pos| pos as i64 + offset)
            .collect())
    }

    /// Number of elements of `id` in `class`.
    pub fn count(&self, id: VectorId, class: ElementClass) -> Result<usize> {
        Ok(stats::count(self.get(id)?.values(), class))
    }

    /// External indices of the elements of `id` in `class`.
    pub fn indices(&self, id: VectorId, class: ElementClass) -> Result<Vec<i64>> {
        let vector = self.get(id)?;
        let offset = vector.offset();
        Ok(stats::indices(vector.values(), class)
            .into_iter()
            .map(|pos| pos as i64 + offset)
            .collect())
    }

    /// `statistic` over the values of `id`.
    pub fn statistic(&self, id: VectorId, statistic: Statistic) -> Result<f64> {
        Ok(statistic.evaluate(self.get(id)?.values()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ClientEvent, NotifyCallback, NotifyPolicy};
    use approx::assert_abs_diff_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store_with(vectors: &[(&str, &[f64])]) -> (VectorStore, Vec<VectorId>) {
        let mut store = VectorStore::default();
        let ids = vectors
            .iter()
            .map(|(name, values)| {
                let id = store.create(Some(*name)).expect("create");
                store.update(id, |v| v.set_values(values)).expect("set");
                id
            })
            .collect();
        (store, ids)
    }

    fn values(store: &VectorStore, id: VectorId) -> Vec<f64> {
        store.get(id).expect("vector").values().to_vec()
    }

    #[test]
    fn merge_and_split_are_inverse() {
        let (mut store, ids) = store_with(&[
            ("x", &[1.0, 2.0, 3.0]),
            ("y", &[10.0, 20.0, 30.0]),
            ("xy", &[]),
            ("a", &[]),
            ("b", &[]),
        ]);
        store.merge(ids[2], &ids[..2]).expect("merge");
        assert_eq!(values(&store, ids[2]), vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0]);

        store.split(ids[2], &ids[3..]).expect("split");
        assert_eq!(values(&store, ids[3]), values(&store, ids[0]));
        assert_eq!(values(&store, ids[4]), values(&store, ids[1]));
    }

    #[test]
    fn merge_and_split_validate_shapes() {
        let (mut store, ids) = store_with(&[("x", &[1.0, 2.0]), ("y", &[1.0]), ("t", &[5.0])]);
        assert_eq!(
            store.merge(ids[2], &ids[..2]),
            Err(Error::LengthMismatch { left: 2, right: 1 })
        );
        assert_eq!(values(&store, ids[2]), vec![5.0]);

        store.update(ids[0], |v| v.set_values(&[1.0, 2.0, 3.0])).expect("set");
        assert!(matches!(
            store.split(ids[0], &ids[1..]),
            Err(Error::InvalidArg { .. })
        ));
        assert_eq!(values(&store, ids[1]), vec![1.0]);
    }

    #[test]
    fn sort_carries_companions_and_unique_shrinks() {
        let (mut store, ids) = store_with(&[
            ("k", &[3.0, 1.0, 3.0, 2.0]),
            ("c", &[30.0, 10.0, 31.0, 20.0]),
        ]);
        let perm = store
            .sort(&ids[..1], &ids[1..], SortConfig::default())
            .expect("sort");
        assert_eq!(perm, vec![1, 3, 0, 2]);
        assert_eq!(values(&store, ids[0]), vec![1.0, 2.0, 3.0, 3.0]);
        assert_eq!(values(&store, ids[1]), vec![10.0, 20.0, 30.0, 31.0]);

        let config = SortConfig {
            decreasing: true,
            unique: true,
        };
        store.sort(&ids[..1], &ids[1..], config).expect("sort");
        assert_eq!(values(&store, ids[0]), vec![3.0, 2.0, 1.0]);
        assert_eq!(values(&store, ids[1]), vec![30.0, 20.0, 10.0]);
    }

    #[test]
    fn sort_rejects_ragged_companions() {
        let (mut store, ids) = store_with(&[("k", &[2.0, 1.0]), ("c", &[1.0])]);
        assert!(store.sort(&ids[..1], &ids[1..], SortConfig::default()).is_err());
        assert_eq!(values(&store, ids[0]), vec![2.0, 1.0]);
    }

    #[test]
    fn fft_writes_requested_outputs_only() {
        let (mut store, ids) = store_with(&[("s", &[1.0, 1.0, 1.0, 1.0]), ("re", &[]), ("f", &[])]);
        let targets = FftTargets {
            real: Some(ids[1]),
            frequencies: Some(ids[2]),
            ..FftTargets::default()
        };
        assert_eq!(store.fft(ids[0], &targets, FftConfig::default()), Ok(4));
        let real = values(&store, ids[1]);
        assert_eq!(real.len(), 3);
        assert_abs_diff_eq!(real[0], 4.0, epsilon = 1e-12);
        assert_eq!(values(&store, ids[2]), vec![0.0, 0.25, 0.5]);
    }

    #[test]
    fn fft_rejects_aliasing() {
        let (mut store, ids) = store_with(&[("s", &[1.0, 2.0]), ("t", &[])]);
        let aliased = FftTargets {
            spectrum: Some(ids[0]),
            ..FftTargets::default()
        };
        assert_eq!(
            store.fft(ids[0], &aliased, FftConfig::default()),
            Err(Error::Kernel(ExecInvariantViolation::Aliased { arg: "spectrum" }))
        );
        let doubled = FftTargets {
            real: Some(ids[1]),
            imag: Some(ids[1]),
            ..FftTargets::default()
        };
        assert!(store.fft(ids[0], &doubled, FftConfig::default()).is_err());
        assert!(store
            .inverse_fft(ids[0], None, ids[0], None, InverseFftConfig::default())
            .is_err());
    }

    #[test]
    fn inverse_fft_round_trips_through_the_store() {
        let signal = [1.0, -2.0, 0.5, 3.0, 0.0, 1.0, -1.0, 2.0];
        let (mut store, ids) = store_with(&[("s", &signal), ("re", &[]), ("im", &[]), ("out", &[])]);
        let targets = FftTargets {
            real: Some(ids[1]),
            imag: Some(ids[2]),
            ..FftTargets::default()
        };
        store.fft(ids[0], &targets, FftConfig::default()).expect("fft");
        store
            .inverse_fft(ids[1], Some(ids[2]), ids[3], None, InverseFftConfig::default())
            .expect("inverse");
        let out = values(&store, ids[3]);
        assert_eq!(out.len(), signal.len());
        for (a, b) in out.iter().zip(signal) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn binread_appends_or_overwrites() {
        let (mut store, ids) = store_with(&[("v", &[9.0, 9.0, 9.0])]);
        let bytes = [1u8, 0, 2, 0];
        let read = store
            .binread(ids[0], &bytes, NumericFormat::I2, ByteOrder::Little, None)
            .expect("append");
        assert_eq!(read, 2);
        assert_eq!(values(&store, ids[0]), vec![9.0, 9.0, 9.0, 1.0, 2.0]);

        store
            .binread(ids[0], &bytes, NumericFormat::I2, ByteOrder::Little, Some(4))
            .expect("overwrite");
        assert_eq!(values(&store, ids[0]), vec![9.0, 9.0, 9.0, 1.0, 1.0, 2.0]);

        assert!(store
            .binread(ids[0], &bytes[..3], NumericFormat::I2, ByteOrder::Little, None)
            .is_err());
        assert!(store
            .binread(ids[0], &bytes, NumericFormat::I2, ByteOrder::Little, Some(7))
            .is_err());
        assert_eq!(values(&store, ids[0]).len(), 6);
    }

    #[test]
    fn binwrite_skips_empty_on_request() {
        let (store, ids) = store_with(&[("v", &[1.0, f64::NAN, 2.0])]);
        assert_eq!(
            store.binwrite(ids[0], NumericFormat::U1, ByteOrder::Big, true),
            Ok(vec![1, 2])
        );
        assert!(store
            .binwrite(ids[0], NumericFormat::U1, ByteOrder::Big, false)
            .is_err());
    }

    #[test]
    fn search_and_indices_report_external_positions() {
        let (mut store, ids) = store_with(&[("v", &[5.0, f64::NAN, 2.0, 0.0, 5.0])]);
        store.get_mut(ids[0]).expect("v").set_offset(10);
        assert_eq!(store.search(ids[0], 5.0, None), Ok(vec![10, 14]));
        assert_eq!(store.search(ids[0], 3.0, Some(-1.0)), Ok(vec![12, 13]));
        assert_eq!(store.indices(ids[0], ElementClass::Empty), Ok(vec![11]));
        assert_eq!(store.count(ids[0], ElementClass::Nonzero), Ok(3));
        assert_eq!(store.statistic(ids[0], Statistic::Sum), Ok(12.0));
    }

    #[test]
    fn populate_normalize_seq_and_dup() {
        let (mut store, ids) = store_with(&[("s", &[0.0, 4.0]), ("t", &[])]);
        store.populate(ids[1], ids[0], 3).expect("populate");
        assert_eq!(values(&store, ids[1]), vec![0.0, 1.0, 2.0, 3.0, 4.0]);

        store.normalize(ids[1], None).expect("normalize");
        assert_eq!(values(&store, ids[1]), vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        store.seq(ids[0], 1.0, 2.0, 0.5).expect("seq");
        assert_eq!(values(&store, ids[0]), vec![1.0, 1.5, 2.0]);
        assert!(store.seq(ids[0], 1.0, 2.0, 0.0).is_err());

        store.dup(ids[0], ids[1]).expect("dup");
        assert_eq!(values(&store, ids[1]), vec![1.0, 1.5, 2.0]);
        store.dup(ids[1], ids[1]).expect("self dup");
    }

    #[test]
    fn oversized_seq_and_populate_leave_targets_alone() {
        let (mut store, ids) = store_with(&[("s", &[0.0, 4.0]), ("t", &[7.0])]);
        store.run_idle();
        assert!(matches!(
            store.seq(ids[1], 0.0, 1e300, 1e-300),
            Err(Error::OutOfMemory { .. })
        ));
        assert!(matches!(
            store.populate(ids[1], ids[0], usize::MAX),
            Err(Error::OutOfMemory { .. })
        ));
        assert_eq!(values(&store, ids[1]), vec![7.0]);
        assert!(!store.is_pending(ids[1]).expect("pending"));
    }

    #[test]
    fn clients_see_every_output_written() {
        let (mut store, ids) = store_with(&[("xy", &[1.0, 10.0, 2.0, 20.0]), ("a", &[]), ("b", &[])]);
        store.set_notify_policy(ids[1], NotifyPolicy::Always).expect("policy");
        let seen: Rc<RefCell<Vec<f64>>> = Rc::default();
        let peek: NotifyCallback = {
            let seen = Rc::clone(&seen);
            let other = ids[2];
            Rc::new(move |store: &mut VectorStore, _: ClientEvent| {
                *seen.borrow_mut() = store.get(other).expect("b").values().to_vec();
            })
        };
        let _client = store.register_client(ids[1], Some(peek)).expect("register");

        store.split(ids[0], &ids[1..]).expect("split");
        assert_eq!(*seen.borrow(), vec![10.0, 20.0]);
        assert_eq!(values(&store, ids[1]), vec![1.0, 2.0]);
    }
}
