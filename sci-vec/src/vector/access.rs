use super::Vector;
use crate::error::{Error, Result};
use crate::index::{Index, IndexMode, IndexResolver};

/// Result of reading an index token.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    /// A single element or aggregate.
    Scalar(f64),
    /// The elements of a range, in visiting order.
    List(Vec<f64>),
}

impl Vector {
    /// Read the element, range or aggregate named by `token`.
    pub fn read_index(&self, resolver: &IndexResolver, token: &str) -> Result<IndexValue> {
        let values = self.values();
        match resolver.resolve(token, self.len(), self.offset(), IndexMode::Read)? {
            Index::Element(i) => Ok(IndexValue::Scalar(values[i])),
            Index::Aggregate(aggregate) => Ok(IndexValue::Scalar(aggregate(values))),
            range @ Index::Range { .. } => Ok(IndexValue::List(
                range.positions().into_iter().map(|i| values[i]).collect(),
            )),
            Index::Append => Err(Error::bad_index(token)),
        }
    }

    /// Write `value` to the element or range named by `token`.
    ///
    /// One past the end appends; a range is filled whatever its direction.
    pub fn write_index(&mut self, resolver: &IndexResolver, token: &str, value: f64) -> Result<()> {
        let index = resolver.resolve(token, self.len(), self.offset(), IndexMode::Write)?;
        match index {
            Index::Element(i) => self.set(i, value),
            Index::Append => self.set(self.len(), value),
            Index::Range { .. } => {
                let (low, high) = index.span().ok_or_else(|| Error::bad_index(token))?;
                self.fill(low, high, value)
            }
            Index::Aggregate(_) => Err(Error::bad_index(token)),
        }
    }

    /// Remove the element or span named by `token`, shifting the tail down.
    pub fn unset_index(&mut self, resolver: &IndexResolver, token: &str) -> Result<()> {
        let index = resolver.resolve(token, self.len(), self.offset(), IndexMode::Read)?;
        match index.span() {
            Some((low, high)) => self.remove_span(low, high),
            None => Err(Error::bad_index(token)),
        }
    }

    /// Remove every element named by `tokens`.
    ///
    /// All tokens are resolved against the current contents before anything
    /// is removed, so a bad token leaves the vector unchanged.
    pub fn delete_indices<S: AsRef<str>>(
        &mut self,
        resolver: &IndexResolver,
        tokens: &[S],
    ) -> Result<()> {
        let mut doomed = vec![false; self.len()];
        for token in tokens {
            let token = token.as_ref();
            let index = resolver.resolve(token, self.len(), self.offset(), IndexMode::Read)?;
            let (low, high) = index.span().ok_or_else(|| Error::bad_index(token))?;
            doomed[low..=high].fill(true);
        }
        let kept: Vec<f64> = self
            .values()
            .iter()
            .zip(doomed.iter())
            .filter(|(_, gone)| !**gone)
            .map(|(v, _)| *v)
            .collect();
        self.set_values(&kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: &[f64]) -> Vector {
        Vector::from_values("v", values).expect("vector")
    }

    #[test]
    fn reads_elements_ranges_and_aggregates() {
        let resolver = IndexResolver::default();
        let v = vector(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(v.read_index(&resolver, "end"), Ok(IndexValue::Scalar(4.0)));
        assert_eq!(
            v.read_index(&resolver, "2:0"),
            Ok(IndexValue::List(vec![3.0, 2.0, 1.0]))
        );
        assert_eq!(v.read_index(&resolver, "sum"), Ok(IndexValue::Scalar(10.0)));
        assert!(v.read_index(&resolver, "4").is_err());
    }

    #[test]
    fn writes_append_and_fill() {
        let resolver = IndexResolver::default();
        let mut v = vector(&[1.0, 2.0]);
        v.write_index(&resolver, "2", 3.0).expect("append by index");
        v.write_index(&resolver, "++end", 4.0).expect("append by alias");
        assert_eq!(v.values(), &[1.0, 2.0, 3.0, 4.0]);

        v.write_index(&resolver, "end:1", 0.0).expect("reverse fill");
        assert_eq!(v.values(), &[1.0, 0.0, 0.0, 0.0]);
        assert!(v.write_index(&resolver, "min", 1.0).is_err());
        assert!(v.write_index(&resolver, "9", 1.0).is_err());
    }

    #[test]
    fn unset_compacts_a_span() {
        let resolver = IndexResolver::default();
        let mut v = vector(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        v.unset_index(&resolver, "1:2").expect("unset range");
        assert_eq!(v.values(), &[0.0, 3.0, 4.0]);
        v.unset_index(&resolver, "0").expect("unset element");
        assert_eq!(v.values(), &[3.0, 4.0]);
        assert!(v.unset_index(&resolver, "mean").is_err());
    }

    #[test]
    fn delete_is_all_or_nothing() {
        let resolver = IndexResolver::default();
        let mut v = vector(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(v.delete_indices(&resolver, &["1", "7"]).is_err());
        assert_eq!(v.len(), 5);

        v.delete_indices(&resolver, &["end", "0", "1:2"]).expect("delete");
        assert_eq!(v.values(), &[3.0]);
    }
}
