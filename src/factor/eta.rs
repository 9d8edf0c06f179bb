use super::storage::AreaFull;
use crate::algebra::FloatT;
use std::iter::zip;

/// Append-only file of eta vectors.
///
/// Each eta has a pivot index and a packed list of (index, value)
/// entries.  The file holds at most `capacity` entries in total.
#[derive(Debug, Clone)]
pub(crate) struct EtaFile<T> {
    start: Vec<usize>,
    pivot: Vec<usize>,
    index: Vec<usize>,
    value: Vec<T>,
    capacity: usize,
}

impl<T> EtaFile<T>
where
    T: FloatT,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            start: vec![0],
            pivot: Vec::new(),
            index: Vec::new(),
            value: Vec::new(),
            capacity,
        }
    }

    /// number of etas
    pub fn len(&self) -> usize {
        self.pivot.len()
    }

    /// number of stored entries across all etas
    pub fn number_elements(&self) -> usize {
        self.index.len()
    }

    pub fn free(&self) -> usize {
        self.capacity.saturating_sub(self.index.len())
    }

    pub fn pivot(&self, e: usize) -> usize {
        self.pivot[e]
    }

    pub fn indices(&self, e: usize) -> &[usize] {
        &self.index[self.start[e]..self.start[e + 1]]
    }

    pub fn values(&self, e: usize) -> &[T] {
        &self.value[self.start[e]..self.start[e + 1]]
    }

    pub fn entries(&self, e: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        zip(self.indices(e).iter().copied(), self.values(e).iter().copied())
    }

    /// Append a complete eta.
    pub fn push<I>(&mut self, pivot: usize, entries: I) -> Result<usize, AreaFull>
    where
        I: IntoIterator<Item = (usize, T)>,
    {
        let base = self.index.len();
        for (i, v) in entries {
            if self.index.len() >= self.capacity {
                self.index.truncate(base);
                self.value.truncate(base);
                return Err(AreaFull);
            }
            self.index.push(i);
            self.value.push(v);
        }
        self.pivot.push(pivot);
        self.start.push(self.index.len());
        Ok(self.pivot.len() - 1)
    }

    /// Σ value * x[index] over eta `e`
    pub fn dot(&self, e: usize, x: &[T]) -> T {
        self.entries(e)
            .fold(T::zero(), |acc, (i, v)| acc + v * x[i])
    }
}

#[test]
fn test_eta_push_and_capacity() {
    let mut etas = EtaFile::<f64>::new(3);
    let e = etas.push(2, vec![(0, 1.0), (1, -2.0)]).unwrap();
    assert_eq!(e, 0);
    assert_eq!(etas.pivot(0), 2);
    assert_eq!(etas.dot(0, &[1.0, 1.0, 0.0]), -1.0);

    // a failed push leaves the file unchanged
    assert_eq!(etas.push(0, vec![(1, 1.0), (2, 1.0)]), Err(AreaFull));
    assert_eq!(etas.len(), 1);
    assert_eq!(etas.number_elements(), 2);

    etas.push(1, std::iter::empty()).unwrap();
    assert_eq!(etas.indices(1), &[] as &[usize]);
}
