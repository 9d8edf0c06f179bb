use crate::algebra::{FloatT, SparseVector};

/// Dense work vector with a list of (possibly) nonzero positions.
///
/// This is the vector type passed through FTRAN / BTRAN and the GUB
/// column operations.  The index list may contain entries whose value
/// has cancelled to zero, but every nonzero value is always listed.
#[derive(Debug, Clone)]
pub struct IndexedVector<T = f64> {
    values: Vec<T>,
    indices: Vec<usize>,
}

impl<T> IndexedVector<T>
where
    T: FloatT,
{
    pub fn new(n: usize) -> Self {
        Self {
            values: vec![T::zero(); n],
            indices: Vec::new(),
        }
    }

    pub fn from_dense(values: &[T]) -> Self {
        let mut v = Self::new(values.len());
        for (i, &x) in values.iter().enumerate() {
            if x != T::zero() {
                v.insert(i, x);
            }
        }
        v
    }

    /// unit vector `e_i` of dimension `n`
    pub fn unit(n: usize, i: usize) -> Self {
        let mut v = Self::new(n);
        v.insert(i, T::one());
        v
    }

    /// dimension
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// number of listed positions
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn dense(&self) -> &[T] {
        &self.values
    }

    pub fn get(&self, i: usize) -> T {
        self.values[i]
    }

    /// Set a position that is currently zero.
    pub fn insert(&mut self, i: usize, v: T) {
        debug_assert!(self.values[i] == T::zero());
        self.values[i] = v;
        self.indices.push(i);
    }

    /// Add to a position, listing it if it was zero.
    pub fn add(&mut self, i: usize, v: T) {
        if self.values[i] == T::zero() {
            self.indices.push(i);
        }
        self.values[i] += v;
    }

    pub fn clear(&mut self) {
        for &i in &self.indices {
            self.values[i] = T::zero();
        }
        self.indices.clear();
    }

    /// Zero every entry below `tolerance` in magnitude and drop it from
    /// the index list.
    pub fn clean(&mut self, tolerance: T) {
        let values = &mut self.values;
        self.indices.retain(|&i| {
            if values[i].abs() < tolerance {
                values[i] = T::zero();
                false
            } else {
                true
            }
        });
    }

    /// Rebuild the index list from the dense values.
    pub fn rebuild_indices(&mut self) {
        self.indices.clear();
        for (i, &v) in self.values.iter().enumerate() {
            if v != T::zero() {
                self.indices.push(i);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.indices.iter().map(|&i| (i, self.values[i]))
    }

    pub fn to_sparse(&self) -> SparseVector<T> {
        let mut sv = SparseVector::zeros(self.len());
        let mut idx = self.indices.clone();
        idx.sort_unstable();
        for i in idx {
            if self.values[i] != T::zero() {
                sv.push(i, self.values[i]);
            }
        }
        sv
    }

    // raw access for the solve kernels, which keep the index
    // list consistent themselves
    pub(crate) fn parts_mut(&mut self) -> (&mut Vec<T>, &mut Vec<usize>) {
        (&mut self.values, &mut self.indices)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_indexed_add_and_clean() {
        let mut v = IndexedVector::<f64>::new(5);
        v.add(3, 1.0);
        v.add(1, 1e-16);
        v.add(3, 2.0);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.get(3), 3.0);

        v.clean(1e-13);
        assert_eq!(v.indices(), &[3]);
        assert_eq!(v.get(1), 0.0);

        v.clear();
        assert!(v.is_empty());
        assert!(v.dense().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_indexed_to_sparse() {
        let v = IndexedVector::from_dense(&[0.0, 2.0, 0.0, -1.0]);
        let sv = v.to_sparse();
        assert_eq!(sv.nzind, vec![1, 3]);
        assert_eq!(sv.nzval, vec![2.0, -1.0]);
    }
}
