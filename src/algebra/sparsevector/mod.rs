use crate::algebra::FloatT;

/// A column held as (row, value) pairs in ascending row order.
///
/// This is the packed form handed out by
/// [`GubMatrix::unpack_packed`](crate::gub::GubMatrix::unpack_packed) and by
/// [`IndexedVector::to_sparse`](crate::algebra::IndexedVector::to_sparse).
/// Producers append rows in increasing order; [`get`](SparseVector::get)
/// relies on it.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector<T = f64> {
    /// number of rows
    pub n: usize,
    /// row of each stored entry
    pub nzind: Vec<usize>,
    /// value of each stored entry
    pub nzval: Vec<T>,
}

impl<T> SparseVector<T>
where
    T: FloatT,
{
    /// A column of `n` rows with nothing stored.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            nzind: Vec::new(),
            nzval: Vec::new(),
        }
    }

    /// Append an entry below every entry already stored.
    pub fn push(&mut self, row: usize, value: T) {
        debug_assert!(row < self.n);
        debug_assert!(self.nzind.last().map_or(true, |&last| last < row));
        self.nzind.push(row);
        self.nzval.push(value);
    }

    pub fn nnz(&self) -> usize {
        self.nzind.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.nzind.iter().copied().zip(self.nzval.iter().copied())
    }

    /// Value at `row`, zero when nothing is stored there.
    pub fn get(&self, row: usize) -> T {
        self.nzind
            .binary_search(&row)
            .map_or(T::zero(), |p| self.nzval[p])
    }

    /// `y += multiplier * self`
    pub fn scatter(&self, multiplier: T, y: &mut [T]) {
        for (row, value) in self.iter() {
            y[row] += multiplier * value;
        }
    }

    pub fn to_dense(&self) -> Vec<T> {
        let mut dense = vec![T::zero(); self.n];
        self.scatter(T::one(), &mut dense);
        dense
    }
}

#[test]
fn test_packed_column() {
    let mut column = SparseVector::zeros(5);
    column.push(1, 2.);
    column.push(4, -1.);
    assert_eq!(column.nnz(), 2);
    assert_eq!(column.get(4), -1.);
    assert_eq!(column.get(2), 0.);
    assert_eq!(column.to_dense(), vec![0., 2., 0., 0., -1.]);

    let mut y = vec![1.; 5];
    column.scatter(3., &mut y);
    assert_eq!(y, vec![1., 7., 1., 1., -2.]);
}
