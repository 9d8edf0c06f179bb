#![allow(non_snake_case)]

use crate::algebra::{FloatT, SparseFormatError};
use std::iter::zip;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Column-compressed storage for constraint and basis matrices.
///
/// Column `j` occupies `colptr[j]..colptr[j + 1]` of `rowval`/`nzval`,
/// with row indices strictly increasing inside each column.  The
/// factorization reads basis columns from it and the GUB layers read
/// structural columns, so both rely on that ordering; run
/// [`check_format`](CscMatrix::check_format) on matrices built by hand.
///
/// ```
/// use tomlin::algebra::CscMatrix;
///
/// // [2  0]
/// // [1  3]
/// let B = CscMatrix::new(2, 2, vec![0, 2, 3], vec![0, 1, 1], vec![2., 1., 3.]);
/// assert!(B.check_format().is_ok());
/// assert_eq!(B, CscMatrix::from(&[[2., 0.], [1., 3.]]));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
pub struct CscMatrix<T = f64> {
    pub m: usize,
    pub n: usize,
    /// `n + 1` offsets into `rowval`/`nzval`, ending at the entry count
    pub colptr: Vec<usize>,
    pub rowval: Vec<usize>,
    pub nzval: Vec<T>,
}

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    /// # Panics
    /// When the three arrays disagree in length with each other or with `n`.
    /// Row order and range are left to [`check_format`](CscMatrix::check_format).
    pub fn new(m: usize, n: usize, colptr: Vec<usize>, rowval: Vec<usize>, nzval: Vec<T>) -> Self {
        assert_eq!(colptr.len(), n + 1, "colptr needs n + 1 entries");
        assert_eq!(colptr[n], rowval.len());
        assert_eq!(rowval.len(), nzval.len());
        CscMatrix {
            m,
            n,
            colptr,
            rowval,
            nzval,
        }
    }

    /// `m` rows and no columns, ready for [`push_column`](CscMatrix::push_column).
    pub fn empty(m: usize) -> Self {
        CscMatrix::new(m, 0, vec![0], Vec::new(), Vec::new())
    }

    pub fn identity(n: usize) -> Self {
        CscMatrix::new(n, n, (0..=n).collect(), (0..n).collect(), vec![T::one(); n])
    }

    /// Assemble a matrix from a list of sparse columns, each given
    /// as (row, value) pairs.  Entries are sorted by row within each column.
    pub fn from_columns(m: usize, columns: &[Vec<(usize, T)>]) -> Self {
        let mut A = CscMatrix::empty(m);
        for col in columns {
            let mut sorted = col.clone();
            sorted.sort_by_key(|&(r, _)| r);
            let (rows, vals): (Vec<usize>, Vec<T>) = sorted.into_iter().unzip();
            A.push_column(&rows, &vals);
        }
        A
    }

    pub fn nnz(&self) -> usize {
        self.rowval.len()
    }

    /// number of stored entries in column `col`
    pub fn col_nnz(&self, col: usize) -> usize {
        self.colptr[col + 1] - self.colptr[col]
    }

    /// row indices and values of column `col`
    pub fn column(&self, col: usize) -> (&[usize], &[T]) {
        let rng = self.colptr[col]..self.colptr[col + 1];
        (&self.rowval[rng.clone()], &self.nzval[rng])
    }

    /// Verify the layout described on [`CscMatrix`].
    pub fn check_format(&self) -> Result<(), SparseFormatError> {
        let lengths_agree = self.rowval.len() == self.nzval.len()
            && self.colptr.len() == self.n + 1
            && self.colptr.last() == Some(&self.rowval.len());
        if !lengths_agree {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        if let Some(col) = self.colptr.windows(2).position(|c| c[0] > c[1]) {
            return Err(SparseFormatError::BadColptr(col));
        }

        for col in 0..self.n {
            let (rows, _) = self.column(col);
            if rows.windows(2).any(|r| r[0] >= r[1]) {
                return Err(SparseFormatError::UnsortedRows(col));
            }
            if let Some(&row) = rows.last().filter(|&&r| r >= self.m) {
                return Err(SparseFormatError::RowOutOfRange { col, row });
            }
        }

        Ok(())
    }

    /// Append a column at the end of the matrix
    pub fn push_column(&mut self, rows: &[usize], vals: &[T]) {
        assert_eq!(rows.len(), vals.len());
        self.rowval.extend_from_slice(rows);
        self.nzval.extend_from_slice(vals);
        self.n += 1;
        self.colptr.push(self.rowval.len());
    }

    /// Overwrite the entries of column `col`, shifting the storage of the
    /// later columns as needed.
    pub fn set_column(&mut self, col: usize, rows: &[usize], vals: &[T]) {
        assert_eq!(rows.len(), vals.len());
        let (start, end) = (self.colptr[col], self.colptr[col + 1]);
        self.rowval.splice(start..end, rows.iter().copied());
        self.nzval.splice(start..end, vals.iter().copied());

        let old = end - start;
        let new = rows.len();
        if new != old {
            for p in self.colptr[(col + 1)..].iter_mut() {
                *p = *p + new - old;
            }
        }
    }

    /// y = a*A*x + b*y
    pub fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        assert_eq!(x.len(), self.n);
        assert_eq!(y.len(), self.m);

        y.iter_mut().for_each(|yi| *yi *= b);

        for (col, &xj) in x.iter().enumerate() {
            if xj == T::zero() {
                continue;
            }
            let (rows, vals) = self.column(col);
            for (&r, &v) in zip(rows, vals) {
                y[r] += a * v * xj;
            }
        }
    }

    /// inner product of column `col` with a dense vector
    pub fn col_dot(&self, col: usize, x: &[T]) -> T {
        let (rows, vals) = self.column(col);
        zip(rows, vals).fold(T::zero(), |acc, (&r, &v)| acc + v * x[r])
    }

    /// y[r] += scale * A[r,col] for every entry of column `col`
    pub fn col_axpy(&self, col: usize, scale: T, y: &mut [T]) {
        let (rows, vals) = self.column(col);
        for (&r, &v) in zip(rows, vals) {
            y[r] += scale * v;
        }
    }
}

impl<T, const N: usize, const M: usize> From<&[[T; N]; M]> for CscMatrix<T>
where
    T: FloatT,
{
    /// Dense row-major array to CSC, dropping structural zeros.
    fn from(rows: &[[T; N]; M]) -> Self {
        let columns: Vec<Vec<(usize, T)>> = (0..N)
            .map(|j| {
                (0..M)
                    .filter(|&i| rows[i][j] != T::zero())
                    .map(|i| (i, rows[i][j]))
                    .collect()
            })
            .collect();
        CscMatrix::from_columns(M, &columns)
    }
}

#[test]
fn test_csc_from_dense() {
    let A = CscMatrix::from(&[[1., 3., 5.], [2., 0., 6.], [0., 4., 7.]]);
    assert_eq!(A.colptr, vec![0, 2, 4, 7]);
    assert_eq!(A.rowval, vec![0, 1, 0, 2, 0, 1, 2]);
    assert_eq!(A.nzval, vec![1., 2., 3., 4., 5., 6., 7.]);
    assert!(A.check_format().is_ok());
}

#[test]
fn test_csc_gemv() {
    let A = CscMatrix::from(&[[1., 0.], [2., 3.]]);
    let mut y = vec![1., 1.];
    A.gemv(&mut y, &[1., 2.], 1., 2.);
    assert_eq!(y, vec![3., 10.]);
    assert_eq!(A.col_dot(1, &[5., 1.]), 3.);
}

#[test]
fn test_csc_format_errors() {
    let A = CscMatrix::new(2, 1, vec![0, 2], vec![1, 0], vec![1., 2.]);
    assert_eq!(A.check_format(), Err(SparseFormatError::UnsortedRows(0)));

    let A = CscMatrix::new(2, 2, vec![0, 1, 2], vec![0, 2], vec![1., 2.]);
    assert_eq!(A.check_format(), Err(SparseFormatError::RowOutOfRange { col: 1, row: 2 }));

    let A = CscMatrix::new(2, 3, vec![0, 2, 1, 2], vec![0, 1], vec![1., 2.]);
    assert_eq!(A.check_format(), Err(SparseFormatError::BadColptr(1)));
}

#[test]
fn test_csc_set_column() {
    let mut A = CscMatrix::from(&[[1., 0., 4.], [2., 3., 0.]]);
    A.set_column(0, &[1], &[9.]);
    A.set_column(1, &[0, 1], &[5., 6.]);
    assert!(A.check_format().is_ok());
    assert_eq!(A.colptr, vec![0, 1, 3, 4]);
    assert_eq!(A.column(1), (&[0usize, 1][..], &[5., 6.][..]));
    assert_eq!(A.column(2), (&[0usize][..], &[4.][..]));
}
