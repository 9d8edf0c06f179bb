use thiserror::Error;

/// Defects found by [`CscMatrix::check_format`](crate::algebra::CscMatrix::check_format)
/// before a matrix is handed to the factorization or a GUB layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SparseFormatError {
    #[error("dimensions disagree with the colptr, rowval and nzval lengths")]
    IncompatibleDimension,
    #[error("column pointers decrease between columns {0} and {}", .0 + 1)]
    BadColptr(usize),
    #[error("row indices in column {0} are not strictly increasing")]
    UnsortedRows(usize),
    #[error("column {col} references row {row}, outside the matrix")]
    RowOutOfRange { col: usize, row: usize },
}
