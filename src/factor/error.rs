use crate::algebra::SparseFormatError;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Error type returned by [`Factorization::factorize`](crate::factor::Factorization::factorize)
/// and by solves against a factorization that is not ready.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactorError {
    /// The basis is structurally or numerically singular.  The dependent
    /// columns have been marked in the basis flags.
    #[error("Basis is singular (rank {rank}, deficiency {deficiency})")]
    Singular { rank: usize, deficiency: usize },
    #[error("More basic columns than rows")]
    TooManyColumns,
    #[error("Factor storage exhausted after enlarging the work area")]
    OutOfMemory,
    #[error("Matrix dimensions are incompatible with the basis")]
    IncompatibleDimension,
    #[error("No valid factorization is available")]
    NotFactorized,
    #[error("Basis matrix is malformed")]
    BadFormat(#[from] SparseFormatError),
}

impl FactorError {
    /// Legacy integer status of a failed factorization.
    pub fn status_code(&self) -> i32 {
        match self {
            FactorError::Singular { .. } => -1,
            FactorError::TooManyColumns => -2,
            FactorError::OutOfMemory => -99,
            FactorError::IncompatibleDimension | FactorError::BadFormat(_) => -3,
            FactorError::NotFactorized => -4,
        }
    }
}

/// Outcome of a basis column replacement.
///
/// `Accurate` always updates the factors and `Singular` never does.
/// `Marginal` updates them only when the caller did not ask for the check
/// to run before modification.  On `OutOfRoom` and `TooManyPivots` the
/// caller should refactorize.
#[repr(i32)]
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReplaceStatus {
    /// the recomputed pivot agrees with the caller's estimate
    Accurate = 0,
    /// the pivot agreement is poor
    Marginal = 1,
    /// rejected: pivot too small or inconsistent
    Singular = 2,
    /// rejected: no room left for the update
    OutOfRoom = 3,
    /// rejected: update limit reached
    TooManyPivots = 5,
}

impl ReplaceStatus {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// true if the caller has to refactorize before the next update
    pub fn needs_refactorization(&self) -> bool {
        matches!(*self, ReplaceStatus::OutOfRoom | ReplaceStatus::TooManyPivots)
    }
}

impl std::fmt::Display for ReplaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Lifecycle state of a [`Factorization`](crate::factor::Factorization).
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
pub enum FactorStatus {
    /// no factorization attempted yet, or the last one failed
    #[default]
    Unfactorized,
    /// factors are valid for solves and updates
    Ready,
    /// the last factorization found a singular basis
    Singular,
}

#[test]
fn test_status_codes() {
    assert_eq!(
        FactorError::Singular {
            rank: 2,
            deficiency: 1
        }
        .status_code(),
        -1
    );
    assert_eq!(FactorError::OutOfMemory.status_code(), -99);
    assert_eq!(ReplaceStatus::TooManyPivots.code(), 5);
    assert!(ReplaceStatus::OutOfRoom.needs_refactorization());
    assert!(!ReplaceStatus::Marginal.needs_refactorization());
}
