//! Sparse LU factorization of simplex bases.
//!
//! A [`Factorization`] is built from a constraint matrix and a set of
//! [`BasisFlags`] marking which structural columns and row slacks are
//! basic.  Pivots are chosen by Markowitz search with threshold pivoting
//! and the remaining active submatrix is finished densely once it fills
//! in.  After factorization the engine solves `B x = b`
//! ([`update_column`](Factorization::update_column)) and `Bᵀ y = c`
//! ([`update_column_transpose`](Factorization::update_column_transpose))
//! and absorbs basis changes with Forrest-Tomlin or product form updates
//! ([`replace_column`](Factorization::replace_column)).
//!
//! Solution vectors are indexed by pivot row: after a successful
//! factorization every basic column is marked `BasisMark::Pivot(row)` in
//! the flags, and that row is the position of its value in FTRAN results.

mod basis;
mod btran;
mod dense;
mod error;
mod eta;
mod factorization;
mod ftran;
mod markowitz;
mod settings;
mod storage;
mod traverse;
mod update;

pub use basis::{BasisColumn, BasisFlags, BasisMark};
pub use error::{FactorError, FactorStatus, ReplaceStatus};
pub use factorization::{Factorization, SolveStatistics};
pub use settings::{FactorSettings, FactorSettingsBuilder, FactorSettingsBuilderError, SolveStrategy};
