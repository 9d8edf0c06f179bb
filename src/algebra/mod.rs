//! Sparse and dense vector types and the numeric traits used throughout tomlin.

mod csc;
mod error_types;
mod floats;
mod indexed;
mod sparsevector;

pub use csc::*;
pub use error_types::*;
pub use floats::*;
pub use indexed::*;
pub use sparsevector::*;
