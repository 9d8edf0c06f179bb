//! __tomlin__ is a sparse LU factorization engine for simplex basis
//! matrices, with a generalized upper bound (GUB) constraint layer on top.
//!
//! The [factorization](crate::factor) builds `PA = LU` for the basic
//! columns of a constraint matrix using Markowitz pivot selection with
//! threshold pivoting, finishing densely once the active submatrix fills
//! in.  It then solves with the basis and its transpose, choosing between
//! dense, bit-masked and depth-first sparse solves from the observed
//! fill, and absorbs basis changes incrementally with Forrest-Tomlin or
//! product form updates.
//!
//! The [GUB layers](crate::gub) keep set constraints
//!
//! $$
//! \text{lower}_s \le \sum_{j \in s} x_j \le \text{upper}_s
//! $$
//!
//! out of the basis.  Every set has one basic key, and its other members
//! enter the factorization as their column minus the key column.  The
//! dynamic variant generates set members from a column pool on demand.
//!
//! ```
//! use tomlin::algebra::*;
//! use tomlin::factor::*;
//!
//! // identity with a 2 below the first diagonal entry
//! let basis = CscMatrix::from(&[[1., 0., 0.], [2., 1., 0.], [0., 0., 1.]]);
//! let mut flags = BasisFlags::new(3, 3);
//! (0..3).for_each(|j| flags.set_column_basic(j, true));
//! let mut factor = Factorization::<f64>::new(FactorSettings::default());
//! factor.factorize(&basis, &mut flags).unwrap();
//!
//! let mut x = IndexedVector::new(3);
//! x.add(0, 1.0);
//! factor.update_column(&mut x).unwrap();
//! ```
//!
//! There is no driver here: a simplex implementation owns the iteration
//! loop and calls into these types once per pivot.
//!
//! # License
//!
//! Licensed under Apache License, Version 2.0.

//Rust hates greek characters
#![allow(confusable_idents)]

pub mod algebra;
pub mod factor;
pub mod gub;
pub mod io;
pub mod utils;
