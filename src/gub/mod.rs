//! Generalized upper bound (GUB) constraint handling.
//!
//! A GUB set is a group of columns whose sum is bounded,
//! `lower_s <= Σ x_j <= upper_s`.  The layers in this module keep those
//! rows out of the factorization: each set has one basic *key*, and every
//! other member is presented to the basis as its column minus the key's.
//!
//! [`GubMatrix`] handles a fixed column set.  [`DynamicGubMatrix`] prices
//! a [`GubColumnPool`] from its metadata and materializes the winners in
//! a bounded window of working columns.  Both implement [`GubOps`], the
//! per-iteration interface a simplex driver calls with its
//! [`SimplexModel`]; [`GubLayer`] holds either one.
//!
//! A driver pairs a layer with a [`Factorization`](crate::factor::Factorization)
//! built from [`GubMatrix::fill_basis`], unpacks entering columns with
//! [`GubOps::unpack`], and hands every accepted pivot back through
//! [`GubOps::update_pivot`].

#![allow(non_snake_case)]

mod dynamic;
mod effective_rhs;
mod error;
mod expanded;
mod layer;
mod matrix;
mod model;
mod pool;
mod pricing;
mod sets;
mod settings;
mod synchronize;
mod update;

cfg_if::cfg_if! {
    if #[cfg(feature = "serde")] {
        mod json;
        pub use json::*;
    }
}

//export flattened
pub use dynamic::*;
pub use error::*;
pub use expanded::*;
pub use layer::*;
pub use matrix::GubMatrix;
pub use model::*;
pub use pool::*;
pub use pricing::PricedCandidate;
pub use sets::*;
pub use settings::*;
pub use synchronize::*;

pub(crate) use matrix::SavedSets;
