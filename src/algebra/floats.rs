#![allow(non_snake_case)]
use num_traits::{Float, FromPrimitive, NumAssign, Zero};
use std::fmt::{Debug, Display, LowerExp};

/// Scalar type for matrix entries, factor values and GUB bounds.
///
/// Both `f32` and `f64` qualify.  Pivot tolerances are stated for `f64`
/// and lose meaning on narrower types, so `f64` is what the tests use.
pub trait FloatT:
    'static + Send + Float + NumAssign + Default + FromPrimitive + Display + LowerExp + Debug
{
    /// `|self| <= tol`
    #[inline]
    fn is_negligible(self, tol: Self) -> bool {
        self.abs() <= tol
    }
}

impl<T> FloatT for T where
    T: 'static + Send + Float + NumAssign + Default + FromPrimitive + Display + LowerExp + Debug
{
}

/// Conversion of literal constants and counts into a [`FloatT`].
///
/// Lets tolerances be written as `(1e-5).as_T()` and row counts be
/// mixed into density estimates as `m.as_T()`.
pub trait AsFloatT<T>: 'static {
    fn as_T(&self) -> T;
}

macro_rules! as_float_from {
    ($($ty:ty => $conv:ident),+) => {$(
        impl<T: FromPrimitive + Zero + 'static> AsFloatT<T> for $ty {
            #[inline]
            fn as_T(&self) -> T {
                // every FloatT represents these (possibly with rounding)
                T::$conv(*self).unwrap_or_else(T::zero)
            }
        }
    )+};
}

as_float_from!(usize => from_usize, f32 => from_f32, f64 => from_f64);

#[test]
fn test_as_float() {
    let x: f64 = 3usize.as_T();
    assert_eq!(x, 3.);
    let y: f32 = (1e-5).as_T();
    assert!((y - 1e-5).abs() < 1e-12);
    assert!((1e-13f64).is_negligible(1e-12));
    assert!(!(-2.0f64).is_negligible(1.));
}
