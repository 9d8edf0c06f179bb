use crate::algebra::{AsFloatT, FloatT};
use crate::utils::atomic::{AtomicF64, Ordering};
use lazy_static::lazy_static;

/// Default magnitude beyond which a bound is treated as infinite.
pub const INFINITY_DEFAULT: f64 = 1e20;

lazy_static! {
    static ref INFINITY: AtomicF64 = AtomicF64::new(INFINITY_DEFAULT);
}

/// Revert internal infinity bound to its default value.
pub fn default_infinity() {
    INFINITY.store(INFINITY_DEFAULT, Ordering::Relaxed);
}
/// Set the internal infinity bound to a new value.
pub fn set_infinity(v: f64) {
    INFINITY.store(v, Ordering::Relaxed);
}
/// Get the current internal infinity bound.
pub fn get_infinity() -> f64 {
    INFINITY.load(Ordering::Relaxed)
}

/// True if `v` is an upper bound at or beyond the infinity bound
pub(crate) fn is_upper_infinite<T: FloatT>(v: T) -> bool {
    v >= get_infinity().as_T()
}

/// True if `v` is a lower bound at or beyond minus the infinity bound
pub(crate) fn is_lower_infinite<T: FloatT>(v: T) -> bool {
    v <= (-get_infinity()).as_T()
}

#[test]
fn test_infinity_roundtrip() {
    assert_eq!(get_infinity(), INFINITY_DEFAULT);
    assert!(is_upper_infinite(1e30_f64));
    assert!(!is_lower_infinite(-10.0_f64));
    default_infinity();
    assert_eq!(get_infinity(), INFINITY_DEFAULT);
}
