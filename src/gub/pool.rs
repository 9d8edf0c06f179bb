use super::*;
use crate::algebra::*;
use crate::utils::get_infinity;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where a pool column currently lives.
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DynamicStatus {
    /// materialized in a window slot of the working matrix
    InSmall,
    #[default]
    AtLowerBound,
    AtUpperBound,
}

/// Column pool of a [`DynamicGubMatrix`]: every column that may be
/// generated, grouped by set.
///
/// Set `s` owns the pool columns `set_start[s]..set_start[s + 1]`.
/// Missing bound vectors mean bounds `[0, infinity)` for every column.
#[derive(Debug, Clone)]
pub struct GubColumnPool<T: FloatT = f64> {
    pub columns: CscMatrix<T>,
    pub cost: Vec<T>,
    pub lower: Option<Vec<T>>,
    pub upper: Option<Vec<T>>,
    pub set_start: Vec<usize>,
}

impl<T> GubColumnPool<T>
where
    T: FloatT,
{
    pub fn new(columns: CscMatrix<T>, cost: Vec<T>, set_start: Vec<usize>) -> Result<Self, GubError> {
        let pool = Self {
            columns,
            cost,
            lower: None,
            upper: None,
            set_start,
        };
        pool.check()?;
        Ok(pool)
    }

    /// Attach per-column bounds.
    pub fn with_bounds(mut self, lower: Option<Vec<T>>, upper: Option<Vec<T>>) -> Result<Self, GubError> {
        self.lower = lower;
        self.upper = upper;
        self.check()?;
        Ok(self)
    }

    fn check(&self) -> Result<(), GubError> {
        let n = self.columns.n;
        let lengths_ok = self.cost.len() == n
            && self.lower.as_ref().map_or(true, |v| v.len() == n)
            && self.upper.as_ref().map_or(true, |v| v.len() == n);
        let starts_ok = self.set_start.first() == Some(&0)
            && self.set_start.last() == Some(&n)
            && self.set_start.windows(2).all(|w| w[0] <= w[1]);
        if !lengths_ok || !starts_ok {
            return Err(GubError::OverlappingSets);
        }
        if (0..n).any(|p| self.lower_of(p) > self.upper_of(p)) {
            return Err(GubError::BadSetBounds);
        }
        Ok(())
    }

    pub fn number_columns(&self) -> usize {
        self.columns.n
    }

    pub fn number_sets(&self) -> usize {
        self.set_start.len().saturating_sub(1)
    }

    pub fn members(&self, s: usize) -> std::ops::Range<usize> {
        self.set_start[s]..self.set_start[s + 1]
    }

    pub fn set_of(&self, p: usize) -> usize {
        self.set_start.partition_point(|&start| start <= p) - 1
    }

    pub fn has_bounds(&self) -> bool {
        self.lower.is_some() || self.upper.is_some()
    }

    pub fn lower_of(&self, p: usize) -> T {
        self.lower.as_ref().map_or(T::zero(), |v| v[p])
    }

    pub fn upper_of(&self, p: usize) -> T {
        self.upper
            .as_ref()
            .map_or_else(|| get_infinity().as_T(), |v| v[p])
    }

    /// value of a pool column resting at `status`
    pub(crate) fn value_at(&self, p: usize, status: DynamicStatus) -> T {
        match status {
            DynamicStatus::AtUpperBound => self.upper_of(p),
            DynamicStatus::AtLowerBound => self.lower_of(p),
            DynamicStatus::InSmall => T::zero(),
        }
    }
}
