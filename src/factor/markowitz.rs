//! Sparse Gaussian elimination with Markowitz pivot selection.
//!
//! The active submatrix is held twice: column-wise with values and
//! row-wise as a pattern only.  Rows and columns are bucketed by their
//! current count so that singletons and low-count candidates are found
//! without scanning the whole matrix.

use super::dense::eliminate_dense;
use super::storage::{AreaFull, PackedArea};
use super::FactorSettings;
use crate::algebra::{CscMatrix, FloatT};
use crate::utils::ListArena;
use std::iter::zip;

const NONE: usize = usize::MAX;

/// One pivot of the elimination, in the order it was taken.
#[derive(Debug, Clone)]
pub(crate) struct PivotStep<T> {
    /// pivot row
    pub row: usize,
    /// basis column index
    pub col: usize,
    pub diag: T,
    /// (row, multiplier) below the pivot
    pub lower: Vec<(usize, T)>,
    /// (basis column, value) right of the pivot
    pub upper: Vec<(usize, T)>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Elimination<T> {
    pub steps: Vec<PivotStep<T>>,
    pub singular_columns: Vec<usize>,
    pub unpivoted_rows: Vec<usize>,
    /// order of the block handed to the dense kernel, or 0
    pub dense_size: usize,
}

pub(crate) struct ActiveMatrix<T> {
    m: usize,
    n: usize,
    cols: PackedArea<T>,
    rows: PackedArea<()>,
    col_lists: ListArena,
    row_lists: ListArena,
    col_active: Vec<bool>,
    row_active: Vec<bool>,
    nnz: usize,
    ncols_active: usize,
    nrows_active: usize,
    slot: Vec<usize>,
}

impl<T> ActiveMatrix<T>
where
    T: FloatT,
{
    pub fn new(basis: &CscMatrix<T>, capacity: usize, zero_tolerance: T) -> Result<Self, AreaFull> {
        let (m, n) = (basis.m, basis.n);
        let mut cols = PackedArea::new(n, capacity);
        let mut rows = PackedArea::new(m, capacity);
        let mut row_count = vec![0usize; m];

        for k in 0..n {
            let (rowval, nzval) = basis.column(k);
            cols.reserve(k, rowval.len())?;
            for (&r, &v) in zip(rowval, nzval) {
                if v.abs() >= zero_tolerance {
                    cols.push(k, r, v)?;
                    row_count[r] += 1;
                }
            }
        }
        for (r, &count) in row_count.iter().enumerate() {
            rows.reserve(r, count)?;
        }
        for k in 0..n {
            for &r in cols.indices(k) {
                rows.push(r, k, ())?;
            }
        }

        let mut col_lists = ListArena::new(n, m + 1);
        let mut row_lists = ListArena::new(m, n + 1);
        for k in 0..n {
            col_lists.push_back(cols.len(k), k);
        }
        for r in 0..m {
            row_lists.push_back(rows.len(r), r);
        }
        let nnz = cols.number_elements();

        Ok(Self {
            m,
            n,
            cols,
            rows,
            col_lists,
            row_lists,
            col_active: vec![true; n],
            row_active: vec![true; m],
            nnz,
            ncols_active: n,
            nrows_active: m,
            slot: vec![NONE; m],
        })
    }

    pub fn nrows(&self) -> usize {
        self.m
    }

    pub fn active_rows(&self) -> Vec<usize> {
        (0..self.m).filter(|&r| self.row_active[r]).collect()
    }

    pub fn active_cols(&self) -> Vec<usize> {
        (0..self.n).filter(|&k| self.col_active[k]).collect()
    }

    pub fn col_entries(&self, k: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        self.cols.entries(k)
    }

    pub fn retire_row(&mut self, r: usize) {
        self.rows.clear(r);
        self.row_lists.remove(r);
        self.row_active[r] = false;
        self.nrows_active -= 1;
    }

    pub fn retire_col(&mut self, k: usize) {
        self.nnz -= self.cols.len(k);
        self.cols.clear(k);
        self.col_lists.remove(k);
        self.col_active[k] = false;
        self.ncols_active -= 1;
    }

    fn relist_row(&mut self, r: usize) {
        self.row_lists.push_back(self.rows.len(r), r);
    }

    fn relist_col(&mut self, k: usize) {
        self.col_lists.push_back(self.cols.len(k), k);
    }

    fn value(&self, r: usize, k: usize) -> Option<T> {
        self.cols.find(k, r).map(|p| self.cols.value_at(k, p))
    }

    fn col_max(&self, k: usize) -> T {
        self.cols
            .values(k)
            .iter()
            .fold(T::zero(), |acc, v| T::max(acc, v.abs()))
    }

    fn wants_dense(&self, settings: &FactorSettings<T>) -> bool {
        if !settings.dense_enable || self.ncols_active < settings.dense_minimum_size {
            return false;
        }
        let area = (self.nrows_active * self.ncols_active) as f64;
        self.nnz as f64 >= settings.dense_threshold * area
    }

    /// Choose the next pivot as (row, column, value).
    fn find_pivot(&self, settings: &FactorSettings<T>) -> Option<(usize, usize, T)> {
        let tol = settings.pivot_tolerance;

        // a column singleton is its own column maximum
        if let Some(k) = self.col_lists.first(1) {
            let r = self.cols.indices(k)[0];
            return Some((r, k, self.cols.value_at(k, 0)));
        }

        for r in self.row_lists.iter(1) {
            let k = self.rows.indices(r)[0];
            if let Some(v) = self.value(r, k) {
                if v.abs() >= tol * self.col_max(k) {
                    return Some((r, k, v));
                }
            }
        }

        let mut best: Option<(usize, usize, T)> = None;
        let mut best_cost = usize::MAX;
        let mut trials = 0;

        for count in 2..=self.m.max(self.n) {
            // no untried candidate can beat (count-1)^2
            if best.is_some() && best_cost <= (count - 1) * (count - 1) {
                break;
            }

            if count <= self.m {
                for k in self.col_lists.iter(count) {
                    let colmax = self.col_max(k);
                    for (r, v) in self.cols.entries(k) {
                        if v.abs() < tol * colmax {
                            continue;
                        }
                        let cost = (self.rows.len(r) - 1) * (count - 1);
                        if cost < best_cost {
                            best_cost = cost;
                            best = Some((r, k, v));
                        }
                    }
                    trials += 1;
                    if best.is_some() && trials >= settings.number_trials {
                        return best;
                    }
                }
            }

            if count <= self.n {
                for r in self.row_lists.iter(count) {
                    for &k in self.rows.indices(r) {
                        let Some(v) = self.value(r, k) else {
                            continue;
                        };
                        if v.abs() < tol * self.col_max(k) {
                            continue;
                        }
                        let cost = (count - 1) * (self.cols.len(k) - 1);
                        if cost < best_cost {
                            best_cost = cost;
                            best = Some((r, k, v));
                        }
                    }
                    trials += 1;
                    if best.is_some() && trials >= settings.number_trials {
                        return best;
                    }
                }
            }
        }
        best
    }

    /// Eliminate with pivot `(rp, kp)` and update the active submatrix.
    fn pivot(&mut self, rp: usize, kp: usize, piv: T, zero_tolerance: T) -> Result<PivotStep<T>, AreaFull> {
        // pivot row leaves every other column
        let mut upper = Vec::new();
        let row_cols = self.rows.indices(rp).to_vec();
        for k in row_cols {
            if k == kp {
                continue;
            }
            if let Some(v) = self.cols.remove_index(k, rp) {
                self.nnz -= 1;
                upper.push((k, v));
            }
        }

        let lower: Vec<(usize, T)> = self
            .cols
            .entries(kp)
            .filter(|&(r, _)| r != rp)
            .map(|(r, v)| (r, v / piv))
            .collect();

        for &(r, _) in &lower {
            self.rows.remove_index(r, kp);
        }
        self.retire_col(kp);
        self.retire_row(rp);

        // Schur complement update, one column of the pivot row at a time
        let mut fill = Vec::new();
        for &(k, u) in &upper {
            for (p, &r) in self.cols.indices(k).iter().enumerate() {
                self.slot[r] = p;
            }
            fill.clear();
            for &(r, l) in &lower {
                let p = self.slot[r];
                if p != NONE {
                    let v = self.cols.value_at(k, p) - l * u;
                    self.cols.set_value_at(k, p, v);
                } else {
                    let v = -l * u;
                    if v.abs() >= zero_tolerance {
                        fill.push((r, v));
                    }
                }
            }
            for &r in self.cols.indices(k) {
                self.slot[r] = NONE;
            }

            let cancelled: Vec<usize> = self
                .cols
                .entries(k)
                .filter(|(_, v)| v.abs() < zero_tolerance)
                .map(|(r, _)| r)
                .collect();
            for r in cancelled {
                self.cols.remove_index(k, r);
                self.rows.remove_index(r, k);
                self.nnz -= 1;
                self.relist_row(r);
            }

            for &(r, v) in &fill {
                self.cols.push(k, r, v)?;
                self.rows.push(r, k, ())?;
                self.nnz += 1;
            }
            self.relist_col(k);
        }
        for &(r, _) in &lower {
            self.relist_row(r);
        }

        Ok(PivotStep {
            row: rp,
            col: kp,
            diag: piv,
            lower,
            upper,
        })
    }
}

/// Factor the `m x n` basis matrix (`n <= m`) into a pivot sequence.
///
/// Columns that lose all their entries are reported singular, and rows
/// that never receive a pivot are reported unpivoted.
pub(crate) fn eliminate<T>(
    basis: &CscMatrix<T>,
    settings: &FactorSettings<T>,
    capacity: usize,
) -> Result<Elimination<T>, AreaFull>
where
    T: FloatT,
{
    let mut active = ActiveMatrix::new(basis, capacity, settings.zero_tolerance)?;
    let mut out = Elimination::default();

    while active.ncols_active > 0 {
        while let Some(k) = active.col_lists.first(0) {
            active.retire_col(k);
            out.singular_columns.push(k);
        }
        if active.ncols_active == 0 {
            break;
        }

        if active.wants_dense(settings) {
            eliminate_dense(&mut active, settings.zero_tolerance, &mut out);
            break;
        }

        match active.find_pivot(settings) {
            Some((r, k, v)) => {
                let step = active.pivot(r, k, v, settings.zero_tolerance)?;
                out.steps.push(step);
            }
            None => {
                for k in active.active_cols() {
                    active.retire_col(k);
                    out.singular_columns.push(k);
                }
            }
        }
    }

    out.unpivoted_rows = active.active_rows();
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    fn settings() -> FactorSettings<f64> {
        FactorSettings {
            dense_enable: false,
            ..FactorSettings::default()
        }
    }

    #[test]
    fn test_singletons_first() {
        // column 1 and column 2 are singletons, column 0 is not
        let basis = CscMatrix::from(&[[1., 0., 0.], [2., 1., 0.], [0., 0., 1.]]);
        let elim = eliminate(&basis, &settings(), 64).unwrap();
        assert_eq!(elim.steps.len(), 3);
        assert_eq!((elim.steps[0].row, elim.steps[0].col), (1, 1));
        assert_eq!(elim.steps[0].upper, vec![(0, 2.0)]);
        assert!(elim.singular_columns.is_empty());
        assert!(elim.unpivoted_rows.is_empty());
    }

    #[test]
    fn test_stability_threshold() {
        // the tiny entry must never be chosen as a pivot
        let basis = CscMatrix::from(&[[1e-6, 1.], [1., 1.]]);
        let elim = eliminate(&basis, &settings(), 64).unwrap();
        for step in &elim.steps {
            assert!(step.diag.abs() > 1e-3);
        }
    }

    #[test]
    fn test_dependent_columns() {
        let basis = CscMatrix::from(&[[1., 2., 0.], [1., 2., 0.], [0., 0., 1.]]);
        let elim = eliminate(&basis, &settings(), 64).unwrap();
        assert_eq!(elim.steps.len(), 2);
        assert_eq!(elim.singular_columns.len(), 1);
        assert_eq!(elim.unpivoted_rows.len(), 1);
    }

    #[test]
    fn test_area_too_small() {
        let basis = CscMatrix::from(&[[1., 1.], [1., -1.]]);
        assert!(eliminate(&basis, &settings(), 2).is_err());
    }
}
