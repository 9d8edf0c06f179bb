//! Basis updates after a simplex pivot.
//!
//! The Forrest-Tomlin update replaces one column of U by the spike saved
//! by [`update_column_ft`](Factorization::update_column_ft), moves that
//! position to the end of the pivot order and eliminates its old row with
//! a new row eta in R.  The product form update instead appends an eta
//! applied after U.

use super::factorization::{Factorization, NONE};
use super::storage::AreaFull;
use super::{FactorStatus, ReplaceStatus};
use crate::algebra::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

impl<T> Factorization<T>
where
    T: FloatT,
{
    /// Replace the basic variable at position `pivot_row` by the column
    /// last passed through [`update_column_ft`](Self::update_column_ft).
    ///
    /// `region` is that column after the full FTRAN; it is only read by the
    /// product form update.  `pivot_check` is the caller's pivot element
    /// (the entry of `region` at `pivot_row`) and is compared against the
    /// pivot recomputed from the factors.
    ///
    /// `Singular` never modifies the factors.  `Marginal` modifies them
    /// only when `check_before_modifying` is false and at least one update
    /// has already been applied since the last factorization.
    pub fn replace_column(
        &mut self,
        region: &IndexedVector<T>,
        pivot_row: usize,
        pivot_check: T,
        check_before_modifying: bool,
    ) -> ReplaceStatus {
        if self.status != FactorStatus::Ready {
            return ReplaceStatus::OutOfRoom;
        }
        if pivot_row >= self.m {
            return ReplaceStatus::Singular;
        }
        if self.pivots >= self.settings.maximum_pivots {
            return ReplaceStatus::TooManyPivots;
        }
        if !self.settings.forrest_tomlin {
            return self.replace_column_pfi(region, pivot_row);
        }
        let Some(spike) = self.spike.take() else {
            return ReplaceStatus::Singular;
        };
        let check_first = check_before_modifying || self.pivots == 0;
        let t = pivot_row;

        let etas = self.eliminate_pivot_row(t);
        let new_diag = etas
            .iter()
            .fold(spike.get(t), |acc, &(c, mult)| acc - mult * spike.get(c));
        let expected = pivot_check * self.factors.diag[t];

        let status = self.check_pivot(new_diag, expected);
        let rejected = match status {
            ReplaceStatus::Singular => true,
            ReplaceStatus::Marginal => check_first,
            _ => false,
        };
        if rejected {
            self.spike = Some(spike);
            let _ = self.print_rejection(t, "inaccurate pivot");
            return status;
        }

        let entries: Vec<(usize, T)> = spike
            .iter()
            .filter(|&(r, v)| r != t && v.abs() >= self.settings.zero_tolerance)
            .collect();
        if !self.has_room(t, entries.len(), etas.len()) {
            self.spike = Some(spike);
            let _ = self.print_rejection(t, "out of room");
            return ReplaceStatus::OutOfRoom;
        }

        if self.apply_update(t, &entries, etas, new_diag).is_err() {
            // partially rewritten factors cannot be used again
            self.status = FactorStatus::Unfactorized;
            return ReplaceStatus::OutOfRoom;
        }
        self.pivots += 1;
        status
    }

    /// Product form update: append the eta of the fully transformed
    /// column `region` with pivot at `pivot_row`.
    pub fn replace_column_pfi(&mut self, region: &IndexedVector<T>, pivot_row: usize) -> ReplaceStatus {
        if self.status != FactorStatus::Ready {
            return ReplaceStatus::OutOfRoom;
        }
        if pivot_row >= self.m || region.len() != self.m {
            return ReplaceStatus::Singular;
        }
        if self.pivots >= self.settings.maximum_pivots {
            return ReplaceStatus::TooManyPivots;
        }
        let alpha = region.get(pivot_row);
        let a = alpha.abs();
        if self.pivots > 0 {
            if a < (1e-7).as_T() {
                return ReplaceStatus::Singular;
            } else if a < (1e-5).as_T() {
                return ReplaceStatus::Marginal;
            }
        } else if a < (1e-8).as_T() {
            return ReplaceStatus::Singular;
        }

        let zero_tolerance = self.settings.zero_tolerance;
        let entries: Vec<(usize, T)> = region
            .iter()
            .filter(|&(i, v)| i != pivot_row && v.abs() > zero_tolerance)
            .collect();
        let f = &mut self.factors;
        if f.pfi.free() < entries.len() || f.pfi.push(pivot_row, entries).is_err() {
            let _ = self.print_rejection(pivot_row, "out of room");
            return ReplaceStatus::OutOfRoom;
        }
        f.pfi_diag.push(alpha);
        self.pivots += 1;
        ReplaceStatus::Accurate
    }

    /// Compare the recomputed pivot with the expected one.  The tolerance
    /// tightens as updates accumulate.
    pub(crate) fn check_pivot(&self, new_pivot: T, expected: T) -> ReplaceStatus {
        if new_pivot.is_negligible((1e-8).as_T()) {
            return ReplaceStatus::Singular;
        }
        let base = match self.pivots {
            0..=1 => 1e-5,
            2..=9 => 1e-6,
            10..=49 => 1e-8,
            _ => 1e-10,
        };
        let tolerance: T = base.as_T();
        let tolerance = tolerance * self.settings.relax_check;
        let gap = (T::one() - (new_pivot / expected).abs()).abs();

        if gap < tolerance {
            ReplaceStatus::Accurate
        } else if (expected.abs() - new_pivot.abs()).abs() < (1e-12).as_T() || gap < (1e-8).as_T() {
            ReplaceStatus::Marginal
        } else {
            ReplaceStatus::Singular
        }
    }

    // Row eta that eliminates row t of U, as (position, multiplier) in
    // pivot order.  Entries of the outgoing column t are ignored.
    fn eliminate_pivot_row(&mut self, t: usize) -> Vec<(usize, T)> {
        let f = &self.factors;
        let w = &mut self.work.dense;
        let queued = &mut self.work.mark;
        let zero_tolerance = self.settings.zero_tolerance;

        let mut heap = BinaryHeap::new();
        for (q, v) in f.u_row.entries(t) {
            w[q] = v;
            queued[q] = true;
            heap.push(Reverse((f.rank[q], q)));
        }

        let mut etas = Vec::new();
        while let Some(Reverse((_, q))) = heap.pop() {
            let v = w[q];
            w[q] = T::zero();
            queued[q] = false;
            if v.abs() < zero_tolerance {
                continue;
            }
            let mult = v / f.diag[q];
            etas.push((q, mult));
            for (q2, u) in f.u_row.entries(q) {
                if q2 == t {
                    continue;
                }
                w[q2] -= mult * u;
                if !queued[q2] {
                    queued[q2] = true;
                    heap.push(Reverse((f.rank[q2], q2)));
                }
            }
        }
        etas
    }

    fn has_room(&self, t: usize, spike_entries: usize, eta_entries: usize) -> bool {
        let f = &self.factors;
        let freed_col = f.u_col.len(t);
        let freed_row = f.u_col.len(t) + f.u_row.len(t);
        f.u_col.free_after_compaction() + freed_col >= spike_entries
            && f.u_row.free_after_compaction() + freed_row >= spike_entries
            && f.r.free() >= eta_entries
    }

    fn apply_update(&mut self, t: usize, entries: &[(usize, T)], etas: Vec<(usize, T)>, new_diag: T) -> Result<(), AreaFull> {
        let f = &mut self.factors;

        let old_col = f.u_col.indices(t).to_vec();
        for r in old_col {
            f.u_row.remove_index(r, t);
        }
        f.u_col.clear(t);

        let old_row = f.u_row.indices(t).to_vec();
        for q in old_row {
            f.u_col.remove_index(q, t);
        }
        f.u_row.clear(t);

        f.u_col.reserve(t, entries.len())?;
        for &(r, v) in entries {
            f.u_col.push(t, r, v)?;
            f.u_row.push(r, t, v)?;
        }
        f.diag[t] = new_diag;
        f.r.push(t, etas)?;

        // t is now last in pivot order
        f.position_of_rank[f.rank[t]] = NONE;
        f.rank[t] = f.next_rank;
        f.position_of_rank[f.next_rank] = t;
        f.next_rank += 1;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    #![allow(non_snake_case)]
    use super::*;
    use crate::factor::{BasisColumn, BasisFlags, FactorSettings, FactorSettingsBuilder};

    // columns 0..3 form the basis, column 3 enters
    fn setup(settings: FactorSettings<f64>) -> (CscMatrix<f64>, Factorization<f64>) {
        let A = CscMatrix::from(&[[2., 0., 1., 1.], [1., 3., 0., 2.], [0., 1., 4., 1.]]);
        let mut flags = BasisFlags::new(3, 4);
        (0..3).for_each(|j| flags.set_column_basic(j, true));
        let mut factor = Factorization::new(settings);
        factor.factorize(&A, &mut flags).unwrap();
        (A, factor)
    }

    fn entering(A: &CscMatrix<f64>, factor: &mut Factorization<f64>) -> IndexedVector<f64> {
        entering_column(A, factor, 3)
    }

    fn entering_column(A: &CscMatrix<f64>, factor: &mut Factorization<f64>, j: usize) -> IndexedVector<f64> {
        let mut a = vec![0.; 3];
        A.col_axpy(j, 1., &mut a);
        let mut alpha = IndexedVector::from_dense(&a);
        factor.update_column_ft(&mut alpha).unwrap();
        alpha
    }

    // solve B x = b and check it against the columns in each position
    fn check_solution(A: &CscMatrix<f64>, factor: &mut Factorization<f64>, at: &[usize]) {
        let b = [1., 2., 3.];
        let mut x = IndexedVector::from_dense(&b);
        factor.update_column(&mut x).unwrap();
        let mut y = vec![0.; 3];
        for p in 0..3 {
            A.col_axpy(at[p], x.get(p), &mut y);
        }
        for i in 0..3 {
            assert!((y[i] - b[i]).abs() < 1e-10);
        }
    }

    fn column_at(factor: &Factorization<f64>) -> Vec<usize> {
        (0..3)
            .map(|p| match factor.variable_at(p) {
                Some(BasisColumn::Structural(j)) => j,
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn test_forrest_tomlin_update() {
        let (A, mut factor) = setup(FactorSettings::default());
        let mut at = column_at(&factor);
        let t = factor.row_of_column(0).unwrap();

        let alpha = entering(&A, &mut factor);
        assert!((alpha.get(t) - 0.44).abs() < 1e-12);
        let status = factor.replace_column(&alpha, t, alpha.get(t), true);
        assert_eq!(status, ReplaceStatus::Accurate);
        assert_eq!(factor.pivots(), 1);
        assert!(factor.check_consistency());

        at[t] = 3;
        check_solution(&A, &mut factor, &at);
    }

    #[test]
    fn test_reject_inaccurate_pivot() {
        let (A, mut factor) = setup(FactorSettings::default());
        let at = column_at(&factor);
        let t = factor.row_of_column(0).unwrap();

        let alpha = entering(&A, &mut factor);
        let status = factor.replace_column(&alpha, t, 2. * alpha.get(t), true);
        assert_eq!(status, ReplaceStatus::Singular);
        assert_eq!(status.code(), 2);
        assert_eq!(factor.pivots(), 0);

        // the factors still describe the old basis
        check_solution(&A, &mut factor, &at);
    }

    #[test]
    fn test_product_form_update() {
        let settings = FactorSettingsBuilder::<f64>::default()
            .forrest_tomlin(false)
            .build()
            .unwrap();
        let (A, mut factor) = setup(settings);
        let mut at = column_at(&factor);
        let t = factor.row_of_column(0).unwrap();

        let alpha = entering(&A, &mut factor);
        let status = factor.replace_column(&alpha, t, alpha.get(t), true);
        assert_eq!(status, ReplaceStatus::Accurate);
        assert!(factor.number_elements_r() > 0);

        at[t] = 3;
        check_solution(&A, &mut factor, &at);
    }

    #[test]
    fn test_too_many_pivots() {
        let settings = FactorSettingsBuilder::<f64>::default()
            .maximum_pivots(1)
            .build()
            .unwrap();
        let (A, mut factor) = setup(settings);
        let t = factor.row_of_column(0).unwrap();

        let alpha = entering(&A, &mut factor);
        assert_eq!(
            factor.replace_column(&alpha, t, alpha.get(t), true),
            ReplaceStatus::Accurate
        );
        let alpha = entering(&A, &mut factor);
        assert_eq!(
            factor.replace_column(&alpha, t, alpha.get(t), true),
            ReplaceStatus::TooManyPivots
        );
    }

    #[test]
    fn test_marginal_applied_after_first_update() {
        let settings = FactorSettingsBuilder::<f64>::default()
            .relax_check(1e-6)
            .build()
            .unwrap();
        let (A, mut factor) = setup(settings);
        let mut at = column_at(&factor);
        let t = factor.row_of_column(0).unwrap();

        let alpha = entering(&A, &mut factor);
        assert_eq!(
            factor.replace_column(&alpha, t, alpha.get(t), true),
            ReplaceStatus::Accurate
        );
        at[t] = 3;

        // column 0 comes back with a slightly perturbed pivot estimate
        let alpha = entering_column(&A, &mut factor, 0);
        let estimate = alpha.get(t) * (1. + 1e-9);
        let status = factor.replace_column(&alpha, t, estimate, true);
        assert_eq!(status, ReplaceStatus::Marginal);
        assert_eq!(factor.pivots(), 1);
        check_solution(&A, &mut factor, &at);

        let alpha = entering_column(&A, &mut factor, 0);
        let status = factor.replace_column(&alpha, t, estimate, false);
        assert_eq!(status, ReplaceStatus::Marginal);
        assert_eq!(factor.pivots(), 2);
        at[t] = 0;
        check_solution(&A, &mut factor, &at);
    }

    #[test]
    fn test_product_form_out_of_room() {
        // the eta file holds nine entries and every swap below adds two
        let settings = FactorSettingsBuilder::<f64>::default()
            .forrest_tomlin(false)
            .area_factor(1.0)
            .build()
            .unwrap();
        let (A, mut factor) = setup(settings);
        let t = factor.row_of_column(0).unwrap();

        for (n, j) in [3, 0, 3, 0].into_iter().enumerate() {
            let alpha = entering_column(&A, &mut factor, j);
            assert_eq!(alpha.nnz(), 3);
            assert_eq!(
                factor.replace_column(&alpha, t, alpha.get(t), true),
                ReplaceStatus::Accurate
            );
            assert_eq!(factor.pivots(), n + 1);
        }
        let alpha = entering_column(&A, &mut factor, 3);
        let status = factor.replace_column(&alpha, t, alpha.get(t), true);
        assert_eq!(status, ReplaceStatus::OutOfRoom);
        assert_eq!(status.code(), 3);
        assert!(status.needs_refactorization());
        assert_eq!(factor.pivots(), 4);
    }

    #[test]
    fn test_pivot_row_out_of_range() {
        let (A, mut factor) = setup(FactorSettings::default());
        let at = column_at(&factor);
        let alpha = entering(&A, &mut factor);
        assert_eq!(
            factor.replace_column(&alpha, 3, 1.0, true),
            ReplaceStatus::Singular
        );
        assert_eq!(factor.pivots(), 0);
        check_solution(&A, &mut factor, &at);

        // the saved column is still available for a valid row
        let t = factor.row_of_column(0).unwrap();
        assert_eq!(
            factor.replace_column(&alpha, t, alpha.get(t), true),
            ReplaceStatus::Accurate
        );
    }

    #[test]
    fn test_check_pivot_schedule() {
        let (_, mut factor) = setup(FactorSettings::default());
        assert_eq!(factor.check_pivot(1.0 + 1e-6, 1.0), ReplaceStatus::Accurate);
        factor.pivots = 60;
        assert_eq!(factor.check_pivot(1.0 + 1e-9, 1.0), ReplaceStatus::Marginal);
        assert_eq!(factor.check_pivot(1.1, 1.0), ReplaceStatus::Singular);
        assert_eq!(factor.check_pivot(1e-9, 1e-9), ReplaceStatus::Singular);
    }
}
