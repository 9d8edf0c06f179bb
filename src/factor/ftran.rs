//! Forward solves `B x = b`.
//!
//! The right hand side passes through L, the Forrest-Tomlin row etas R,
//! U and finally the product form etas.  L and U each have three kernels;
//! the one used is chosen per call from the expected density of the result.

use super::factorization::{Factorization, LuFactors, SolveStatistics, SolveWorkspace, NONE};
use super::traverse::{depth_first, touch};
use super::{FactorError, SolveStrategy};
use crate::algebra::{FloatT, IndexedVector};

const EMPTY: &[usize] = &[];

impl<T> LuFactors<T>
where
    T: FloatT,
{
    pub(crate) fn ftran_l(&self, x: &mut [T], idx: &mut Vec<usize>, work: &mut SolveWorkspace<T>, strategy: SolveStrategy) {
        match strategy {
            SolveStrategy::Dense => {
                for e in 0..self.l.len() {
                    let xp = x[self.l.pivot(e)];
                    if xp == T::zero() {
                        continue;
                    }
                    for (i, l) in self.l.entries(e) {
                        x[i] -= l * xp;
                    }
                }
                work.rebuild(x, idx);
            }
            SolveStrategy::SemiSparse => {
                for &i in idx.iter() {
                    work.steps.insert(self.l_step[i]);
                }
                while let Some(s) = work.steps.pop_lowest() {
                    let p = self.row_of_step[s];
                    let xp = x[p];
                    let Some(e) = self.l_of_row[p] else { continue };
                    if xp == T::zero() {
                        continue;
                    }
                    for (i, l) in self.l.entries(e) {
                        x[i] -= l * xp;
                        touch(&mut work.mark, idx, i);
                        work.steps.insert(self.l_step[i]);
                    }
                }
            }
            SolveStrategy::Sparse => {
                let starts = idx.clone();
                depth_first(
                    &starts,
                    |p| match self.l_of_row[p] {
                        Some(e) => self.l.indices(e),
                        None => EMPTY,
                    },
                    &mut work.visited,
                    &mut work.stack,
                    &mut work.postorder,
                );
                for k in (0..work.postorder.len()).rev() {
                    let p = work.postorder[k];
                    work.visited[p] = false;
                    let xp = x[p];
                    let Some(e) = self.l_of_row[p] else { continue };
                    if xp == T::zero() {
                        continue;
                    }
                    for (i, l) in self.l.entries(e) {
                        x[i] -= l * xp;
                        touch(&mut work.mark, idx, i);
                    }
                }
            }
        }
    }

    pub(crate) fn ftran_r(&self, x: &mut [T], idx: &mut Vec<usize>, work: &mut SolveWorkspace<T>) {
        for e in 0..self.r.len() {
            let s = self.r.dot(e, x);
            if s != T::zero() {
                let t = self.r.pivot(e);
                x[t] -= s;
                touch(&mut work.mark, idx, t);
            }
        }
    }

    pub(crate) fn ftran_u(&self, x: &mut [T], idx: &mut Vec<usize>, work: &mut SolveWorkspace<T>, strategy: SolveStrategy) {
        match strategy {
            SolveStrategy::Dense => {
                for rk in (0..self.next_rank).rev() {
                    let q = self.position_of_rank[rk];
                    if q == NONE || x[q] == T::zero() {
                        continue;
                    }
                    let xq = x[q] / self.diag[q];
                    x[q] = xq;
                    for (r, u) in self.u_col.entries(q) {
                        x[r] -= u * xq;
                    }
                }
                work.rebuild(x, idx);
            }
            SolveStrategy::SemiSparse => {
                for &i in idx.iter() {
                    work.ranks.insert(self.rank[i]);
                }
                while let Some(rk) = work.ranks.pop_highest() {
                    let q = self.position_of_rank[rk];
                    if x[q] == T::zero() {
                        continue;
                    }
                    let xq = x[q] / self.diag[q];
                    x[q] = xq;
                    for (r, u) in self.u_col.entries(q) {
                        x[r] -= u * xq;
                        touch(&mut work.mark, idx, r);
                        work.ranks.insert(self.rank[r]);
                    }
                }
            }
            SolveStrategy::Sparse => {
                let starts = idx.clone();
                depth_first(
                    &starts,
                    |q| self.u_col.indices(q),
                    &mut work.visited,
                    &mut work.stack,
                    &mut work.postorder,
                );
                for k in (0..work.postorder.len()).rev() {
                    let q = work.postorder[k];
                    work.visited[q] = false;
                    if x[q] == T::zero() {
                        continue;
                    }
                    let xq = x[q] / self.diag[q];
                    x[q] = xq;
                    for (r, u) in self.u_col.entries(q) {
                        x[r] -= u * xq;
                        touch(&mut work.mark, idx, r);
                    }
                }
            }
        }
    }

    pub(crate) fn ftran_pfi(&self, x: &mut [T], idx: &mut Vec<usize>, work: &mut SolveWorkspace<T>) {
        for e in 0..self.pfi.len() {
            let t = self.pfi.pivot(e);
            if x[t] == T::zero() {
                continue;
            }
            let xt = x[t] / self.pfi_diag[e];
            x[t] = xt;
            for (i, a) in self.pfi.entries(e) {
                x[i] -= a * xt;
                touch(&mut work.mark, idx, i);
            }
        }
    }
}

impl<T> Factorization<T>
where
    T: FloatT,
{
    /// FTRAN: overwrite `region` with `B⁻¹ region`.
    ///
    /// On return entry `p` of `region` is the value of the basic variable
    /// pivoted at row `p`.
    pub fn update_column(&mut self, region: &mut IndexedVector<T>) -> Result<(), FactorError> {
        self.check_ready(region)?;
        self.ftran(region, false);
        Ok(())
    }

    /// FTRAN that also keeps the partially transformed column needed by
    /// the next [`replace_column`](Self::replace_column).
    pub fn update_column_ft(&mut self, region: &mut IndexedVector<T>) -> Result<(), FactorError> {
        self.check_ready(region)?;
        self.ftran(region, true);
        Ok(())
    }

    fn ftran(&mut self, region: &mut IndexedVector<T>, save_spike: bool) {
        self.begin_solve(region);

        let nin = region.nnz();
        let strategy = self.choose_strategy(self.stats.ftran_l, nin);
        {
            let (x, idx) = region.parts_mut();
            self.factors.ftran_l(x, idx, &mut self.work, strategy);
        }
        let nl = region.nnz();
        SolveStatistics::record(&mut self.stats.ftran_l, nin, nl);

        {
            let (x, idx) = region.parts_mut();
            self.factors.ftran_r(x, idx, &mut self.work);
        }
        let nr = region.nnz();
        SolveStatistics::record(&mut self.stats.ftran_r, nl, nr);

        if save_spike {
            self.spike = Some(region.clone());
        }

        let strategy = self.choose_strategy(self.stats.ftran_u, nr);
        {
            let (x, idx) = region.parts_mut();
            self.factors.ftran_u(x, idx, &mut self.work, strategy);
            self.factors.ftran_pfi(x, idx, &mut self.work);
        }
        SolveStatistics::record(&mut self.stats.ftran_u, nr, region.nnz());
        self.stats.ftran_count += 1;

        self.end_solve(region);
    }

    /// Drop duplicate indices and mark the listed positions.
    pub(crate) fn begin_solve(&mut self, region: &mut IndexedVector<T>) {
        let mark = &mut self.work.mark;
        let (_, idx) = region.parts_mut();
        idx.retain(|&i| {
            if mark[i] {
                false
            } else {
                mark[i] = true;
                true
            }
        });
    }

    pub(crate) fn end_solve(&mut self, region: &mut IndexedVector<T>) {
        for &i in region.indices() {
            self.work.mark[i] = false;
        }
        region.clean(self.settings.zero_tolerance);
    }
}
