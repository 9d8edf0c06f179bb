//! Transposed solves `Bᵀ y = c`, applying the factors in reverse.

use super::factorization::{Factorization, LuFactors, SolveStatistics, SolveWorkspace, NONE};
use super::traverse::{depth_first, touch};
use super::{FactorError, SolveStrategy};
use crate::algebra::{FloatT, IndexedVector};

impl<T> LuFactors<T>
where
    T: FloatT,
{
    pub(crate) fn btran_pfi(&self, x: &mut [T], idx: &mut Vec<usize>, work: &mut SolveWorkspace<T>) {
        for e in (0..self.pfi.len()).rev() {
            let t = self.pfi.pivot(e);
            let v = (x[t] - self.pfi.dot(e, x)) / self.pfi_diag[e];
            x[t] = v;
            if v != T::zero() {
                touch(&mut work.mark, idx, t);
            }
        }
    }

    pub(crate) fn btran_u(&self, x: &mut [T], idx: &mut Vec<usize>, work: &mut SolveWorkspace<T>, strategy: SolveStrategy) {
        match strategy {
            SolveStrategy::Dense => {
                for rk in 0..self.next_rank {
                    let p = self.position_of_rank[rk];
                    if p == NONE || x[p] == T::zero() {
                        continue;
                    }
                    let xp = x[p] / self.diag[p];
                    x[p] = xp;
                    for (q, u) in self.u_row.entries(p) {
                        x[q] -= u * xp;
                    }
                }
                work.rebuild(x, idx);
            }
            SolveStrategy::SemiSparse => {
                for &i in idx.iter() {
                    work.ranks.insert(self.rank[i]);
                }
                while let Some(rk) = work.ranks.pop_lowest() {
                    let p = self.position_of_rank[rk];
                    if x[p] == T::zero() {
                        continue;
                    }
                    let xp = x[p] / self.diag[p];
                    x[p] = xp;
                    for (q, u) in self.u_row.entries(p) {
                        x[q] -= u * xp;
                        touch(&mut work.mark, idx, q);
                        work.ranks.insert(self.rank[q]);
                    }
                }
            }
            SolveStrategy::Sparse => {
                let starts = idx.clone();
                depth_first(
                    &starts,
                    |p| self.u_row.indices(p),
                    &mut work.visited,
                    &mut work.stack,
                    &mut work.postorder,
                );
                for k in (0..work.postorder.len()).rev() {
                    let p = work.postorder[k];
                    work.visited[p] = false;
                    if x[p] == T::zero() {
                        continue;
                    }
                    let xp = x[p] / self.diag[p];
                    x[p] = xp;
                    for (q, u) in self.u_row.entries(p) {
                        x[q] -= u * xp;
                        touch(&mut work.mark, idx, q);
                    }
                }
            }
        }
    }

    pub(crate) fn btran_r(&self, x: &mut [T], idx: &mut Vec<usize>, work: &mut SolveWorkspace<T>) {
        for e in (0..self.r.len()).rev() {
            let xt = x[self.r.pivot(e)];
            if xt == T::zero() {
                continue;
            }
            for (c, mult) in self.r.entries(e) {
                x[c] -= mult * xt;
                touch(&mut work.mark, idx, c);
            }
        }
    }

    pub(crate) fn btran_l(&self, x: &mut [T], idx: &mut Vec<usize>, work: &mut SolveWorkspace<T>, strategy: SolveStrategy) {
        match strategy {
            SolveStrategy::Dense => {
                for e in (0..self.l.len()).rev() {
                    let s = self.l.dot(e, x);
                    if s != T::zero() {
                        x[self.l.pivot(e)] -= s;
                    }
                }
                work.rebuild(x, idx);
            }
            SolveStrategy::SemiSparse => {
                for &i in idx.iter() {
                    work.steps.insert(self.l_step[i]);
                }
                while let Some(s) = work.steps.pop_highest() {
                    let i = self.row_of_step[s];
                    let xi = x[i];
                    if xi == T::zero() {
                        continue;
                    }
                    for (p, l) in self.lt.entries(i) {
                        x[p] -= l * xi;
                        touch(&mut work.mark, idx, p);
                        work.steps.insert(self.l_step[p]);
                    }
                }
            }
            SolveStrategy::Sparse => {
                let starts = idx.clone();
                depth_first(
                    &starts,
                    |i| self.lt.indices(i),
                    &mut work.visited,
                    &mut work.stack,
                    &mut work.postorder,
                );
                for k in (0..work.postorder.len()).rev() {
                    let i = work.postorder[k];
                    work.visited[i] = false;
                    let xi = x[i];
                    if xi == T::zero() {
                        continue;
                    }
                    for (p, l) in self.lt.entries(i) {
                        x[p] -= l * xi;
                        touch(&mut work.mark, idx, p);
                    }
                }
            }
        }
    }
}

impl<T> Factorization<T>
where
    T: FloatT,
{
    /// BTRAN: overwrite `region` with `B⁻ᵀ region`.
    ///
    /// The input is indexed by pivot row (basic position), the output by
    /// constraint row, so it holds the duals of the rows for a cost vector
    /// given on the basic variables.
    pub fn update_column_transpose(&mut self, region: &mut IndexedVector<T>) -> Result<(), FactorError> {
        self.check_ready(region)?;
        self.begin_solve(region);

        let nin = region.nnz();
        {
            let (x, idx) = region.parts_mut();
            self.factors.btran_pfi(x, idx, &mut self.work);
        }
        let npfi = region.nnz();

        let strategy = self.choose_strategy(self.stats.btran_u, npfi);
        {
            let (x, idx) = region.parts_mut();
            self.factors.btran_u(x, idx, &mut self.work, strategy);
        }
        let nu = region.nnz();
        SolveStatistics::record(&mut self.stats.btran_u, nin, nu);

        {
            let (x, idx) = region.parts_mut();
            self.factors.btran_r(x, idx, &mut self.work);
        }
        let nr = region.nnz();
        SolveStatistics::record(&mut self.stats.btran_r, nu, nr);

        let strategy = self.choose_strategy(self.stats.btran_l, nr);
        {
            let (x, idx) = region.parts_mut();
            self.factors.btran_l(x, idx, &mut self.work, strategy);
        }
        SolveStatistics::record(&mut self.stats.btran_l, nr, region.nnz());
        self.stats.btran_count += 1;

        self.end_solve(region);
        Ok(())
    }
}
