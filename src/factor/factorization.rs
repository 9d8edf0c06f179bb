#![allow(non_snake_case)]
use super::basis::{BasisColumn, BasisFlags, BasisMark};
use super::error::{FactorError, FactorStatus};
use super::eta::EtaFile;
use super::markowitz::{eliminate, Elimination};
use super::storage::{AreaFull, PackedArea};
use super::traverse::BitScan;
use super::{FactorSettings, SolveStrategy};
use crate::algebra::*;
use crate::io::{ConfigurablePrintTarget, PrintTarget};
use std::io::Write;

pub(crate) const NONE: usize = usize::MAX;

/// Running averages of fill-in, one per solve phase.
///
/// Each average tracks `nnz(out) / nnz(in)` for its phase and is used to
/// predict the density of the next solve when choosing a kernel.
#[derive(Debug, Clone)]
pub struct SolveStatistics {
    pub ftran_l: f64,
    pub ftran_r: f64,
    pub ftran_u: f64,
    pub btran_u: f64,
    pub btran_r: f64,
    pub btran_l: f64,
    pub ftran_count: usize,
    pub btran_count: usize,
}

impl Default for SolveStatistics {
    fn default() -> Self {
        Self {
            ftran_l: 1.0,
            ftran_r: 1.0,
            ftran_u: 1.0,
            btran_u: 1.0,
            btran_r: 1.0,
            btran_l: 1.0,
            ftran_count: 0,
            btran_count: 0,
        }
    }
}

impl SolveStatistics {
    pub(crate) fn record(avg: &mut f64, nin: usize, nout: usize) {
        if nin > 0 {
            let ratio = nout as f64 / nin as f64;
            *avg = 0.9 * *avg + 0.1 * ratio;
        }
    }
}

/// The L, U, R and product-form factors of one basis.
///
/// Row `p` of the factorization doubles as the position of the basic
/// variable pivoted there, so FTRAN results are indexed by pivot row.
#[derive(Debug, Clone)]
pub(crate) struct LuFactors<T> {
    pub m: usize,
    // L as column etas in pivot order, plus a row-wise copy
    pub l: EtaFile<T>,
    pub lt: EtaFile<T>,
    pub l_of_row: Vec<Option<usize>>,
    pub l_step: Vec<usize>,
    pub row_of_step: Vec<usize>,
    // U without its diagonal, column copy by position and row copy by row
    pub u_col: PackedArea<T>,
    pub u_row: PackedArea<T>,
    pub diag: Vec<T>,
    pub rank: Vec<usize>,
    pub position_of_rank: Vec<usize>,
    pub next_rank: usize,
    // Forrest-Tomlin row etas
    pub r: EtaFile<T>,
    // product form etas and their pivots
    pub pfi: EtaFile<T>,
    pub pfi_diag: Vec<T>,
}

impl<T> LuFactors<T>
where
    T: FloatT,
{
    pub fn new(m: usize, maximum_pivots: usize) -> Self {
        Self {
            m,
            l: EtaFile::new(0),
            lt: EtaFile::new(0),
            l_of_row: vec![None; m],
            l_step: vec![0; m],
            row_of_step: vec![0; m],
            u_col: PackedArea::new(m, 0),
            u_row: PackedArea::new(m, 0),
            diag: vec![T::zero(); m],
            rank: vec![0; m],
            position_of_rank: vec![NONE; m + maximum_pivots + 1],
            next_rank: 0,
            r: EtaFile::new(0),
            pfi: EtaFile::new(0),
            pfi_diag: Vec::new(),
        }
    }

    /// Assemble the factors from a full-rank elimination.
    pub fn build(&mut self, elim: &Elimination<T>, capacity: usize) -> Result<(), AreaFull> {
        let m = self.m;
        let mut row_of_col = vec![NONE; elim.steps.len()];
        for step in &elim.steps {
            row_of_col[step.col] = step.row;
        }

        self.l = EtaFile::new(capacity);
        self.l_of_row.iter_mut().for_each(|e| *e = None);
        self.position_of_rank.iter_mut().for_each(|p| *p = NONE);

        let mut transposed: Vec<Vec<(usize, T)>> = vec![Vec::new(); m];
        let mut col_count = vec![0usize; m];
        for (s, step) in elim.steps.iter().enumerate() {
            self.l_step[step.row] = s;
            self.row_of_step[s] = step.row;
            self.rank[step.row] = s;
            self.position_of_rank[s] = step.row;
            self.diag[step.row] = step.diag;
            if !step.lower.is_empty() {
                let e = self.l.push(step.row, step.lower.iter().copied())?;
                self.l_of_row[step.row] = Some(e);
                for &(i, l) in &step.lower {
                    transposed[i].push((step.row, l));
                }
            }
            for &(k, _) in &step.upper {
                col_count[row_of_col[k]] += 1;
            }
        }
        self.next_rank = elim.steps.len();

        self.lt = EtaFile::new(self.l.number_elements());
        for (i, entries) in transposed.into_iter().enumerate() {
            self.lt.push(i, entries)?;
        }

        self.u_col = PackedArea::new(m, capacity);
        self.u_row = PackedArea::new(m, capacity);
        for q in 0..m {
            self.u_col.reserve(q, col_count[q])?;
        }
        for step in &elim.steps {
            self.u_row.reserve(step.row, step.upper.len())?;
            for &(k, u) in &step.upper {
                let q = row_of_col[k];
                self.u_col.push(q, step.row, u)?;
                self.u_row.push(step.row, q, u)?;
            }
        }

        self.r = EtaFile::new(capacity);
        self.pfi = EtaFile::new(capacity);
        self.pfi_diag.clear();
        Ok(())
    }
}

/// Scratch space reused by every solve and update.
#[derive(Debug, Clone)]
pub(crate) struct SolveWorkspace<T> {
    pub mark: Vec<bool>,
    pub visited: Vec<bool>,
    pub stack: Vec<(usize, usize)>,
    pub postorder: Vec<usize>,
    pub steps: BitScan,
    pub ranks: BitScan,
    pub dense: Vec<T>,
}

impl<T> SolveWorkspace<T>
where
    T: FloatT,
{
    pub fn new(m: usize, maximum_pivots: usize) -> Self {
        Self {
            mark: vec![false; m],
            visited: vec![false; m],
            stack: Vec::new(),
            postorder: Vec::new(),
            steps: BitScan::new(m),
            ranks: BitScan::new(m + maximum_pivots + 1),
            dense: vec![T::zero(); m],
        }
    }

    /// Rebuild the index list from scratch after a dense kernel.
    pub fn rebuild(&mut self, x: &[T], indices: &mut Vec<usize>) {
        for &i in indices.iter() {
            self.mark[i] = false;
        }
        indices.clear();
        for (i, &v) in x.iter().enumerate() {
            if v != T::zero() {
                self.mark[i] = true;
                indices.push(i);
            }
        }
    }
}

/// Sparse LU factorization of a simplex basis with Forrest-Tomlin or
/// product-form updates.
///
/// __Example usage__ : factor a basis of two structurals and one slack
///
/// ```no_run
/// use tomlin::algebra::*;
/// use tomlin::factor::*;
///
/// let A = CscMatrix::from(&[[1., 0.], [2., 1.], [0., 0.]]);
/// let mut flags = BasisFlags::slack_basis(3, 2);
/// flags.set_column_basic(0, true);
/// flags.set_column_basic(1, true);
/// flags.set_row_basic(0, false);
/// flags.set_row_basic(1, false);
///
/// let mut factor = Factorization::<f64>::new(FactorSettings::default());
/// factor.factorize(&A, &mut flags).unwrap();
///
/// let mut x = IndexedVector::unit(3, 0);
/// factor.update_column(&mut x).unwrap();
/// ```
pub struct Factorization<T: FloatT = f64> {
    pub settings: FactorSettings<T>,
    pub(crate) status: FactorStatus,
    pub(crate) m: usize,
    pub(crate) factors: LuFactors<T>,
    pub(crate) work: SolveWorkspace<T>,
    pub(crate) stats: SolveStatistics,
    // partially transformed column from the last update_column_ft
    pub(crate) spike: Option<IndexedVector<T>>,
    pub(crate) pivots: usize,
    variable_at: Vec<Option<BasisColumn>>,
    unpivoted_rows: Vec<usize>,
    dense_size: usize,
    area_factor: f64,
    pub(crate) stream: PrintTarget,
}

impl<T: FloatT> ConfigurablePrintTarget for Factorization<T> {
    fn print_target_mut(&mut self) -> &mut PrintTarget {
        &mut self.stream
    }
}

impl<T> Factorization<T>
where
    T: FloatT,
{
    pub fn new(settings: FactorSettings<T>) -> Self {
        let maximum_pivots = settings.maximum_pivots;
        let area_factor = settings.area_factor;
        Self {
            settings,
            status: FactorStatus::Unfactorized,
            m: 0,
            factors: LuFactors::new(0, maximum_pivots),
            work: SolveWorkspace::new(0, maximum_pivots),
            stats: SolveStatistics::default(),
            spike: None,
            pivots: 0,
            variable_at: Vec::new(),
            unpivoted_rows: Vec::new(),
            dense_size: 0,
            area_factor,
            stream: PrintTarget::default(),
        }
    }

    /// Replace the settings of an existing factorization.  Settings that
    /// size the update storage cannot change.
    pub fn update_settings(&mut self, settings: FactorSettings<T>) -> Result<(), crate::utils::SettingsError> {
        settings.validate_as_update(&self.settings)?;
        self.area_factor = settings.area_factor;
        self.settings = settings;
        Ok(())
    }

    /// Factorize the basis selected by `flags` from the columns of `matrix`
    /// and the row slacks.
    ///
    /// On success every basic entry of `flags` is marked with its pivot row.
    /// On a singular basis the dependent columns are marked
    /// `BasisMark::Singular`, and [`unpivoted_rows`](Self::unpivoted_rows)
    /// lists the rows whose slacks would repair it.
    pub fn factorize(&mut self, matrix: &CscMatrix<T>, flags: &mut BasisFlags) -> Result<(), FactorError> {
        matrix.check_format()?;
        if flags.rows.len() != matrix.m || flags.columns.len() != matrix.n {
            return Err(FactorError::IncompatibleDimension);
        }

        self.status = FactorStatus::Unfactorized;
        let m = matrix.m;
        let basic = flags.basic_columns();
        if basic.len() > m {
            return Err(FactorError::TooManyColumns);
        }
        if m != self.m {
            self.resize(m);
        }

        let basis = self.basis_matrix(matrix, &basic);
        let base = basis.nnz() + m;
        let mut area_factor = self.area_factor;
        let mut retries = 0;

        let elim = loop {
            let capacity = (area_factor * base as f64).ceil() as usize;
            let built = eliminate(&basis, &self.settings, capacity).and_then(|elim| {
                if elim.steps.len() == m {
                    self.factors.build(&elim, capacity)?;
                }
                Ok(elim)
            });
            match built {
                Ok(elim) => break elim,
                Err(AreaFull) if retries < self.settings.maximum_area_retries => {
                    retries += 1;
                    area_factor *= 2.0;
                }
                Err(AreaFull) => {
                    let _ = self.print_failure("out of memory");
                    return Err(FactorError::OutOfMemory);
                }
            }
        };
        // keep the larger area for the next factorization
        self.area_factor = area_factor;
        self.dense_size = elim.dense_size;
        self.spike = None;
        self.pivots = 0;

        let rank = elim.steps.len();
        if rank < m {
            for &k in &elim.singular_columns {
                flags.mark(basic[k], BasisMark::Singular);
            }
            self.unpivoted_rows = elim.unpivoted_rows;
            self.status = FactorStatus::Singular;
            let _ = self.print_failure("singular");
            return Err(FactorError::Singular {
                rank,
                deficiency: m - rank,
            });
        }

        self.variable_at.iter_mut().for_each(|v| *v = None);
        for step in &elim.steps {
            flags.mark(basic[step.col], BasisMark::Pivot(step.row));
            self.variable_at[step.row] = Some(basic[step.col]);
        }
        self.unpivoted_rows.clear();
        self.status = FactorStatus::Ready;
        let _ = self.print_summary();
        Ok(())
    }

    fn resize(&mut self, m: usize) {
        let maximum_pivots = self.settings.maximum_pivots;
        self.m = m;
        self.factors = LuFactors::new(m, maximum_pivots);
        self.work = SolveWorkspace::new(m, maximum_pivots);
        self.variable_at = vec![None; m];
        self.stats = SolveStatistics::default();
    }

    fn basis_matrix(&self, matrix: &CscMatrix<T>, basic: &[BasisColumn]) -> CscMatrix<T> {
        let mut basis = CscMatrix::empty(matrix.m);
        for col in basic {
            match *col {
                BasisColumn::Structural(j) => {
                    let (rows, vals) = matrix.column(j);
                    basis.push_column(rows, vals);
                }
                BasisColumn::Slack(i) => {
                    basis.push_column(&[i], &[self.settings.slack_value]);
                }
            }
        }
        basis
    }

    /// Pick the solve kernel for a phase given its running fill ratio.
    pub(crate) fn choose_strategy(&self, average: f64, nnz: usize) -> SolveStrategy {
        if let Some(strategy) = self.settings.solve_strategy {
            return strategy;
        }
        let density = average * nnz as f64 / self.m.max(1) as f64;
        if density < self.settings.sparse_threshold {
            SolveStrategy::Sparse
        } else if density < self.settings.semi_sparse_threshold {
            SolveStrategy::SemiSparse
        } else {
            SolveStrategy::Dense
        }
    }

    pub(crate) fn check_ready(&self, region: &IndexedVector<T>) -> Result<(), FactorError> {
        if self.status != FactorStatus::Ready {
            return Err(FactorError::NotFactorized);
        }
        if region.len() != self.m {
            return Err(FactorError::IncompatibleDimension);
        }
        Ok(())
    }

    pub fn status(&self) -> FactorStatus {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == FactorStatus::Ready
    }

    pub fn number_rows(&self) -> usize {
        self.m
    }

    /// updates applied since the last factorization
    pub fn pivots(&self) -> usize {
        self.pivots
    }

    pub fn number_elements_l(&self) -> usize {
        self.factors.l.number_elements()
    }

    /// off-diagonal elements of U plus the diagonal
    pub fn number_elements_u(&self) -> usize {
        self.factors.u_col.number_elements() + self.m
    }

    /// elements held by update etas (R or product form)
    pub fn number_elements_r(&self) -> usize {
        self.factors.r.number_elements() + self.factors.pfi.number_elements() + self.factors.pfi_diag.len()
    }

    /// order of the block finished by the dense kernel, 0 if none
    pub fn dense_size(&self) -> usize {
        self.dense_size
    }

    pub fn statistics(&self) -> &SolveStatistics {
        &self.stats
    }

    /// rows left without a pivot by the last singular factorization
    pub fn unpivoted_rows(&self) -> &[usize] {
        &self.unpivoted_rows
    }

    /// basis column pivoted at `row` by the last factorization
    pub fn variable_at(&self, row: usize) -> Option<BasisColumn> {
        self.variable_at.get(row).copied().flatten()
    }

    /// pivot row of structural column `j` in the last factorization
    pub fn row_of_column(&self, j: usize) -> Option<usize> {
        self.variable_at
            .iter()
            .position(|v| *v == Some(BasisColumn::Structural(j)))
    }

    /// pivot row of the slack of row `i` in the last factorization
    pub fn row_of_slack(&self, i: usize) -> Option<usize> {
        self.variable_at
            .iter()
            .position(|v| *v == Some(BasisColumn::Slack(i)))
    }

    /// Rows in current pivot order.
    pub fn permutation(&self) -> Vec<usize> {
        let f = &self.factors;
        f.position_of_rank[..f.next_rank]
            .iter()
            .copied()
            .filter(|&p| p != NONE)
            .collect()
    }

    /// Inverse of [`permutation`](Self::permutation): the pivot order index of every row.
    pub fn back_permutation(&self) -> Vec<usize> {
        let mut back = vec![NONE; self.m];
        for (k, p) in self.permutation().into_iter().enumerate() {
            back[p] = k;
        }
        back
    }

    /// Verify that the row and column copies of U hold the same entries
    /// and that U is triangular in pivot order.
    pub fn check_consistency(&self) -> bool {
        let f = &self.factors;
        if f.u_col.number_elements() != f.u_row.number_elements() {
            return false;
        }
        for q in 0..self.m {
            for (r, v) in f.u_col.entries(q) {
                if f.rank[r] >= f.rank[q] {
                    return false;
                }
                match f.u_row.find(r, q) {
                    Some(p) if f.u_row.value_at(r, p) == v => {}
                    _ => return false,
                }
            }
        }
        true
    }

    fn print_summary(&mut self) -> std::io::Result<()> {
        if !self.settings.verbose {
            return Ok(());
        }
        let (m, nl, nu, dense) = (
            self.m,
            self.number_elements_l(),
            self.number_elements_u(),
            self.dense_size,
        );
        let out = &mut self.stream;
        writeln!(
            out,
            "factorize: rows = {m}, nnz(L) = {nl}, nnz(U) = {nu}, dense = {dense}, status = {:?}",
            self.status
        )?;
        Ok(())
    }

    fn print_failure(&mut self, what: &str) -> std::io::Result<()> {
        if !self.settings.verbose {
            return Ok(());
        }
        let out = &mut self.stream;
        writeln!(out, "factorize: rows = {}, {what}", self.m)?;
        Ok(())
    }

    pub(crate) fn print_rejection(&mut self, pivot_row: usize, reason: &str) -> std::io::Result<()> {
        if !self.settings.verbose {
            return Ok(());
        }
        let pivots = self.pivots;
        let out = &mut self.stream;
        writeln!(out, "replace column: row {pivot_row} rejected ({reason}) after {pivots} updates")?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::factor::FactorSettingsBuilder;

    fn factor_of(rows: &[[f64; 3]; 3]) -> (Factorization<f64>, BasisFlags) {
        let A = CscMatrix::from(rows);
        let mut flags = BasisFlags::new(3, 3);
        (0..3).for_each(|j| flags.set_column_basic(j, true));
        let mut factor = Factorization::new(FactorSettings::default());
        factor.factorize(&A, &mut flags).unwrap();
        (factor, flags)
    }

    #[test]
    fn test_factorize_marks_pivots() {
        let (factor, flags) = factor_of(&[[1., 0., 0.], [2., 1., 0.], [0., 0., 1.]]);
        assert!(factor.is_ready());
        assert_eq!(flags.columns[1], BasisMark::Pivot(1));
        assert_eq!(factor.row_of_column(0), Some(0));
        assert_eq!(factor.variable_at(2), Some(BasisColumn::Structural(2)));
        assert_eq!(factor.number_elements_u(), 4);
        assert_eq!(factor.number_elements_l(), 0);
        assert!(factor.check_consistency());

        let perm = factor.permutation();
        let back = factor.back_permutation();
        for (k, &p) in perm.iter().enumerate() {
            assert_eq!(back[p], k);
        }
    }

    #[test]
    fn test_factorize_too_many_columns() {
        let A = CscMatrix::from(&[[1., 0.], [0., 1.]]);
        let mut flags = BasisFlags::slack_basis(2, 2);
        flags.set_column_basic(0, true);
        let mut factor = Factorization::<f64>::new(FactorSettings::default());
        assert_eq!(
            factor.factorize(&A, &mut flags),
            Err(FactorError::TooManyColumns)
        );
        assert!(!factor.is_ready());
    }

    #[test]
    fn test_factorize_singular_then_repair() {
        let A = CscMatrix::from(&[[1., 2., 0.], [1., 2., 0.], [0., 0., 1.]]);
        let mut flags = BasisFlags::new(3, 3);
        (0..3).for_each(|j| flags.set_column_basic(j, true));
        let mut factor = Factorization::new(FactorSettings::default());

        let err = factor.factorize(&A, &mut flags).unwrap_err();
        assert_eq!(
            err,
            FactorError::Singular {
                rank: 2,
                deficiency: 1
            }
        );
        assert_eq!(factor.status(), FactorStatus::Singular);
        let nsingular = flags
            .columns
            .iter()
            .filter(|m| **m == BasisMark::Singular)
            .count();
        assert_eq!(nsingular, 1);

        let rows = factor.unpivoted_rows().to_vec();
        flags.make_non_singular(&rows);
        factor.factorize(&A, &mut flags).unwrap();
        assert!(factor.is_ready());
    }

    #[test]
    fn test_small_area() {
        let settings = FactorSettingsBuilder::<f64>::default()
            .area_factor(1.0)
            .build()
            .unwrap();
        let A = CscMatrix::from(&[[4., 1., 1.], [1., 4., 1.], [1., 1., 4.]]);
        let mut flags = BasisFlags::new(3, 3);
        (0..3).for_each(|j| flags.set_column_basic(j, true));
        let mut factor = Factorization::new(settings);
        factor.factorize(&A, &mut flags).unwrap();
        assert!(factor.check_consistency());
    }

    #[test]
    fn test_out_of_memory_then_retry() {
        // an area smaller than the basis itself
        let settings = FactorSettings {
            area_factor: 0.5,
            maximum_area_retries: 0,
            ..FactorSettings::default()
        };
        let A = CscMatrix::from(&[[4., 1., 1.], [1., 4., 1.], [1., 1., 4.]]);
        let mut flags = BasisFlags::new(3, 3);
        (0..3).for_each(|j| flags.set_column_basic(j, true));

        let mut factor = Factorization::new(settings.clone());
        let err = factor.factorize(&A, &mut flags).unwrap_err();
        assert_eq!(err, FactorError::OutOfMemory);
        assert_eq!(err.status_code(), -99);
        assert_eq!(factor.status(), FactorStatus::Unfactorized);

        // one doubling is enough, and the larger area is kept
        let mut factor = Factorization::new(FactorSettings {
            maximum_area_retries: 1,
            ..settings
        });
        factor.factorize(&A, &mut flags).unwrap();
        assert!(factor.is_ready());
        assert_eq!(factor.area_factor, 1.0);
    }

    #[test]
    fn test_choose_strategy_thresholds() {
        // m = 3, so density = average * nnz / 3
        let (factor, _) = factor_of(&[[1., 0., 0.], [0., 1., 0.], [0., 0., 1.]]);
        assert_eq!(factor.choose_strategy(0.1, 1), SolveStrategy::Sparse);
        assert_eq!(factor.choose_strategy(0.5, 1), SolveStrategy::SemiSparse);
        assert_eq!(factor.choose_strategy(0.3, 1), SolveStrategy::SemiSparse);
        assert_eq!(factor.choose_strategy(0.3, 3), SolveStrategy::Dense);
        assert_eq!(factor.choose_strategy(1.0, 3), SolveStrategy::Dense);

        let settings = FactorSettingsBuilder::<f64>::default()
            .solve_strategy(SolveStrategy::Dense)
            .build()
            .unwrap();
        let mut factor = Factorization::new(settings);
        let A = CscMatrix::<f64>::identity(3);
        let mut flags = BasisFlags::new(3, 3);
        (0..3).for_each(|j| flags.set_column_basic(j, true));
        factor.factorize(&A, &mut flags).unwrap();
        assert_eq!(factor.choose_strategy(0.0, 0), SolveStrategy::Dense);
    }
}
