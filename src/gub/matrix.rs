use super::*;
use crate::algebra::*;
use crate::io::*;
use itertools::izip;
use std::io::Write;

/// Snapshot taken by [`SyncMode::Rebuild`] and restored by
/// [`SyncMode::Restore`].
#[derive(Debug, Clone)]
pub(crate) struct SavedSets {
    pub keys: Vec<Key>,
    pub status: Vec<SetStatus>,
    pub feasibility: Vec<SetFeasibility>,
    pub pivot_variable: Vec<Sequence>,
}

/// A constraint matrix whose columns are partitioned into GUB sets.
///
/// Every set `s` carries an implicit row `lower_s <= sum(x_j) <= upper_s`
/// over its members.  The implicit rows never enter the factorization:
/// each set keeps one basic *key*, either a member column or the set
/// slack, and every other member column is presented to the basis as
/// `a_j - a_key`.  The explicit basis therefore has one column per
/// constraint row, and the set rows are satisfied through the keys.
///
/// The driver owns the [`SimplexModel`]; the layer reads its statuses,
/// values and duals and rewrites `pivot_variable` when keys change.
pub struct GubMatrix<T: FloatT = f64> {
    pub settings: GubSettings<T>,
    pub(crate) matrix: CscMatrix<T>,
    pub(crate) sets: Vec<GubSet<T>>,
    pub(crate) set_of: Vec<Option<usize>>,
    pub(crate) chains: MemberChains,
    // non-set columns at or beyond this index are never priced
    pub(crate) priced_columns: usize,
    pub(crate) first_gub: usize,
    pub(crate) rhs: Vec<T>,
    pub(crate) last_refresh: Option<usize>,
    pub(crate) possible_pivot_key: Option<usize>,
    pub(crate) gub_slack_in: Option<usize>,
    // a key changed under basic members since the last refactor check
    pub(crate) refactorization_due: bool,
    pub(crate) saved: Option<SavedSets>,
    pub(crate) stream: PrintTarget,
}

impl<T: FloatT> ConfigurablePrintTarget for GubMatrix<T> {
    fn print_target_mut(&mut self) -> &mut PrintTarget {
        &mut self.stream
    }
}

impl<T> GubMatrix<T>
where
    T: FloatT,
{
    /// Partition the columns of `matrix` into sets.  Set `s` owns the
    /// columns `starts[s]..ends[s]`; ranges must be ordered and disjoint.
    pub fn new(
        matrix: CscMatrix<T>,
        starts: &[usize],
        ends: &[usize],
        lower: &[T],
        upper: &[T],
        settings: GubSettings<T>,
    ) -> Result<Self, GubError> {
        let nsets = starts.len();
        if ends.len() != nsets || lower.len() != nsets || upper.len() != nsets {
            return Err(GubError::OverlappingSets);
        }
        let n = matrix.n;
        let mut previous_end = 0;
        for (&start, &end) in starts.iter().zip(ends) {
            if start > end || end > n || start < previous_end {
                return Err(GubError::OverlappingSets);
            }
            previous_end = end;
        }
        if lower.iter().zip(upper).any(|(&l, &u)| l > u) {
            return Err(GubError::BadSetBounds);
        }

        let mut set_of = vec![None; n];
        let mut chains = MemberChains::new(n, nsets);
        for (s, (&start, &end)) in starts.iter().zip(ends).enumerate() {
            for j in start..end {
                set_of[j] = Some(s);
                chains.link(s, j);
            }
        }
        let sets = lower
            .iter()
            .zip(upper)
            .map(|(&l, &u)| GubSet::new(l, u))
            .collect();
        let first_gub = starts.iter().zip(ends).find(|(s, e)| s < e).map_or(n, |(&s, _)| s);

        Ok(Self {
            settings,
            rhs: vec![T::zero(); matrix.m],
            matrix,
            sets,
            set_of,
            chains,
            priced_columns: n,
            first_gub,
            last_refresh: None,
            possible_pivot_key: None,
            gub_slack_in: None,
            refactorization_due: false,
            saved: None,
            stream: PrintTarget::default(),
        })
    }

    pub fn number_rows(&self) -> usize {
        self.matrix.m
    }

    pub fn number_columns(&self) -> usize {
        self.matrix.n
    }

    pub fn number_sets(&self) -> usize {
        self.sets.len()
    }

    pub fn matrix(&self) -> &CscMatrix<T> {
        &self.matrix
    }

    pub fn set(&self, s: usize) -> &GubSet<T> {
        &self.sets[s]
    }

    pub fn key(&self, s: usize) -> Key {
        self.sets[s].key
    }

    pub fn set_status(&self, s: usize) -> SetStatus {
        self.sets[s].status
    }

    /// set owning working column `j`, if any
    pub fn set_of(&self, j: usize) -> Option<usize> {
        self.set_of.get(j).copied().flatten()
    }

    /// The effective rhs as last computed, without refreshing.
    pub fn rhs(&self) -> &[T] {
        &self.rhs
    }

    /// Members of `s`: the key first if it is a column, then the chain.
    pub fn members(&self, s: usize) -> impl Iterator<Item = usize> + '_ {
        self.sets[s].key.member().into_iter().chain(self.chains.members(s))
    }

    /// Value the key member takes, given the nonkey members of its set.
    pub fn key_value(&self, model: &SimplexModel<T>, s: usize) -> Option<T> {
        self.sets[s].key.member()?;
        let others = self
            .chains
            .members(s)
            .fold(T::zero(), |acc, j| acc + model.solution[j]);
        Some(self.sets[s].bound_value() - others)
    }

    /// Sum of the member values of `s`.
    pub fn set_sum(&self, model: &SimplexModel<T>, s: usize) -> T {
        self.members(s).fold(T::zero(), |acc, j| acc + model.solution[j])
    }

    pub(crate) fn set_of_sequence(&self, seq: Sequence) -> Option<usize> {
        match seq {
            Sequence::Structural(j) => self.set_of(j),
            Sequence::SetSlack(s) => Some(s),
            Sequence::RowSlack(_) => None,
        }
    }

    pub(crate) fn is_key(&self, j: usize) -> bool {
        self.set_of(j)
            .map_or(false, |s| self.sets[s].key == Key::Member(j))
    }

    // key column to subtract from a member, if any
    fn key_of_member(&self, j: usize) -> Option<usize> {
        let s = self.set_of(j)?;
        match self.sets[s].key {
            Key::Member(k) if k != j => Some(k),
            _ => None,
        }
    }

    fn check_sequence(&self, seq: Sequence) -> Result<(), GubError> {
        let ok = match seq {
            Sequence::Structural(j) => j < self.matrix.n,
            Sequence::RowSlack(i) => i < self.matrix.m,
            Sequence::SetSlack(s) => s < self.sets.len(),
        };
        if ok {
            Ok(())
        } else {
            Err(GubError::UnknownSequence)
        }
    }

    /// Scatter the basis column of `seq` into `column`, which is cleared
    /// first.  Members of a set with a column key have the key column
    /// subtracted; a set slack is represented by its key column.
    pub fn unpack(&self, seq: Sequence, column: &mut IndexedVector<T>) -> Result<(), GubError> {
        column.clear();
        self.add(column, seq, T::one())
    }

    /// The basis column of `seq` in packed form, rows ascending.
    pub fn unpack_packed(&self, seq: Sequence) -> Result<SparseVector<T>, GubError> {
        self.check_sequence(seq)?;
        let m = self.matrix.m;
        let mut packed = SparseVector::zeros(m);
        match seq {
            Sequence::RowSlack(i) => packed.push(i, T::one()),
            Sequence::SetSlack(s) => {
                let k = self.sets[s].key.member().ok_or(GubError::UnknownSequence)?;
                let (rows, vals) = self.matrix.column(k);
                rows.iter().zip(vals).for_each(|(&r, &v)| packed.push(r, v));
            }
            Sequence::Structural(j) => {
                let (rows, vals) = self.matrix.column(j);
                match self.key_of_member(j) {
                    None => rows.iter().zip(vals).for_each(|(&r, &v)| packed.push(r, v)),
                    Some(k) => {
                        let (krows, kvals) = self.matrix.column(k);
                        merge_difference(rows, vals, krows, kvals, &mut packed);
                    }
                }
            }
        }
        Ok(packed)
    }

    /// `column += multiplier * (basis column of seq)`
    pub fn add(&self, column: &mut IndexedVector<T>, seq: Sequence, multiplier: T) -> Result<(), GubError> {
        self.check_sequence(seq)?;
        match seq {
            Sequence::RowSlack(i) => column.add(i, multiplier),
            Sequence::SetSlack(s) => {
                let k = self.sets[s].key.member().ok_or(GubError::UnknownSequence)?;
                self.scatter(column, k, multiplier);
            }
            Sequence::Structural(j) => {
                self.scatter(column, j, multiplier);
                if let Some(k) = self.key_of_member(j) {
                    self.scatter(column, k, -multiplier);
                }
            }
        }
        Ok(())
    }

    fn scatter(&self, column: &mut IndexedVector<T>, j: usize, multiplier: T) {
        let (rows, vals) = self.matrix.column(j);
        for (&r, &v) in rows.iter().zip(vals) {
            column.add(r, multiplier * v);
        }
    }

    /// `y += A x` with the untransformed columns.
    pub fn times(&self, x: &[T], y: &mut [T]) -> Result<(), GubError> {
        if x.len() != self.matrix.n || y.len() != self.matrix.m {
            return Err(GubError::IncompatibleDimension);
        }
        let colptr = &self.matrix.colptr;
        for (&xj, start, end) in izip!(x, colptr, &colptr[1..]) {
            if xj == T::zero() {
                continue;
            }
            for (&r, &v) in izip!(&self.matrix.rowval[*start..*end], &self.matrix.nzval[*start..*end]) {
                y[r] += v * xj;
            }
        }
        Ok(())
    }

    /// The explicit basis for the current `pivot_variable`, one column
    /// per row, ready for [`Factorization::factorize`](crate::factor::Factorization::factorize)
    /// with every column marked basic.
    pub fn fill_basis(&self, model: &SimplexModel<T>) -> Result<(CscMatrix<T>, Vec<Sequence>), GubError> {
        let m = self.matrix.m;
        if model.pivot_variable.len() != m {
            return Err(GubError::UnknownSequence);
        }
        let mut basis = CscMatrix::empty(m);
        for &seq in &model.pivot_variable {
            let column = self.unpack_packed(seq)?;
            basis.push_column(&column.nzind, &column.nzval);
        }
        Ok((basis, model.pivot_variable.clone()))
    }

    /// Basic variables that need an explicit row: basic row slacks and
    /// basic structurals that are not keys.  Variables already placed
    /// keep their row.
    pub fn fill_pivot_variables(&self, model: &SimplexModel<T>) -> Vec<Sequence> {
        let wanted = |seq: Sequence| match seq {
            Sequence::Structural(j) => {
                j < model.number_columns && model.column_status[j].is_basic() && !self.is_key(j)
            }
            Sequence::RowSlack(i) => i < model.number_rows && model.row_status[i].is_basic(),
            Sequence::SetSlack(_) => false,
        };

        let mut placed = std::collections::HashSet::new();
        let mut pivots: Vec<Option<Sequence>> = model
            .pivot_variable
            .iter()
            .map(|&seq| (wanted(seq) && placed.insert(seq)).then_some(seq))
            .collect();

        let mut spare = (0..model.number_rows)
            .map(Sequence::RowSlack)
            .chain((0..model.number_columns).map(Sequence::Structural))
            .filter(|&seq| wanted(seq) && !placed.contains(&seq));

        for slot in pivots.iter_mut().filter(|slot| slot.is_none()) {
            *slot = spare.next();
        }
        let mut pivots: Vec<Sequence> = pivots.into_iter().flatten().collect();
        pivots.extend(spare);
        pivots
    }

    /// Primal infeasibility of the set rows: the sum of the bound
    /// violations of the member sums and the number of violated sets.
    /// Slack-key sets have their feasibility refreshed.
    pub fn check_feasible(&mut self, model: &SimplexModel<T>) -> (T, usize) {
        let tolerance = model.primal_tolerance;
        let mut sum = T::zero();
        let mut count = 0;
        for s in 0..self.sets.len() {
            let total = self.set_sum(model, s);
            let set = &mut self.sets[s];
            let feasibility = SetFeasibility::classify(total, set.lower, set.upper, tolerance);
            match feasibility {
                SetFeasibility::Above => sum += total - set.upper,
                SetFeasibility::Below => sum += set.lower - total,
                SetFeasibility::Feasible => {}
            }
            if feasibility != SetFeasibility::Feasible {
                count += 1;
            }
            if set.key == Key::Slack {
                set.feasibility = feasibility;
            }
        }
        (sum, count)
    }

    /// Rebuild the chain of `s` from the member table.
    pub(crate) fn relink_set(&mut self, model: &SimplexModel<T>, s: usize) {
        let key = self.sets[s].key;
        for j in 0..self.set_of.len() {
            if self.set_of[j] == Some(s) && key != Key::Member(j) {
                self.chains.link(s, j);
            }
        }
        self.chains.redo(s, key, key, |j| model.column_status[j].is_basic());
    }

    pub(crate) fn print_key_change(&mut self, s: usize, old: Key, new: Key) -> std::io::Result<()> {
        if !self.settings.verbose || old == new {
            return Ok(());
        }
        let out = &mut self.stream;
        writeln!(out, "set {s}: key {old:?} -> {new:?}")?;
        Ok(())
    }
}

// packed a - b for two row-sorted columns
fn merge_difference<T: FloatT>(
    arows: &[usize],
    avals: &[T],
    brows: &[usize],
    bvals: &[T],
    out: &mut SparseVector<T>,
) {
    let (mut p, mut q) = (0, 0);
    while p < arows.len() || q < brows.len() {
        let ra = arows.get(p).copied().unwrap_or(usize::MAX);
        let rb = brows.get(q).copied().unwrap_or(usize::MAX);
        if ra < rb {
            out.push(ra, avals[p]);
            p += 1;
        } else if rb < ra {
            out.push(rb, -bvals[q]);
            q += 1;
        } else {
            let v = avals[p] - bvals[q];
            if v != T::zero() {
                out.push(ra, v);
            }
            p += 1;
            q += 1;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // two rows, columns 0 free, 1..3 in set 0, 3..5 in set 1
    pub(crate) fn sample() -> GubMatrix<f64> {
        let A = CscMatrix::from(&[[1., 2., 0., 1., 3.], [0., 1., 4., 0., 1.]]);
        GubMatrix::new(A, &[1, 3], &[3, 5], &[0., 1.], &[2., 1.], GubSettings::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_overlap() {
        let A = CscMatrix::<f64>::identity(3);
        let settings = GubSettings::default();
        assert_eq!(
            GubMatrix::new(A.clone(), &[0, 1], &[2, 3], &[0., 0.], &[1., 1.], settings.clone()).err(),
            Some(GubError::OverlappingSets)
        );
        assert_eq!(
            GubMatrix::new(A, &[0], &[2], &[2.], &[1.], settings).err(),
            Some(GubError::BadSetBounds)
        );
    }

    #[test]
    fn test_unpack_subtracts_key() {
        let mut gub = sample();
        gub.sets[0].key = Key::Member(1);
        gub.chains.unlink(1);
        gub.sets[0].status = SetStatus::AtLowerBound;

        let mut column = IndexedVector::new(2);
        gub.unpack(Sequence::Structural(2), &mut column).unwrap();
        assert_eq!(column.dense(), &[-2., 3.]);

        let packed = gub.unpack_packed(Sequence::Structural(2)).unwrap();
        assert_eq!(packed.nzind, vec![0, 1]);
        assert_eq!(packed.nzval, vec![-2., 3.]);

        let packed = gub.unpack_packed(Sequence::SetSlack(0)).unwrap();
        assert_eq!(packed.nzval, vec![2., 1.]);

        // key itself and columns of slack-key sets are untouched
        let packed = gub.unpack_packed(Sequence::Structural(4)).unwrap();
        assert_eq!(packed.nzval, vec![3., 1.]);
        assert_eq!(
            gub.unpack_packed(Sequence::SetSlack(1)).err(),
            Some(GubError::UnknownSequence)
        );
        assert_eq!(gub.members(0).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_times_and_feasibility() {
        let mut gub = sample();
        let mut y = vec![0.; 2];
        gub.times(&[1., 1., 0., 0., 1.], &mut y).unwrap();
        assert_eq!(y, vec![6., 2.]);
        assert_eq!(
            gub.times(&[1., 1.], &mut y),
            Err(GubError::IncompatibleDimension)
        );
        assert_eq!(y, vec![6., 2.]);

        let mut model = SimplexModel::new(2, 5);
        model.solution = vec![0., 2., 1., 0., 0.];
        let (sum, count) = gub.check_feasible(&model);
        assert_eq!(count, 2);
        assert!((sum - 2.).abs() < 1e-12);
        assert_eq!(gub.set(0).feasibility, SetFeasibility::Above);
        assert_eq!(gub.set(1).feasibility, SetFeasibility::Below);
    }

    #[test]
    fn test_fill_pivot_variables_keeps_rows() {
        let mut gub = sample();
        let mut model = SimplexModel::new(2, 5);
        model.row_status[0] = Status::AtLowerBound;
        model.column_status[2] = Status::Basic;
        model.column_status[1] = Status::Basic;
        gub.sets[0].key = Key::Member(1);
        gub.chains.unlink(1);

        let pivots = gub.fill_pivot_variables(&model);
        assert_eq!(pivots, vec![Sequence::Structural(2), Sequence::RowSlack(1)]);

        model.pivot_variable = pivots;
        let (basis, order) = gub.fill_basis(&model).unwrap();
        assert_eq!(order[0], Sequence::Structural(2));
        assert_eq!(basis.column(0).1, &[-2., 3.]);
        assert_eq!(basis.column(1).1, &[1.]);
    }
}
