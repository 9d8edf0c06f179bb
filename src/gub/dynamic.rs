use super::pricing::{fraction_range, PricingPass};
use super::*;
use crate::algebra::*;
use crate::io::*;
use std::io::Write;

/// A GUB matrix whose set members are generated on demand.
///
/// The working matrix holds the static columns `0..first_dynamic`
/// followed by a window of slots `first_dynamic..last_dynamic`.  Pool
/// columns are priced from their metadata alone; the winner of a pricing
/// pass is written into the slot at `first_available` and is committed,
/// moving `first_available` on, once it enters the basis.  Slots whose
/// column is neither basic nor a key are returned to the pool at the next
/// compaction ([`SyncMode::Rebuild`], or when pricing finds the window
/// full).
///
/// A pool column outside the window rests at one of its bounds.  Its
/// value is taken out of the set bounds, the rhs and the objective, so the
/// base layer only ever sees working columns.
pub struct DynamicGubMatrix<T: FloatT = f64> {
    pub(crate) base: GubMatrix<T>,
    pub(crate) pool: GubColumnPool<T>,
    pub(crate) status: Vec<DynamicStatus>,
    pub(crate) flagged: Vec<bool>,
    // pool column held by each window slot, and the bound it rested at
    pub(crate) id: Vec<Option<usize>>,
    pub(crate) resting: Vec<DynamicStatus>,
    pub(crate) first_dynamic: usize,
    pub(crate) last_dynamic: usize,
    pub(crate) first_available: usize,
    pub(crate) saved_first_available: usize,
    // set bounds as given, before pool columns at bounds are taken out
    pub(crate) lower_set: Vec<T>,
    pub(crate) upper_set: Vec<T>,
    pub(crate) pool_rhs: Vec<T>,
    pub(crate) rhs: Vec<T>,
    pub(crate) objective_offset: T,
    pub(crate) compactions: usize,
}

impl<T: FloatT> ConfigurablePrintTarget for DynamicGubMatrix<T> {
    fn print_target_mut(&mut self) -> &mut PrintTarget {
        &mut self.base.stream
    }
}

impl<T> DynamicGubMatrix<T>
where
    T: FloatT,
{
    /// `matrix` holds the static columns, partitioned into sets by
    /// `starts`/`ends` as for [`GubMatrix::new`].  The pool must have the
    /// same number of sets.  The window is sized by
    /// [`GubSettings::window_size`].
    pub fn new(
        matrix: CscMatrix<T>,
        starts: &[usize],
        ends: &[usize],
        lower: &[T],
        upper: &[T],
        pool: GubColumnPool<T>,
        settings: GubSettings<T>,
    ) -> Result<Self, GubError> {
        let nsets = starts.len();
        if pool.number_sets() != nsets || pool.columns.m != matrix.m {
            return Err(GubError::OverlappingSets);
        }
        let m = matrix.m;
        let first_dynamic = matrix.n;
        let window = settings.window_size_for(nsets, m);
        let last_dynamic = first_dynamic + window;

        let mut working = matrix;
        for _ in 0..window {
            working.push_column(&[], &[]);
        }
        let mut base = GubMatrix::new(working, starts, ends, lower, upper, settings)?;
        base.priced_columns = first_dynamic;
        base.first_gub = base.first_gub.min(first_dynamic);

        let npool = pool.number_columns();
        let mut dynamic = Self {
            base,
            pool,
            status: vec![DynamicStatus::AtLowerBound; npool],
            flagged: vec![false; npool],
            id: vec![None; window],
            resting: vec![DynamicStatus::AtLowerBound; window],
            first_dynamic,
            last_dynamic,
            first_available: first_dynamic,
            saved_first_available: first_dynamic,
            lower_set: lower.to_vec(),
            upper_set: upper.to_vec(),
            pool_rhs: vec![T::zero(); m],
            rhs: vec![T::zero(); m],
            objective_offset: T::zero(),
            compactions: 0,
        };
        dynamic.clean_sets();
        Ok(dynamic)
    }

    pub fn base(&self) -> &GubMatrix<T> {
        &self.base
    }

    pub fn pool(&self) -> &GubColumnPool<T> {
        &self.pool
    }

    pub fn settings(&self) -> &GubSettings<T> {
        &self.base.settings
    }

    /// working columns, static and window, for sizing the driver's model
    pub fn number_columns(&self) -> usize {
        self.base.matrix.n
    }

    pub fn first_dynamic(&self) -> usize {
        self.first_dynamic
    }

    pub fn last_dynamic(&self) -> usize {
        self.last_dynamic
    }

    pub fn first_available(&self) -> usize {
        self.first_available
    }

    /// pool column held by working column `slot`, if any
    pub fn id(&self, slot: usize) -> Option<usize> {
        slot.checked_sub(self.first_dynamic)
            .and_then(|k| self.id.get(k).copied().flatten())
    }

    /// number of committed slots
    pub fn live_slots(&self) -> usize {
        self.first_available - self.first_dynamic
    }

    pub fn compactions(&self) -> usize {
        self.compactions
    }

    pub fn dynamic_status(&self, p: usize) -> DynamicStatus {
        self.status[p]
    }

    /// objective contribution of the pool columns resting at bounds
    pub fn objective_offset(&self) -> T {
        self.objective_offset
    }

    fn slot_index(&self, slot: usize) -> usize {
        slot - self.first_dynamic
    }

    /// Recompute the effective set bounds, the pool rhs and the objective
    /// offset from the pool columns outside the window.
    pub(crate) fn clean_sets(&mut self) {
        self.pool_rhs.iter_mut().for_each(|v| *v = T::zero());
        self.objective_offset = T::zero();
        for s in 0..self.pool.number_sets() {
            let mut shift = T::zero();
            for p in self.pool.members(s) {
                let value = self.pool.value_at(p, self.status[p]);
                if value != T::zero() {
                    shift += value;
                    self.pool.columns.col_axpy(p, -value, &mut self.pool_rhs);
                    self.objective_offset += self.pool.cost[p] * value;
                }
            }
            let set = &mut self.base.sets[s];
            set.lower = self.lower_set[s] - shift;
            set.upper = self.upper_set[s] - shift;
        }
    }

    // write pool column `p` into `slot` as a nonbasic working member
    fn materialize(&mut self, model: &mut SimplexModel<T>, slot: usize, p: usize) {
        let s = self.pool.set_of(p);
        let resting = self.status[p];
        let value = self.pool.value_at(p, resting);

        let (rows, vals) = self.pool.columns.column(p);
        self.base.matrix.set_column(slot, rows, vals);
        model.cost[slot] = self.pool.cost[p];
        model.lower[slot] = self.pool.lower_of(p);
        model.upper[slot] = self.pool.upper_of(p);
        model.solution[slot] = value;
        model.reduced_cost[slot] = T::zero();
        model.flagged[slot] = false;
        model.column_status[slot] = match resting {
            DynamicStatus::AtUpperBound => Status::AtUpperBound,
            _ => Status::AtLowerBound,
        };

        // the value moves from the pool terms to the working terms
        if value != T::zero() {
            let set = &mut self.base.sets[s];
            set.lower += value;
            set.upper += value;
            self.pool.columns.col_axpy(p, value, &mut self.pool_rhs);
            self.base.matrix.col_axpy(slot, -value, &mut self.base.rhs);
            self.objective_offset -= self.pool.cost[p] * value;
        }

        self.status[p] = DynamicStatus::InSmall;
        self.base.set_of[slot] = Some(s);
        self.base.chains.link(s, slot);
        let k = self.slot_index(slot);
        self.id[k] = Some(p);
        self.resting[k] = resting;
    }

    // return the column in `slot` to the pool at its current bound
    fn release(&mut self, model: &mut SimplexModel<T>, slot: usize) {
        let k = self.slot_index(slot);
        let Some(p) = self.id[k].take() else {
            return;
        };
        let s = self.pool.set_of(p);
        let resting = match model.column_status[slot] {
            Status::AtUpperBound => DynamicStatus::AtUpperBound,
            _ => DynamicStatus::AtLowerBound,
        };
        self.status[p] = resting;
        let value = self.pool.value_at(p, resting);
        if value != T::zero() {
            let set = &mut self.base.sets[s];
            set.lower -= value;
            set.upper -= value;
            self.pool.columns.col_axpy(p, -value, &mut self.pool_rhs);
            self.base.matrix.col_axpy(slot, value, &mut self.base.rhs);
            self.objective_offset += self.pool.cost[p] * value;
        }

        self.base.chains.unlink(slot);
        self.base.set_of[slot] = None;
        self.base.matrix.set_column(slot, &[], &[]);
        clear_model_column(model, slot);
    }

    /// Return every nonbasic, nonkey slot to the pool and pack the
    /// remaining slots at the front of the window.  Returns the number of
    /// slots released.
    pub(crate) fn compact(&mut self, model: &mut SimplexModel<T>) -> usize {
        let end = if self.first_available < self.last_dynamic && self.id(self.first_available).is_some() {
            self.first_available + 1
        } else {
            self.first_available
        };

        let mut released = 0;
        for slot in self.first_dynamic..end {
            if !model.column_status[slot].is_basic() && !self.base.is_key(slot) {
                self.release(model, slot);
                released += 1;
            }
        }

        let mut dest = self.first_dynamic;
        for slot in self.first_dynamic..end {
            if self.id(slot).is_none() {
                continue;
            }
            if slot != dest {
                self.move_slot(model, slot, dest);
            }
            dest += 1;
        }
        self.first_available = dest;
        self.saved_first_available = dest;
        self.compactions += 1;

        for s in 0..self.base.sets.len() {
            let key = self.base.sets[s].key;
            self.base
                .chains
                .redo(s, key, key, |j| model.column_status[j].is_basic());
        }
        let _ = self.print_compaction(released);
        released
    }

    fn move_slot(&mut self, model: &mut SimplexModel<T>, from: usize, to: usize) {
        let (rows, vals) = self.base.matrix.column(from);
        let (rows, vals) = (rows.to_vec(), vals.to_vec());
        self.base.matrix.set_column(to, &rows, &vals);
        self.base.matrix.set_column(from, &[], &[]);

        model.column_status[to] = model.column_status[from];
        model.solution[to] = model.solution[from];
        model.lower[to] = model.lower[from];
        model.upper[to] = model.upper[from];
        model.cost[to] = model.cost[from];
        model.reduced_cost[to] = model.reduced_cost[from];
        model.flagged[to] = model.flagged[from];
        clear_model_column(model, from);
        for seq in model.pivot_variable.iter_mut() {
            if *seq == Sequence::Structural(from) {
                *seq = Sequence::Structural(to);
            }
        }

        let s = self.base.set_of[from].take();
        self.base.set_of[to] = s;
        if let Some(s) = s {
            if self.base.sets[s].key == Key::Member(from) {
                self.base.sets[s].key = Key::Member(to);
            } else {
                self.base.chains.unlink(from);
                self.base.chains.link(s, to);
            }
        }
        let (f, t) = (self.slot_index(from), self.slot_index(to));
        self.id[t] = self.id[f].take();
        self.resting[t] = self.resting[f];
    }

    /// Price the pool members of the sets in `start..end` of the set list,
    /// then the working columns.  The pool scan always runs to the end;
    /// the working scan may stop early as in [`GubMatrix::partial_pricing`].
    /// A pool column that beats every working candidate is materialized at
    /// `first_available` and returned as that working column.
    pub fn partial_pricing(
        &mut self,
        model: &mut SimplexModel<T>,
        start: T,
        end: T,
        number_wanted: usize,
    ) -> Result<Option<PricedCandidate<T>>, GubError> {
        let mut pass = PricingPass::new(model, number_wanted);

        let mut pool_best: Option<(usize, T)> = None;
        for s in fraction_range(0, self.pool.number_sets(), start, end) {
            if self.base.sets[s].flagged {
                continue;
            }
            let dj_mod = self.base.key_reduced_cost(model, s);
            for p in self.pool.members(s) {
                if self.flagged[p] {
                    continue;
                }
                let value_sign = match self.status[p] {
                    DynamicStatus::InSmall => continue,
                    DynamicStatus::AtLowerBound => -T::one(),
                    DynamicStatus::AtUpperBound => T::one(),
                };
                let (rows, vals) = self.pool.columns.column(p);
                let dj = model.reduced_cost_of(self.pool.cost[p], rows, vals) - dj_mod;
                let value = value_sign * dj;
                if value > pass.best_value {
                    pass.best_value = value;
                    pool_best = Some((p, dj));
                }
            }
        }

        self.base.price_working(model, start, end, &mut pass);
        if pass.best.is_some() {
            return Ok(pass.best);
        }
        let Some((p, dj)) = pool_best else {
            return Ok(None);
        };
        let slot = self.stage(model, p)?;
        model.reduced_cost[slot] = dj;
        Ok(Some(PricedCandidate {
            sequence: Sequence::Structural(slot),
            reduced_cost: dj,
        }))
    }

    // put pool column `p` in the staging slot, compacting first if needed
    fn stage(&mut self, model: &mut SimplexModel<T>, p: usize) -> Result<usize, GubError> {
        if self.first_available == self.last_dynamic {
            self.compact(model);
            // the snapshot no longer matches the slot layout
            self.base.saved = None;
        }
        if self.first_available == self.last_dynamic {
            return Err(GubError::WindowFull);
        }
        let slot = self.first_available;
        self.release(model, slot);
        self.materialize(model, slot, p);
        Ok(slot)
    }

    /// As [`GubMatrix::update_pivot`], committing the staged slot when it
    /// enters the basis.
    pub fn update_pivot(&mut self, model: &mut SimplexModel<T>, old_in_value: T, old_out_value: T) -> Result<(), GubError> {
        let staged = Some(Sequence::Structural(self.first_available));
        let committing = self.first_available < self.last_dynamic
            && model.sequence_in == staged
            && model.sequence_out != staged
            && self.id(self.first_available).is_some();

        self.base.update_pivot(model, old_in_value, old_out_value)?;
        if committing {
            self.first_available += 1;
        }
        Ok(())
    }

    pub fn use_effective_rhs(&mut self, model: &mut SimplexModel<T>, cheapest: bool) -> Result<(), GubError> {
        self.clean_sets();
        self.base.use_effective_rhs(model, cheapest)
    }

    /// The base effective rhs plus the terms of the pool columns resting at
    /// nonzero bounds.
    pub fn rhs_offset(&mut self, model: &SimplexModel<T>, force_refresh: bool) -> &[T] {
        let base = self.base.rhs_offset(model, force_refresh);
        for (total, (&b, &p)) in self.rhs.iter_mut().zip(base.iter().zip(&self.pool_rhs)) {
            *total = b + p;
        }
        &self.rhs
    }

    pub fn synchronize(&mut self, model: &mut SimplexModel<T>, mode: SyncMode) -> Result<SyncOutcome<T>, GubError> {
        match mode {
            SyncMode::Rebuild => {
                self.compact(model);
                self.base.save_sets(model);
                Ok(SyncOutcome::Done)
            }
            SyncMode::Flag => match model.sequence_in {
                Some(Sequence::Structural(slot)) if self.id(slot).is_some() => {
                    if let Some(p) = self.id(slot) {
                        self.flagged[p] = true;
                    }
                    if slot < self.first_available {
                        model.flagged[slot] = true;
                    } else {
                        // never committed: back to the pool, where the flag keeps it
                        self.release(model, slot);
                    }
                    Ok(SyncOutcome::Done)
                }
                _ => self.base.synchronize(model, SyncMode::Flag),
            },
            SyncMode::Unflag => {
                let mut count = 0;
                for flag in self.flagged.iter_mut().filter(|flag| **flag) {
                    *flag = false;
                    count += 1;
                }
                match self.base.synchronize(model, SyncMode::Unflag)? {
                    SyncOutcome::Unflagged(n) => Ok(SyncOutcome::Unflagged(n + count)),
                    outcome => Ok(outcome),
                }
            }
            SyncMode::ResetCosts => {
                for slot in self.first_dynamic..self.last_dynamic {
                    if let Some(p) = self.id(slot) {
                        model.cost[slot] = self.pool.cost[p];
                        model.lower[slot] = self.pool.lower_of(p);
                        model.upper[slot] = self.pool.upper_of(p);
                    }
                }
                self.clean_sets();
                self.base.synchronize(model, SyncMode::ResetCosts)
            }
            SyncMode::DualInfeasibilities => {
                let mut infeasibilities = self.base.slack_dual_infeasibilities(model);
                let tolerance = model.dual_tolerance;
                for s in 0..self.pool.number_sets() {
                    let dj_mod = self.base.key_reduced_cost(model, s);
                    for p in self.pool.members(s) {
                        let status = match self.status[p] {
                            DynamicStatus::InSmall => continue,
                            DynamicStatus::AtLowerBound => Status::AtLowerBound,
                            DynamicStatus::AtUpperBound => Status::AtUpperBound,
                        };
                        if self.flagged[p] {
                            continue;
                        }
                        let (rows, vals) = self.pool.columns.column(p);
                        let dj = model.reduced_cost_of(self.pool.cost[p], rows, vals) - dj_mod;
                        infeasibilities.record_status(status, dj, tolerance);
                    }
                }
                Ok(SyncOutcome::DualInfeasibilities(infeasibilities))
            }
            SyncMode::RefactorCheck => {
                let limit = self.base.sets.len() + self.base.matrix.m + self.base.settings.refactor_frequency;
                let stale = self.base.take_refactorization_due();
                Ok(SyncOutcome::Refactorize(stale || self.live_slots() > limit))
            }
            SyncMode::ChangingBounds => Ok(SyncOutcome::BoundsMayChange(self.pool.has_bounds())),
            SyncMode::Restore => {
                for slot in self.saved_first_available..self.last_dynamic {
                    let k = self.slot_index(slot);
                    if let Some(p) = self.id[k].take() {
                        // back to the bound it rested at before it was priced in
                        self.status[p] = self.resting[k];
                        self.base.chains.unlink(slot);
                        self.base.set_of[slot] = None;
                        self.base.matrix.set_column(slot, &[], &[]);
                        clear_model_column(model, slot);
                    }
                }
                self.first_available = self.saved_first_available;
                self.clean_sets();
                self.base.synchronize(model, SyncMode::Restore)
            }
            SyncMode::CleanSet | SyncMode::AdjustBounds => {
                self.clean_sets();
                Ok(SyncOutcome::Done)
            }
        }
    }

    fn print_compaction(&mut self, released: usize) -> std::io::Result<()> {
        if !self.base.settings.verbose {
            return Ok(());
        }
        let live = self.live_slots();
        let window = self.last_dynamic - self.first_dynamic;
        let out = &mut self.base.stream;
        writeln!(out, "window compaction: released {released}, {live} of {window} slots live")?;
        Ok(())
    }
}

fn clear_model_column<T: FloatT>(model: &mut SimplexModel<T>, j: usize) {
    model.column_status[j] = Status::AtLowerBound;
    model.solution[j] = T::zero();
    model.lower[j] = T::zero();
    model.upper[j] = T::zero();
    model.cost[j] = T::zero();
    model.reduced_cost[j] = T::zero();
    model.flagged[j] = false;
}

#[cfg(test)]
mod test {
    use super::*;

    // one row, no static columns, a pool of four in one set
    fn window_of(size: usize) -> (DynamicGubMatrix<f64>, SimplexModel<f64>) {
        let columns = CscMatrix::from(&[[1., 2., 1., 3.]]);
        let pool = GubColumnPool::new(columns, vec![-1., -2., -3., -4.], vec![0, 4]).unwrap();
        let settings = GubSettingsBuilder::default().window_size(size).build().unwrap();
        let matrix = CscMatrix::empty(1);
        let dynamic = DynamicGubMatrix::new(matrix, &[0], &[0], &[0.], &[10.], pool, settings).unwrap();
        let model = SimplexModel::new(1, dynamic.number_columns());
        (dynamic, model)
    }

    #[test]
    fn test_staged_column_is_not_committed() {
        let (mut dynamic, mut model) = window_of(3);
        let best = dynamic.partial_pricing(&mut model, 0., 1., 4).unwrap().unwrap();
        assert_eq!(best.sequence, Sequence::Structural(0));
        assert_eq!(best.reduced_cost, -4.);
        assert_eq!(dynamic.id(0), Some(3));
        assert_eq!(dynamic.dynamic_status(3), DynamicStatus::InSmall);
        assert_eq!(dynamic.first_available(), 0);

        // priced again without entering: the same slot is reused, and the
        // staged column is a working member now
        let best = dynamic.partial_pricing(&mut model, 0., 1., 4).unwrap().unwrap();
        assert_eq!(best.sequence, Sequence::Structural(0));
        assert_eq!(dynamic.id(0), Some(3));
        assert_eq!(dynamic.base().members(0).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_commit_and_compact() {
        let (mut dynamic, mut model) = window_of(3);
        let best = dynamic.partial_pricing(&mut model, 0., 1., 4).unwrap().unwrap();
        let Sequence::Structural(slot) = best.sequence else {
            panic!("expected a working column");
        };
        model.sequence_in = Some(best.sequence);
        model.sequence_out = Some(Sequence::RowSlack(0));
        model.pivot_row = Some(PivotRow::Row(0));
        model.column_status[slot] = Status::Basic;
        model.row_status[0] = Status::AtLowerBound;
        dynamic.update_pivot(&mut model, 0., 0.).unwrap();
        assert_eq!(dynamic.first_available(), 1);
        assert_eq!(model.pivot_variable[0], Sequence::Structural(0));

        // stage another column, then compact: the basic slot survives
        dynamic.partial_pricing(&mut model, 0., 1., 4).unwrap();
        assert_eq!(dynamic.id(1), Some(2));
        dynamic.synchronize(&mut model, SyncMode::Rebuild).unwrap();
        assert_eq!(dynamic.first_available(), 1);
        assert_eq!(dynamic.id(0), Some(3));
        assert_eq!(dynamic.id(1), None);
        assert_eq!(dynamic.dynamic_status(2), DynamicStatus::AtLowerBound);
        assert_eq!(dynamic.compactions(), 1);
    }

    #[test]
    fn test_working_scan_stops_early() {
        // two sets with one static member each; the pool columns never price
        let columns = CscMatrix::from(&[[1., 1.]]);
        let pool = GubColumnPool::new(columns, vec![1., 1.], vec![0, 1, 2]).unwrap();
        let settings = GubSettingsBuilder::default().window_size(2).build().unwrap();
        let matrix = CscMatrix::from(&[[1., 1.]]);
        let mut dynamic =
            DynamicGubMatrix::new(matrix, &[0, 1], &[1, 2], &[0., 0.], &[1., 1.], pool, settings).unwrap();
        let mut model = SimplexModel::new(1, dynamic.number_columns());
        model.cost[0] = -1.;
        model.cost[1] = -5.;

        // one candidate is enough: set 1 is never reached
        let best = dynamic.partial_pricing(&mut model, 0., 1., 1).unwrap().unwrap();
        assert_eq!(best.sequence, Sequence::Structural(0));
        assert_eq!(model.reduced_cost[1], 0.);

        let best = dynamic.partial_pricing(&mut model, 0., 1., 2).unwrap().unwrap();
        assert_eq!(best.sequence, Sequence::Structural(1));
        assert_eq!(best.reduced_cost, -5.);
        assert_eq!(dynamic.id(2), None);
    }

    #[test]
    fn test_restore_returns_column_to_upper_bound() {
        let columns = CscMatrix::from(&[[1., 2.]]);
        let pool = GubColumnPool::new(columns, vec![3., -1.], vec![0, 2])
            .unwrap()
            .with_bounds(None, Some(vec![2., 5.]))
            .unwrap();
        let settings = GubSettingsBuilder::default().window_size(2).build().unwrap();
        let matrix = CscMatrix::empty(1);
        let mut dynamic = DynamicGubMatrix::new(matrix, &[0], &[0], &[0.], &[10.], pool, settings).unwrap();
        let mut model = SimplexModel::new(1, dynamic.number_columns());

        // column 0 rests at its upper bound 2
        dynamic.status[0] = DynamicStatus::AtUpperBound;
        dynamic.clean_sets();
        assert_eq!(dynamic.base().set(0).lower, -2.);
        assert_eq!(dynamic.objective_offset(), 6.);
        dynamic.synchronize(&mut model, SyncMode::Rebuild).unwrap();

        // lowering it saves 3 per unit, so it is priced into the window
        let best = dynamic.partial_pricing(&mut model, 0., 1., 2).unwrap().unwrap();
        assert_eq!(best.sequence, Sequence::Structural(0));
        assert_eq!(model.column_status[0], Status::AtUpperBound);
        assert_eq!(model.solution[0], 2.);
        assert_eq!(dynamic.base().set(0).lower, 0.);

        dynamic.synchronize(&mut model, SyncMode::Restore).unwrap();
        assert_eq!(dynamic.id(0), None);
        assert_eq!(dynamic.dynamic_status(0), DynamicStatus::AtUpperBound);
        assert_eq!(dynamic.base().set(0).lower, -2.);
        assert_eq!(dynamic.base().set(0).upper, 8.);
        assert_eq!(dynamic.objective_offset(), 6.);
    }

    #[test]
    fn test_pool_bounds_shift_sets() {
        let columns = CscMatrix::from(&[[1., 2.], [0., 1.]]);
        let pool = GubColumnPool::new(columns, vec![1., 5.], vec![0, 2])
            .unwrap()
            .with_bounds(Some(vec![1., 0.]), Some(vec![3., 4.]))
            .unwrap();
        let settings = GubSettingsBuilder::default().window_size(2).build().unwrap();
        let matrix = CscMatrix::empty(2);
        let mut dynamic = DynamicGubMatrix::new(matrix, &[0], &[0], &[2.], &[6.], pool, settings).unwrap();
        let mut model = SimplexModel::new(2, dynamic.number_columns());

        // column 0 rests at its lower bound 1
        assert_eq!(dynamic.base().set(0).lower, 1.);
        assert_eq!(dynamic.base().set(0).upper, 5.);
        assert_eq!(dynamic.objective_offset(), 1.);
        assert_eq!(dynamic.rhs_offset(&model, true), &[-1., 0.]);
        assert_eq!(
            dynamic.synchronize(&mut model, SyncMode::ChangingBounds).unwrap(),
            SyncOutcome::BoundsMayChange(true)
        );

        // materializing it moves the value into the working terms
        model.duals = vec![2., 0.];
        let best = dynamic.partial_pricing(&mut model, 0., 1., 4).unwrap().unwrap();
        assert_eq!(best.sequence, Sequence::Structural(0));
        assert_eq!(best.reduced_cost, -1.);
        assert_eq!(dynamic.id(0), Some(0));
        assert_eq!(dynamic.base().set(0).lower, 2.);
        assert_eq!(model.solution[0], 1.);
        assert_eq!(dynamic.objective_offset(), 0.);
        assert_eq!(dynamic.rhs_offset(&model, true), &[-1., 0.]);
    }
}
