use super::*;
use crate::algebra::*;

/// Tolerance for an updated column entry to make its row's variable a
/// candidate key.
const KEY_PIVOT_TOLERANCE: f64 = 1e-5;

impl<T> GubMatrix<T>
where
    T: FloatT,
{
    /// Pick the row whose basic variable replaces the key of `set` if the
    /// key leaves, given the entering column in `updated`.  The chosen
    /// row is remembered for the next [`update_pivot`](Self::update_pivot).
    pub fn choose_pivot_key(&mut self, model: &SimplexModel<T>, updated: &IndexedVector<T>, set: usize) -> Option<usize> {
        let tolerance: T = KEY_PIVOT_TOLERANCE.as_T();
        let mut best: Option<(usize, T)> = None;
        for (r, v) in updated.iter() {
            let Some(&Sequence::Structural(j)) = model.pivot_variable.get(r) else {
                continue;
            };
            if self.set_of(j) != Some(set) || v.is_negligible(tolerance) {
                continue;
            }
            if best.map_or(true, |(_, b)| v.abs() > b) {
                best = Some((r, v.abs()));
            }
        }
        self.possible_pivot_key = best.map(|(r, _)| r);
        self.possible_pivot_key
    }

    /// Absorb an accepted pivot.
    ///
    /// The driver has already moved `sequence_in` to basic and
    /// `sequence_out` to its nonbasic status, set its new value in
    /// `value_out`, and stored the new solution values.  `old_in_value`
    /// is the entering value before the pivot.  Keys, chains and
    /// `pivot_variable` are updated here, and the effective rhs is
    /// corrected by the terms of the touched variables only.
    pub fn update_pivot(&mut self, model: &mut SimplexModel<T>, old_in_value: T, _old_out_value: T) -> Result<(), GubError> {
        let (Some(seq_in), Some(seq_out)) = (model.sequence_in, model.sequence_out) else {
            return Err(GubError::UnknownSequence);
        };
        let structural = |seq: Sequence| match seq {
            Sequence::Structural(j) => Some(j),
            _ => None,
        };
        let (j_in, j_out) = (structural(seq_in), structural(seq_out));
        self.validate_pivot(model, seq_in, seq_out)?;

        let mut touched: Vec<usize> = [self.set_of_sequence(seq_in), self.set_of_sequence(seq_out)]
            .into_iter()
            .flatten()
            .collect();
        if let Some(PivotRow::Set(s)) = model.pivot_row {
            touched.push(s);
        }
        touched.sort_unstable();
        touched.dedup();

        // take out the terms of the state before the pivot
        let mut rhs = std::mem::take(&mut self.rhs);
        if let Some(j) = j_in {
            if !self.is_key(j) {
                self.matrix.col_axpy(j, old_in_value, &mut rhs);
            }
        }
        let before = Some((j_in, old_in_value, j_out.filter(|_| seq_in != seq_out)));
        for &s in &touched {
            if let Some((k, b)) = self.key_term(model, s, before) {
                self.matrix.col_axpy(k, b, &mut rhs);
            }
        }
        self.rhs = rhs;

        let old_keys: Vec<Key> = touched.iter().map(|&s| self.sets[s].key).collect();
        let mut written = None;
        if seq_in == seq_out {
            if let Sequence::SetSlack(s) = seq_in {
                let status = self.sets[s].status_at(model.value_out);
                self.sets[s].status = status;
            }
        } else {
            written = match model.pivot_row {
                Some(PivotRow::Row(r)) => Some(self.pivot_on_row(model, r, seq_in)?),
                Some(PivotRow::Set(s)) => self.pivot_on_set(model, s, seq_in, seq_out)?,
                None => return Err(GubError::UnknownSequence),
            };
        }
        self.possible_pivot_key = None;

        // the column just written into its row was unpacked for the new keys
        let fresh = written
            .and_then(|r| model.pivot_variable.get(r).copied())
            .and_then(structural);
        for (&s, &old) in touched.iter().zip(&old_keys) {
            let new = self.sets[s].key;
            self.chains
                .redo(s, new, old, |j| model.column_status[j].is_basic());
            if old != new && self.has_stale_member(model, s, fresh) {
                self.refactorization_due = true;
            }
            let _ = self.print_key_change(s, old, new);
        }
        for &s in &touched {
            if self.sets[s].key == Key::Slack {
                let sum = self.set_sum(model, s);
                let set = &mut self.sets[s];
                set.feasibility = SetFeasibility::classify(sum, set.lower, set.upper, model.primal_tolerance);
            }
        }

        // and add the terms of the state after it
        let mut rhs = std::mem::take(&mut self.rhs);
        if let Some(j) = j_out {
            if !model.column_status[j].is_basic() && !self.is_key(j) {
                self.matrix.col_axpy(j, -model.solution[j], &mut rhs);
            }
        }
        for &s in &touched {
            if let Some((k, b)) = self.key_term(model, s, None) {
                self.matrix.col_axpy(k, -b, &mut rhs);
            }
        }
        self.rhs = rhs;
        Ok(())
    }

    // reject a pivot the key bookkeeping cannot follow before any state changes
    fn validate_pivot(&self, model: &SimplexModel<T>, seq_in: Sequence, seq_out: Sequence) -> Result<(), GubError> {
        if seq_in == seq_out {
            return Ok(());
        }
        let slack_has_key = |seq: Sequence| match seq {
            Sequence::SetSlack(t) => self.sets[t].key != Key::Slack,
            _ => true,
        };
        match model.pivot_row {
            Some(PivotRow::Row(r)) if r < model.pivot_variable.len() => {
                slack_has_key(seq_in).then_some(()).ok_or(GubError::UnknownSequence)
            }
            Some(PivotRow::Set(s)) if s < self.sets.len() => {
                let inside = match seq_in {
                    Sequence::Structural(j) => self.set_of(j) == Some(s),
                    Sequence::SetSlack(t) => t == s,
                    Sequence::RowSlack(_) => false,
                };
                if inside {
                    return Ok(());
                }
                let r = self.possible_pivot_key.ok_or(GubError::NoBasicMember(s))?;
                match model.pivot_variable.get(r) {
                    Some(&Sequence::Structural(k)) if self.set_of(k) == Some(s) => {}
                    _ => return Err(GubError::NoBasicMember(s)),
                }
                slack_has_key(seq_in).then_some(()).ok_or(GubError::UnknownSequence)
            }
            _ => Err(GubError::UnknownSequence),
        }
    }

    // `entering` takes explicit row `r`
    fn pivot_on_row(&mut self, model: &mut SimplexModel<T>, r: usize, entering: Sequence) -> Result<usize, GubError> {
        if r >= model.pivot_variable.len() {
            return Err(GubError::UnknownSequence);
        }
        self.place_in_row(model, r, entering)?;
        Ok(r)
    }

    // The key of `s` leaves the basis.  Returns the explicit row that
    // changed hands, if any.
    fn pivot_on_set(
        &mut self,
        model: &mut SimplexModel<T>,
        s: usize,
        entering: Sequence,
        leaving: Sequence,
    ) -> Result<Option<usize>, GubError> {
        let entering_set = self.set_of_sequence(entering);
        let mut written = None;
        let new_key = match entering {
            Sequence::Structural(j) if entering_set == Some(s) => Key::Member(j),
            Sequence::SetSlack(t) if t == s => Key::Slack,
            _ => {
                let r = self.possible_pivot_key.ok_or(GubError::NoBasicMember(s))?;
                let k = match model.pivot_variable.get(r) {
                    Some(&Sequence::Structural(k)) if self.set_of(k) == Some(s) => k,
                    _ => return Err(GubError::NoBasicMember(s)),
                };
                self.place_in_row(model, r, entering)?;
                written = Some(r);
                Key::Member(k)
            }
        };

        let set = &mut self.sets[s];
        set.key = new_key;
        if new_key == Key::Slack {
            set.status = SetStatus::Basic;
        } else if leaving == Sequence::SetSlack(s) {
            set.status = set.status_at(model.value_out);
            set.feasibility = SetFeasibility::Feasible;
        }
        Ok(written)
    }

    // A basic member of `s` other than `fresh` still sits in the
    // factorization as its column minus the previous key.
    fn has_stale_member(&self, model: &SimplexModel<T>, s: usize, fresh: Option<usize>) -> bool {
        self.chains
            .members(s)
            .any(|j| Some(j) != fresh && model.column_status[j].is_basic())
    }

    /// Whether a key change since the last call left columns in the
    /// factorization that no longer match [`unpack`](Self::unpack).
    /// Asking clears the flag.
    pub(crate) fn take_refactorization_due(&mut self) -> bool {
        std::mem::take(&mut self.refactorization_due)
    }

    fn place_in_row(&mut self, model: &mut SimplexModel<T>, r: usize, entering: Sequence) -> Result<(), GubError> {
        match entering {
            Sequence::Structural(_) | Sequence::RowSlack(_) => {
                model.pivot_variable[r] = entering;
            }
            Sequence::SetSlack(t) => {
                // the slack becomes key, its old key needs the row
                let k = self.sets[t].key.member().ok_or(GubError::UnknownSequence)?;
                model.pivot_variable[r] = Sequence::Structural(k);
                self.sets[t].key = Key::Slack;
                self.sets[t].status = SetStatus::Basic;
            }
        }
        Ok(())
    }
}
