use super::*;
use crate::algebra::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Requests handled by [`GubOps::synchronize`].
///
/// All modes go through a single entry point so that the driver calls
/// them in one deterministic order; several of them rewrite the member
/// chains.
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum SyncMode {
    /// a good iterate was reached: snapshot state (and compact the window)
    Rebuild = 0,
    /// `sequence_in` was rejected, keep it out of pricing
    Flag = 1,
    /// make every flagged variable eligible again
    Unflag = 2,
    /// costs changed
    ResetCosts = 3,
    /// dual infeasibilities of the variables the driver does not see
    DualInfeasibilities = 4,
    /// ask whether a refactorization is due
    RefactorCheck = 5,
    /// ask whether bounds may change during the solve
    ChangingBounds = 6,
    /// return to the last snapshot
    Restore = 7,
    /// recompute set data after a pivot touched it
    CleanSet = 8,
    /// fold the entering value into the set bounds
    AdjustBounds = 9,
}

/// Dual infeasibility sums reported by [`SyncMode::DualInfeasibilities`].
#[derive(PartialEq, Clone, Debug, Copy, Default)]
pub struct DualInfeasibilities<T> {
    /// sum of the infeasibilities beyond the dual tolerance
    pub sum: T,
    /// sum beyond ten times the dual tolerance
    pub relaxed_sum: T,
    pub count: usize,
}

impl<T> DualInfeasibilities<T>
where
    T: FloatT,
{
    pub(crate) fn record(&mut self, infeasibility: T, tolerance: T) {
        if infeasibility <= tolerance {
            return;
        }
        let relaxed: T = tolerance * (10.0).as_T();
        self.sum += infeasibility - tolerance;
        if infeasibility > relaxed {
            self.relaxed_sum += infeasibility - relaxed;
        }
        self.count += 1;
    }

    /// infeasibility of a nonbasic variable with reduced cost `dj`
    pub(crate) fn record_status(&mut self, status: Status, dj: T, tolerance: T) {
        match status {
            Status::AtLowerBound => self.record(-dj, tolerance),
            Status::AtUpperBound => self.record(dj, tolerance),
            Status::IsFree | Status::SuperBasic => self.record(dj.abs(), tolerance),
            Status::Basic | Status::IsFixed => {}
        }
    }
}

/// Result of [`GubOps::synchronize`].
#[derive(PartialEq, Clone, Debug, Copy)]
pub enum SyncOutcome<T> {
    Done,
    /// number of variables unflagged
    Unflagged(usize),
    /// whether the driver should refactorize now
    Refactorize(bool),
    /// whether bounds may change during the solve
    BoundsMayChange(bool),
    DualInfeasibilities(DualInfeasibilities<T>),
}

impl<T> GubMatrix<T>
where
    T: FloatT,
{
    pub fn synchronize(&mut self, model: &mut SimplexModel<T>, mode: SyncMode) -> Result<SyncOutcome<T>, GubError> {
        match mode {
            SyncMode::Rebuild => {
                self.save_sets(model);
                Ok(SyncOutcome::Done)
            }
            SyncMode::Flag => {
                match model.sequence_in {
                    Some(Sequence::SetSlack(s)) if s < self.sets.len() => self.sets[s].flagged = true,
                    Some(Sequence::Structural(j)) if j < model.flagged.len() => model.flagged[j] = true,
                    Some(Sequence::RowSlack(_)) => {}
                    _ => return Err(GubError::UnknownSequence),
                }
                Ok(SyncOutcome::Done)
            }
            SyncMode::Unflag => {
                let mut count = 0;
                for set in self.sets.iter_mut().filter(|set| set.flagged) {
                    set.flagged = false;
                    count += 1;
                }
                for flag in model.flagged.iter_mut().filter(|flag| **flag) {
                    *flag = false;
                    count += 1;
                }
                Ok(SyncOutcome::Unflagged(count))
            }
            SyncMode::ResetCosts => {
                self.rhs_offset(model, true);
                Ok(SyncOutcome::Done)
            }
            SyncMode::DualInfeasibilities => Ok(SyncOutcome::DualInfeasibilities(self.slack_dual_infeasibilities(model))),
            SyncMode::RefactorCheck => Ok(SyncOutcome::Refactorize(self.take_refactorization_due())),
            SyncMode::ChangingBounds => Ok(SyncOutcome::BoundsMayChange(false)),
            SyncMode::Restore => {
                self.restore_sets(model)?;
                Ok(SyncOutcome::Done)
            }
            SyncMode::CleanSet | SyncMode::AdjustBounds => Ok(SyncOutcome::Done),
        }
    }

    // set slacks are invisible to the driver; members are covered by the
    // reduced costs stored during pricing
    pub(crate) fn slack_dual_infeasibilities(&self, model: &SimplexModel<T>) -> DualInfeasibilities<T> {
        let tolerance = model.dual_tolerance;
        let mut infeasibilities = DualInfeasibilities::default();
        for (s, set) in self.sets.iter().enumerate() {
            if set.key == Key::Slack {
                continue;
            }
            let dj = self.key_reduced_cost(model, s);
            let status = match set.status {
                SetStatus::AtLowerBound => Status::AtLowerBound,
                SetStatus::AtUpperBound => Status::AtUpperBound,
                SetStatus::Basic | SetStatus::IsFixed => continue,
            };
            infeasibilities.record_status(status, dj, tolerance);
        }
        infeasibilities
    }

    pub(crate) fn save_sets(&mut self, model: &SimplexModel<T>) {
        self.saved = Some(SavedSets {
            keys: self.sets.iter().map(|set| set.key).collect(),
            status: self.sets.iter().map(|set| set.status).collect(),
            feasibility: self.sets.iter().map(|set| set.feasibility).collect(),
            pivot_variable: model.pivot_variable.clone(),
        });
    }

    // the driver restores its own statuses and values first
    pub(crate) fn restore_sets(&mut self, model: &mut SimplexModel<T>) -> Result<(), GubError> {
        let Some(saved) = self.saved.clone() else {
            return Ok(());
        };
        for (s, set) in self.sets.iter_mut().enumerate() {
            set.key = saved.keys[s];
            set.status = saved.status[s];
            set.feasibility = saved.feasibility[s];
        }
        for s in 0..self.sets.len() {
            self.relink_set(model, s);
        }
        if saved.pivot_variable.len() == model.number_rows {
            model.pivot_variable = saved.pivot_variable;
        } else {
            return Err(GubError::UnknownSequence);
        }
        self.possible_pivot_key = None;
        // the restored keys do not match the current factorization
        self.refactorization_due = true;
        self.rhs_offset(model, true);
        Ok(())
    }
}
