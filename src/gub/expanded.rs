use super::*;
use crate::algebra::*;

/// Entries of an updated row vector below this are dropped.
const ZERO_TOLERANCE: f64 = 1e-13;

/// Entry of an updated column on the implicit row of a GUB set.
///
/// `alpha` is the rate at which the key of `set` falls as the entering
/// variable rises, in the same sign convention as the explicit entries of
/// the updated column: a basic variable moves by `-theta * alpha`.
#[derive(PartialEq, Clone, Debug, Copy)]
pub struct SetAlpha<T> {
    pub set: usize,
    pub key: Key,
    pub alpha: T,
}

/// Primal infeasibility of the sets whose slack is key.
#[derive(PartialEq, Clone, Debug, Copy, Default)]
pub struct PrimalInfeasibilities<T> {
    /// sum of the excess beyond the primal tolerance
    pub sum: T,
    pub count: usize,
}

impl<T> GubMatrix<T>
where
    T: FloatT,
{
    /// Set-row entries of `updated`, the entering column after FTRAN.
    ///
    /// Every set with a basic nonkey member listed in `updated`, and the
    /// set of the entering variable, gets one entry.  Sets come out in
    /// ascending order.
    pub fn extend_updated(&self, model: &SimplexModel<T>, updated: &IndexedVector<T>) -> Result<Vec<SetAlpha<T>>, GubError> {
        let Some(seq_in) = model.sequence_in else {
            return Err(GubError::UnknownSequence);
        };
        let mut entries: Vec<(usize, T)> = Vec::new();

        let entering = match seq_in {
            Sequence::Structural(j) if !self.is_key(j) => self.set_of(j).map(|s| (s, T::one())),
            Sequence::SetSlack(s) if s < self.sets.len() => Some((s, -T::one())),
            _ => None,
        };
        entries.extend(entering);

        for (r, v) in updated.iter() {
            let Some(&Sequence::Structural(j)) = model.pivot_variable.get(r) else {
                continue;
            };
            let Some(s) = self.set_of(j) else {
                continue;
            };
            match entries.iter_mut().find(|(set, _)| *set == s) {
                Some((_, alpha)) => *alpha -= v,
                None => entries.push((s, -v)),
            }
        }

        entries.sort_unstable_by_key(|&(s, _)| s);
        Ok(entries
            .into_iter()
            .map(|(s, alpha)| {
                let key = self.sets[s].key;
                // the slack counts the members with the opposite sign
                let alpha = if key == Key::Slack { -alpha } else { alpha };
                SetAlpha { set: s, key, alpha }
            })
            .collect())
    }

    /// Move the member keys by a step of `theta` along `alphas`, as
    /// returned by [`extend_updated`](Self::extend_updated).
    pub fn step_keys(&self, model: &mut SimplexModel<T>, alphas: &[SetAlpha<T>], theta: T) {
        for entry in alphas {
            if let Key::Member(k) = entry.key {
                model.solution[k] -= theta * entry.alpha;
            }
        }
    }

    /// Recompute every key from the other members of its set.
    ///
    /// Member keys take the value that holds the set sum at its bound and
    /// are marked basic.  Slack keys get their feasibility reclassified;
    /// the excess of those outside their bounds is reported.
    pub fn primal_expanded(&mut self, model: &mut SimplexModel<T>) -> PrimalInfeasibilities<T> {
        let tolerance = model.primal_tolerance;
        let mut report = PrimalInfeasibilities::default();
        for s in 0..self.sets.len() {
            let others = self
                .chains
                .members(s)
                .fold(T::zero(), |acc, j| acc + model.solution[j]);
            let set = &mut self.sets[s];
            match set.key {
                Key::Member(k) => {
                    model.column_status[k] = Status::Basic;
                    model.solution[k] = set.bound_value() - others;
                }
                Key::Slack => {
                    set.feasibility = SetFeasibility::classify(others, set.lower, set.upper, tolerance);
                    let excess = match set.feasibility {
                        SetFeasibility::Above => others - set.upper - tolerance,
                        SetFeasibility::Below => set.lower - others - tolerance,
                        SetFeasibility::Feasible => T::zero(),
                    };
                    if excess > T::zero() {
                        report.sum += excess;
                        report.count += 1;
                    }
                }
            }
        }
        report
    }

    /// `scalar * pi` times the basis columns of every working column.
    ///
    /// Nonkey members of a set with a member key see `a_j - a_key`, so
    /// the result is the tableau row in the key-transformed space.  Keys
    /// themselves come out as zero and are left out.
    pub fn transpose_times(&self, pi: &[T], scalar: T) -> Result<SparseVector<T>, GubError> {
        if pi.len() != self.matrix.m {
            return Err(GubError::IncompatibleDimension);
        }
        let tolerance: T = ZERO_TOLERANCE.as_T();
        let dot = |j: usize| {
            let (rows, vals) = self.matrix.column(j);
            rows.iter()
                .zip(vals)
                .fold(T::zero(), |acc, (&r, &v)| acc + pi[r] * v)
        };

        let n = self.matrix.n;
        let mut row = SparseVector::zeros(n);
        // key products, computed once per set
        let mut key_dot: Vec<Option<T>> = vec![None; self.sets.len()];
        for j in 0..n {
            let mut value = dot(j);
            if let Some(s) = self.set_of(j) {
                if let Key::Member(k) = self.sets[s].key {
                    let shift = *key_dot[s].get_or_insert_with(|| dot(k));
                    value -= shift;
                }
            }
            let value = scalar * value;
            if !value.is_negligible(tolerance) {
                row.push(j, value);
            }
        }
        Ok(row)
    }
}
