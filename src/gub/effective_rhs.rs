use super::*;
use crate::algebra::*;
use crate::utils::{is_lower_infinite, is_upper_infinite};
use std::io::Write;

// which variable is basic in the one-row problem of a set
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum RowBasic {
    Slack,
    Member(usize),
}

/// Bounded-variable problem over the members of one set:
/// minimize `c x` subject to `lower <= sum(x) <= upper`.
struct SetProblem<T> {
    members: Vec<usize>,
    cost: Vec<T>,
    lo: Vec<T>,
    up: Vec<T>,
    x: Vec<T>,
    lower: T,
    upper: T,
    basic: RowBasic,
}

impl<T> SetProblem<T>
where
    T: FloatT,
{
    fn new(model: &SimplexModel<T>, members: Vec<usize>, lower: T, upper: T) -> Self {
        let cost = members.iter().map(|&j| model.cost[j]).collect();
        let lo: Vec<T> = members.iter().map(|&j| model.lower[j]).collect();
        let up: Vec<T> = members.iter().map(|&j| model.upper[j]).collect();
        let x = members
            .iter()
            .enumerate()
            .map(|(p, &j)| starting_value(model.column_status[j], lo[p], up[p]))
            .collect();
        Self {
            members,
            cost,
            lo,
            up,
            x,
            lower,
            upper,
            basic: RowBasic::Slack,
        }
    }

    fn sum(&self) -> T {
        self.x.iter().fold(T::zero(), |acc, &v| acc + v)
    }

    // room for member p to move in direction dir
    fn room(&self, p: usize, dir: T) -> T {
        if dir > T::zero() {
            self.up[p] - self.x[p]
        } else {
            self.x[p] - self.lo[p]
        }
    }

    /// Bring the member sum into the set bounds, cheapest members first.
    /// Returns false if the bounds cannot be met.
    fn make_feasible(&mut self, tolerance: T) -> bool {
        loop {
            let sum = self.sum();
            let (dir, gap) = if sum < self.lower - tolerance {
                (T::one(), self.lower - sum)
            } else if sum > self.upper + tolerance {
                (-T::one(), sum - self.upper)
            } else {
                return true;
            };

            // cheapest to raise, or dearest to lower
            let pick = (0..self.members.len())
                .filter(|&p| self.room(p, dir) > tolerance)
                .min_by(|&p, &q| {
                    let (a, b) = (dir * self.cost[p], dir * self.cost[q]);
                    a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
                });
            let Some(p) = pick else {
                return false;
            };

            let room = self.room(p, dir);
            if room > gap {
                self.x[p] += dir * gap;
                self.basic = RowBasic::Member(p);
                return true;
            }
            self.x[p] += dir * room;
        }
    }

    /// Simplex iterations on the single row starting from a feasible point.
    fn optimize(&mut self, tolerance: T) {
        let limit = 10 * (self.members.len() + 1);
        for _ in 0..limit {
            let dual = match self.basic {
                RowBasic::Slack => T::zero(),
                RowBasic::Member(k) => self.cost[k],
            };
            let sum = self.sum();

            // entering: a member or, while a member is basic, the row slack
            let mut best: Option<(Option<usize>, T)> = None;
            let mut best_dj = tolerance;
            for p in 0..self.members.len() {
                if self.basic == RowBasic::Member(p) {
                    continue;
                }
                let dj = self.cost[p] - dual;
                for dir in [T::one(), -T::one()] {
                    if -dir * dj > best_dj && self.room(p, dir) > tolerance {
                        best_dj = -dir * dj;
                        best = Some((Some(p), dir));
                    }
                }
            }
            if let RowBasic::Member(_) = self.basic {
                for dir in [T::one(), -T::one()] {
                    let room = if dir > T::zero() {
                        self.upper - sum
                    } else {
                        sum - self.lower
                    };
                    if -dir * dual > best_dj && room > tolerance {
                        best_dj = -dir * dual;
                        best = Some((None, dir));
                    }
                }
            }
            let Some((entering, dir)) = best else {
                return;
            };

            match (entering, self.basic) {
                (Some(p), RowBasic::Slack) => {
                    // sum moves with the member
                    let own = self.room(p, dir);
                    let row = if dir > T::zero() {
                        self.upper - sum
                    } else {
                        sum - self.lower
                    };
                    if is_step_infinite(own) && is_step_infinite(row) {
                        return;
                    }
                    if own <= row {
                        self.x[p] += dir * own;
                    } else {
                        self.x[p] += dir * row;
                        self.basic = RowBasic::Member(p);
                    }
                }
                (Some(p), RowBasic::Member(k)) => {
                    // the basic member absorbs the change
                    let own = self.room(p, dir);
                    let theirs = self.room(k, -dir);
                    if is_step_infinite(own) && is_step_infinite(theirs) {
                        return;
                    }
                    if own <= theirs {
                        self.x[p] += dir * own;
                        self.x[k] -= dir * own;
                    } else {
                        self.x[p] += dir * theirs;
                        self.x[k] -= dir * theirs;
                        self.basic = RowBasic::Member(p);
                    }
                }
                (None, RowBasic::Member(k)) => {
                    // the sum moves, carried by the basic member
                    let row = if dir > T::zero() {
                        self.upper - sum
                    } else {
                        sum - self.lower
                    };
                    let theirs = self.room(k, dir);
                    if is_step_infinite(row) && is_step_infinite(theirs) {
                        return;
                    }
                    if row <= theirs {
                        self.x[k] += dir * row;
                    } else {
                        self.x[k] += dir * theirs;
                        self.basic = RowBasic::Slack;
                    }
                }
                (None, RowBasic::Slack) => return,
            }
        }
    }
}

fn starting_value<T: FloatT>(status: Status, lo: T, up: T) -> T {
    let lo_inf = is_lower_infinite(lo);
    let up_inf = is_upper_infinite(up);
    match status {
        Status::AtUpperBound if !up_inf => up,
        _ if !lo_inf => lo,
        _ if !up_inf => up,
        _ => T::zero(),
    }
}

fn is_step_infinite<T: FloatT>(step: T) -> bool {
    is_upper_infinite(step)
}

impl<T> GubMatrix<T>
where
    T: FloatT,
{
    /// Return the effective rhs, `-A x` over the nonbasic columns with the
    /// set rows folded in through the column keys.
    ///
    /// The cache is recomputed when `force_refresh` is set, on first use,
    /// or once `refresh_frequency` iterations have passed since the last
    /// recomputation; otherwise the incrementally maintained values are
    /// returned.
    pub fn rhs_offset(&mut self, model: &SimplexModel<T>, force_refresh: bool) -> &[T] {
        let frequency = self.settings.refresh_frequency;
        let due = match self.last_refresh {
            None => true,
            Some(last) => force_refresh || (frequency > 0 && model.iterations >= last + frequency),
        };
        if due {
            self.refresh_rhs(model);
            self.last_refresh = Some(model.iterations);
        }
        &self.rhs
    }

    fn refresh_rhs(&mut self, model: &SimplexModel<T>) {
        self.rhs.iter_mut().for_each(|v| *v = T::zero());
        let mut rhs = std::mem::take(&mut self.rhs);
        for j in 0..self.matrix.n {
            if model.column_status[j].is_basic() {
                continue;
            }
            let x = model.solution[j];
            if x != T::zero() {
                self.matrix.col_axpy(j, -x, &mut rhs);
            }
        }
        for s in 0..self.sets.len() {
            if let Some((k, b)) = self.key_term(model, s, None) {
                self.matrix.col_axpy(k, -b, &mut rhs);
            }
        }
        self.rhs = rhs;
    }

    /// Key column of `s` and the value the set row assigns it from the
    /// nonbasic members.  `before` describes the state prior to a pivot:
    /// the entering member with its old value and the leaving member.
    pub(crate) fn key_term(
        &self,
        model: &SimplexModel<T>,
        s: usize,
        before: Option<(Option<usize>, T, Option<usize>)>,
    ) -> Option<(usize, T)> {
        let set = &self.sets[s];
        let k = set.key.member()?;
        let mut b = set.bound_value();
        for j in self.chains.members(s) {
            let value = match before {
                Some((Some(entering), old, _)) if entering == j => Some(old),
                Some((_, _, Some(leaving))) if leaving == j => None,
                _ if model.column_status[j].is_basic() => None,
                _ => Some(model.solution[j]),
            };
            if let Some(v) = value {
                b -= v;
            }
        }
        Some((k, b))
    }

    /// Choose keys and slack statuses for every set from the current
    /// column statuses.
    ///
    /// Sets whose basic members already fix the key are left alone.  A set
    /// with no basic member keeps the slack as key when `cheapest` is
    /// false and the member sum is feasible; otherwise the set is solved
    /// as a one-row bounded problem over its members, which decides the
    /// nonbasic member values, the basic member and the slack status.
    /// Finally the chains, `pivot_variable` and the effective rhs are
    /// rebuilt.
    pub fn use_effective_rhs(&mut self, model: &mut SimplexModel<T>, cheapest: bool) -> Result<(), GubError> {
        if model.number_columns != self.matrix.n || model.number_rows != self.matrix.m {
            return Err(GubError::UnknownSequence);
        }
        let tolerance = model.primal_tolerance;
        let got_basis = self.sets.iter().any(|set| set.key != Key::Slack);

        for s in 0..self.sets.len() {
            let members: Vec<usize> = self.members(s).collect();
            let basic = members
                .iter()
                .filter(|&&j| model.column_status[j].is_basic())
                .count();

            // a basic member already decides the key (or joins a basic slack)
            let slack_basic = self.sets[s].status == SetStatus::Basic;
            if basic > 1 || (basic == 1 && (slack_basic || got_basis)) {
                continue;
            }
            if basic == 1 {
                let Some(k) = members.iter().copied().find(|&j| model.column_status[j].is_basic()) else {
                    continue;
                };
                if self.try_member_key(model, s, k, tolerance) {
                    continue;
                }
                if !cheapest && self.set_sum_feasible(model, s, tolerance) {
                    self.sets[s].status = SetStatus::Basic;
                    continue;
                }
                model.column_status[k] = Status::AtLowerBound;
            }

            let (lower, upper) = (self.sets[s].lower, self.sets[s].upper);
            let mut problem = SetProblem::new(model, members, lower, upper);
            if !cheapest {
                let sum = problem.sum();
                if sum >= lower - tolerance && sum <= upper + tolerance {
                    self.sets[s].status = SetStatus::Basic;
                    continue;
                }
            }

            let feasible = problem.make_feasible(tolerance);
            if feasible {
                problem.optimize(model.dual_tolerance);
            }
            self.apply_set_problem(model, s, &problem);
        }

        for s in 0..self.sets.len() {
            let old = self.sets[s].key;
            let new = self.choose_key(model, s, got_basis);
            self.sets[s].key = new;
            if new == Key::Slack {
                self.sets[s].status = SetStatus::Basic;
            } else if self.sets[s].status == SetStatus::Basic {
                let sum = self.set_sum(model, s);
                self.sets[s].status = self.sets[s].status_at(sum);
            }
            self.chains
                .redo(s, new, old, |j| model.column_status[j].is_basic());
            if new == Key::Slack {
                let sum = self.set_sum(model, s);
                let set = &mut self.sets[s];
                set.feasibility = SetFeasibility::classify(sum, set.lower, set.upper, tolerance);
            } else {
                self.sets[s].feasibility = SetFeasibility::Feasible;
            }
            let _ = self.print_key_change(s, old, new);
        }

        let pivots = self.fill_pivot_variables(model);
        if pivots.len() == model.number_rows {
            model.pivot_variable = pivots;
        }
        self.rhs_offset(model, true);
        let _ = self.print_crash_summary(model);
        Ok(())
    }

    /// Try to key `s` on its only basic member `k`, with the set slack at
    /// whichever bound leaves `k` within its own bounds more cheaply.  The
    /// value of `k` is first clamped into its bounds.  Returns false, with
    /// the set untouched, if neither bound fits.
    fn try_member_key(&mut self, model: &mut SimplexModel<T>, s: usize, k: usize, tolerance: T) -> bool {
        let (lo, up) = (model.lower[k], model.upper[k]);
        let mut value = self.set_sum(model, s);
        let current = model.solution[k];
        let clamped = if current > up {
            up
        } else if current < lo {
            lo
        } else {
            current
        };
        value -= current - clamped;
        model.solution[k] = clamped;

        let (lower, upper) = (self.sets[s].lower, self.sets[s].upper);
        let fits = |v: T| v >= lo - tolerance && v <= up + tolerance;
        // an exact fit beats any cost
        let cost_at = |bound: T, v: T| {
            if (bound - value).abs() < tolerance {
                T::neg_infinity()
            } else {
                v * model.cost[k]
            }
        };

        let mut choice: Option<(SetStatus, T, T)> = None;
        if !is_upper_infinite(upper) {
            let v = clamped + upper - value;
            if fits(v) {
                choice = Some((SetStatus::AtUpperBound, v, cost_at(upper, v)));
            }
        }
        if !is_lower_infinite(lower) {
            let v = clamped + lower - value;
            if fits(v) {
                let cost = cost_at(lower, v);
                if choice.map_or(true, |(_, _, best)| cost < best) {
                    choice = Some((SetStatus::AtLowerBound, v, cost));
                }
            }
        }

        let Some((status, v, _)) = choice else {
            return false;
        };
        model.solution[k] = v;
        self.sets[s].status = if lower == upper { SetStatus::IsFixed } else { status };
        true
    }

    fn set_sum_feasible(&self, model: &SimplexModel<T>, s: usize, tolerance: T) -> bool {
        let sum = self.set_sum(model, s);
        let set = &self.sets[s];
        sum >= set.lower - tolerance && sum <= set.upper + tolerance
    }

    fn apply_set_problem(&mut self, model: &mut SimplexModel<T>, s: usize, problem: &SetProblem<T>) {
        let set = &mut self.sets[s];
        let sum = problem.sum();
        set.status = match problem.basic {
            RowBasic::Slack => SetStatus::Basic,
            RowBasic::Member(_) => set.status_at(sum),
        };
        for (p, &j) in problem.members.iter().enumerate() {
            model.solution[j] = problem.x[p];
            model.column_status[j] = if problem.basic == RowBasic::Member(p) {
                Status::Basic
            } else if problem.x[p] == problem.up[p] && problem.up[p] != problem.lo[p] {
                Status::AtUpperBound
            } else {
                Status::AtLowerBound
            };
        }
    }

    // A column key needs a basic member and a nonbasic slack.  An
    // existing column key survives when a basis was supplied; otherwise
    // the sparsest basic member is taken.
    fn choose_key(&self, model: &SimplexModel<T>, s: usize, got_basis: bool) -> Key {
        if self.sets[s].status == SetStatus::Basic {
            return Key::Slack;
        }
        if let Key::Member(k) = self.sets[s].key {
            if got_basis && model.column_status[k].is_basic() {
                return Key::Member(k);
            }
        }
        self.members(s)
            .filter(|&j| model.column_status[j].is_basic())
            .min_by_key(|&j| (self.matrix.col_nnz(j), j))
            .map_or(Key::Slack, Key::Member)
    }

    fn print_crash_summary(&mut self, model: &SimplexModel<T>) -> std::io::Result<()> {
        if !self.settings.verbose {
            return Ok(());
        }
        let keyed = self.sets.iter().filter(|set| set.key != Key::Slack).count();
        let nsets = self.sets.len();
        let iterations = model.iterations;
        let out = &mut self.stream;
        writeln!(out, "effective rhs: {keyed} of {nsets} sets keyed on a column at iteration {iterations}")?;
        Ok(())
    }
}
