use super::*;
use crate::algebra::*;

/// Entering candidate returned by partial pricing.
#[derive(PartialEq, Clone, Debug, Copy)]
pub struct PricedCandidate<T> {
    pub sequence: Sequence,
    /// reduced cost in the key-transformed space
    pub reduced_cost: T,
}

/// Running state of one pricing pass.  The dynamic layer seeds it with
/// its best pool candidate before the working columns are scanned.
pub(crate) struct PricingPass<T> {
    pub best_value: T,
    pub best: Option<PricedCandidate<T>>,
    pub wanted: usize,
    original_wanted: usize,
    sets_scanned: usize,
}

impl<T> PricingPass<T>
where
    T: FloatT,
{
    pub fn new(model: &SimplexModel<T>, number_wanted: usize) -> Self {
        Self {
            best_value: model.dual_tolerance,
            best: None,
            wanted: number_wanted,
            original_wanted: number_wanted,
            sets_scanned: 0,
        }
    }

    // true if the candidate was accepted as the new best
    pub fn offer(&mut self, value: T, sequence: Sequence, reduced_cost: T) -> bool {
        if value > self.best_value {
            self.best_value = value;
            self.best = Some(PricedCandidate {
                sequence,
                reduced_cost,
            });
            self.wanted = self.wanted.saturating_sub(1);
            true
        } else {
            false
        }
    }

    fn finished(&self, settings: &GubSettings<T>) -> bool {
        if self.wanted == 0 {
            return true;
        }
        self.wanted + settings.minimum_good_reduced_costs < self.original_wanted
            && self.sets_scanned > settings.minimum_objects_scan
    }
}

/// Attractiveness of a nonbasic variable with reduced cost `dj`, or
/// `None` if moving it cannot improve the objective.
pub(crate) fn price_status<T: FloatT>(status: Status, dj: T, tolerance: T, settings: &GubSettings<T>) -> Option<T> {
    match status {
        Status::Basic | Status::IsFixed => None,
        Status::IsFree | Status::SuperBasic => {
            (dj.abs() > settings.free_accept * tolerance).then(|| dj.abs() * settings.free_bias)
        }
        Status::AtUpperBound => (dj > tolerance).then_some(dj),
        Status::AtLowerBound => (-dj > tolerance).then_some(-dj),
    }
}

// start..end fractions of lo..hi
pub(crate) fn fraction_range<T: FloatT>(lo: usize, hi: usize, start: T, end: T) -> std::ops::Range<usize> {
    let len = hi.saturating_sub(lo);
    let at = |f: T| {
        let f = f.max(T::zero()).min(T::one());
        (f * T::from_usize(len).unwrap_or_else(T::zero))
            .floor()
            .to_usize()
            .unwrap_or(0)
            .min(len)
    };
    (lo + at(start))..(lo + at(end))
}

impl<T> GubMatrix<T>
where
    T: FloatT,
{
    /// Reduced cost offset of the members of `s`: the key's reduced cost
    /// for a column key, or the phase one weight of an infeasible set
    /// whose slack is key.
    pub fn key_reduced_cost(&self, model: &SimplexModel<T>, s: usize) -> T {
        let set = &self.sets[s];
        match set.key {
            Key::Member(k) => {
                let (rows, vals) = self.matrix.column(k);
                model.reduced_cost_of(model.cost[k], rows, vals)
            }
            Key::Slack => -set.feasibility.weight::<T>() * model.infeasibility_cost,
        }
    }

    /// Find an entering variable among a fraction of the columns.
    ///
    /// The columns outside the sets are scanned over `start..end` of their
    /// range, then the sets in `start..end` of the set list, where each set
    /// offers its slack and its nonbasic members priced relative to the
    /// key.  The scan stops early once enough improving candidates have
    /// been seen over enough sets.  Reduced costs of the scanned columns
    /// are stored in `model.reduced_cost`.
    pub fn partial_pricing(
        &mut self,
        model: &mut SimplexModel<T>,
        start: T,
        end: T,
        number_wanted: usize,
    ) -> Result<Option<PricedCandidate<T>>, GubError> {
        let mut pass = PricingPass::new(model, number_wanted);
        self.price_working(model, start, end, &mut pass);
        Ok(pass.best)
    }

    pub(crate) fn price_working(
        &mut self,
        model: &mut SimplexModel<T>,
        start: T,
        end: T,
        pass: &mut PricingPass<T>,
    ) {
        self.scan_working(model, start, end, pass);
        self.gub_slack_in = match pass.best {
            Some(PricedCandidate {
                sequence: Sequence::SetSlack(s),
                ..
            }) => Some(s),
            _ => None,
        };
    }

    fn scan_working(&mut self, model: &mut SimplexModel<T>, start: T, end: T, pass: &mut PricingPass<T>) {
        let nsets = self.sets.len();

        self.price_loose(model, fraction_range(0, self.first_gub, start, end), pass);
        if pass.finished(&self.settings) {
            return;
        }

        for s in fraction_range(0, nsets, start, end) {
            self.price_set(model, s, pass);
            pass.sets_scanned += 1;
            if pass.finished(&self.settings) {
                return;
            }
        }

        let after = fraction_range(self.first_gub, self.priced_columns, start, end);
        self.price_loose(model, after, pass);
    }

    // columns that belong to no set
    fn price_loose(&self, model: &mut SimplexModel<T>, range: std::ops::Range<usize>, pass: &mut PricingPass<T>) {
        let tolerance = model.dual_tolerance;
        for j in range {
            if self.set_of[j].is_some() || model.flagged[j] {
                continue;
            }
            let status = model.column_status[j];
            if status.is_basic() {
                continue;
            }
            let (rows, vals) = self.matrix.column(j);
            let dj = model.reduced_cost_of(model.cost[j], rows, vals);
            model.reduced_cost[j] = dj;
            if let Some(value) = price_status(status, dj, tolerance, &self.settings) {
                pass.offer(value, Sequence::Structural(j), dj);
            }
        }
    }

    fn price_set(&self, model: &mut SimplexModel<T>, s: usize, pass: &mut PricingPass<T>) {
        let tolerance = model.dual_tolerance;
        let dj_mod = self.key_reduced_cost(model, s);

        let set = &self.sets[s];
        if set.key != Key::Slack && !set.flagged {
            let value = match set.status {
                SetStatus::AtLowerBound => Some(-dj_mod),
                SetStatus::AtUpperBound => Some(dj_mod),
                SetStatus::Basic | SetStatus::IsFixed => None,
            };
            if let Some(value) = value.filter(|&v| v > tolerance) {
                pass.offer(value, Sequence::SetSlack(s), dj_mod);
            }
        }

        for j in self.chains.members(s) {
            let status = model.column_status[j];
            if status.is_basic() || model.flagged[j] {
                continue;
            }
            let (rows, vals) = self.matrix.column(j);
            let dj = model.reduced_cost_of(model.cost[j], rows, vals) - dj_mod;
            model.reduced_cost[j] = dj;
            if let Some(value) = price_status(status, dj, tolerance, &self.settings) {
                pass.offer(value, Sequence::Structural(j), dj);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // one free column, then a set of three
    fn priced() -> (GubMatrix<f64>, SimplexModel<f64>) {
        let A = CscMatrix::from(&[[1., 1., 2., 1.], [1., 0., 1., 1.]]);
        let gub = GubMatrix::new(A, &[1], &[4], &[0.], &[1.], GubSettings::default()).unwrap();
        let mut model = SimplexModel::new(2, 4);
        model.duals = vec![1., 0.];
        model.cost = vec![2., 3., 1., 4.];
        (gub, model)
    }

    #[test]
    fn test_price_status() {
        let settings = GubSettings::<f64>::default();
        let tol = 1e-7;
        assert_eq!(price_status(Status::AtLowerBound, -2., tol, &settings), Some(2.));
        assert_eq!(price_status(Status::AtLowerBound, 2., tol, &settings), None);
        assert_eq!(price_status(Status::AtUpperBound, 2., tol, &settings), Some(2.));
        assert_eq!(price_status(Status::IsFree, -1., tol, &settings), Some(10.));
        assert_eq!(price_status(Status::IsFixed, -1., tol, &settings), None);
        assert_eq!(fraction_range(2, 12, 0.5, 1.0), 7..12);
    }

    #[test]
    fn test_pricing_relative_to_key() {
        let (mut gub, mut model) = priced();

        // slack key: plain reduced costs, column 2 has d = 1 - 2 = -1
        let best = gub.partial_pricing(&mut model, 0., 1., 10).unwrap().unwrap();
        assert_eq!(best.sequence, Sequence::Structural(2));
        assert_eq!(best.reduced_cost, -1.);

        // column 1 is key with d = 3 - 1 = 2, so 2 prices at -3 and 3 at 3 - 2
        gub.sets[0].key = Key::Member(1);
        gub.sets[0].status = SetStatus::AtLowerBound;
        gub.chains.unlink(1);
        model.column_status[1] = Status::Basic;
        let best = gub.partial_pricing(&mut model, 0., 1., 10).unwrap().unwrap();
        assert_eq!(best.sequence, Sequence::Structural(2));
        assert_eq!(best.reduced_cost, -3.);
        assert_eq!(model.reduced_cost[3], 1.);
        assert_eq!(gub.gub_slack_in, None);
    }

    #[test]
    fn test_slack_wins_pricing() {
        let (mut gub, mut model) = priced();
        model.cost = vec![2., -4., 1., 4.];
        gub.sets[0].key = Key::Member(1);
        gub.sets[0].status = SetStatus::AtLowerBound;
        gub.chains.unlink(1);
        model.column_status[1] = Status::Basic;
        model.flagged[2] = true;

        // raising the set sum saves 5 per unit
        let best = gub.partial_pricing(&mut model, 0., 1., 10).unwrap().unwrap();
        assert_eq!(best.sequence, Sequence::SetSlack(0));
        assert_eq!(best.reduced_cost, -5.);
        assert_eq!(gub.gub_slack_in, Some(0));
    }
}
