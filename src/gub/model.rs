use crate::algebra::*;
use crate::utils::get_infinity;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A variable of the simplex problem as seen by the GUB layers.
#[derive(PartialEq, Eq, Clone, Debug, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Sequence {
    /// a column of the working matrix
    Structural(usize),
    /// the slack of a constraint row
    RowSlack(usize),
    /// the implicit slack of a GUB set
    SetSlack(usize),
}

/// Simplex status of a variable.
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    Basic,
    #[default]
    AtLowerBound,
    AtUpperBound,
    IsFixed,
    IsFree,
    SuperBasic,
}

impl Status {
    pub fn is_basic(&self) -> bool {
        matches!(self, Status::Basic)
    }
}

/// Row on which a pivot takes place.
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub enum PivotRow {
    /// an explicit constraint row
    Row(usize),
    /// the implicit row of a GUB set, where the key leaves
    Set(usize),
}

/// The part of a simplex solver's state that the GUB layers read and
/// update.
///
/// The model is owned by the caller.  Column arrays cover the working
/// matrix columns; row arrays cover the constraint rows.  The slack of
/// row `i` has column `e_i` in the basis.
#[derive(Debug, Clone)]
pub struct SimplexModel<T: FloatT = f64> {
    pub number_rows: usize,
    pub number_columns: usize,

    pub column_status: Vec<Status>,
    pub row_status: Vec<Status>,
    pub solution: Vec<T>,
    pub lower: Vec<T>,
    pub upper: Vec<T>,
    pub cost: Vec<T>,
    pub reduced_cost: Vec<T>,
    pub flagged: Vec<bool>,
    pub duals: Vec<T>,

    /// basic variable of every explicit row
    pub pivot_variable: Vec<Sequence>,

    // current pivot, as set by the driver before `update_pivot`
    pub sequence_in: Option<Sequence>,
    pub sequence_out: Option<Sequence>,
    pub pivot_row: Option<PivotRow>,
    pub value_out: T,

    pub iterations: usize,
    pub primal_tolerance: T,
    pub dual_tolerance: T,
    pub infeasibility_cost: T,
    pub objective_offset: T,
}

impl<T> SimplexModel<T>
where
    T: FloatT,
{
    /// A model with all structurals at a zero lower bound, infinite upper
    /// bounds and a slack basis.
    pub fn new(number_rows: usize, number_columns: usize) -> Self {
        let n = number_columns;
        Self {
            number_rows,
            number_columns,
            column_status: vec![Status::AtLowerBound; n],
            row_status: vec![Status::Basic; number_rows],
            solution: vec![T::zero(); n],
            lower: vec![T::zero(); n],
            upper: vec![get_infinity().as_T(); n],
            cost: vec![T::zero(); n],
            reduced_cost: vec![T::zero(); n],
            flagged: vec![false; n],
            duals: vec![T::zero(); number_rows],
            pivot_variable: (0..number_rows).map(Sequence::RowSlack).collect(),
            sequence_in: None,
            sequence_out: None,
            pivot_row: None,
            value_out: T::zero(),
            iterations: 0,
            primal_tolerance: (1e-7).as_T(),
            dual_tolerance: (1e-7).as_T(),
            infeasibility_cost: (1e10).as_T(),
            objective_offset: T::zero(),
        }
    }

    /// Status of a structural or row slack.  Set slacks are tracked by
    /// the GUB layer itself.
    pub fn status(&self, seq: Sequence) -> Option<Status> {
        match seq {
            Sequence::Structural(j) => self.column_status.get(j).copied(),
            Sequence::RowSlack(i) => self.row_status.get(i).copied(),
            Sequence::SetSlack(_) => None,
        }
    }

    pub fn set_status(&mut self, seq: Sequence, status: Status) {
        match seq {
            Sequence::Structural(j) => self.column_status[j] = status,
            Sequence::RowSlack(i) => self.row_status[i] = status,
            Sequence::SetSlack(_) => {}
        }
    }

    /// Cost minus the priced column, `c_j - πᵀ a_j`.
    pub(crate) fn reduced_cost_of(&self, cost: T, rows: &[usize], vals: &[T]) -> T {
        rows.iter()
            .zip(vals)
            .fold(cost, |acc, (&i, &v)| acc - self.duals[i] * v)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_model_defaults() {
        let model = SimplexModel::<f64>::new(2, 3);
        assert_eq!(model.pivot_variable, vec![Sequence::RowSlack(0), Sequence::RowSlack(1)]);
        assert_eq!(model.status(Sequence::Structural(2)), Some(Status::AtLowerBound));
        assert_eq!(model.status(Sequence::SetSlack(0)), None);
        assert!(model.status(Sequence::RowSlack(1)).unwrap().is_basic());
    }
}
