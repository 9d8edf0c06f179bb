#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Basic marker for one row slack or structural column.
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BasisMark {
    NonBasic,
    /// basic, not yet factorized
    Basic,
    /// basic and pivoted at the given row of the last factorization
    Pivot(usize),
    /// basic but linearly dependent on the other basics
    Singular,
}

impl BasisMark {
    pub fn is_basic(&self) -> bool {
        matches!(*self, BasisMark::Basic | BasisMark::Pivot(_))
    }

    /// pivot row assigned by the last factorization
    pub fn pivot_row(&self) -> Option<usize> {
        match *self {
            BasisMark::Pivot(r) => Some(r),
            _ => None,
        }
    }
}

/// A column of the basis matrix.  Slack `i` contributes `slack_value * e_i`.
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BasisColumn {
    Structural(usize),
    Slack(usize),
}

/// Basic markers for every row slack and structural column, handed to
/// [`Factorization::factorize`](crate::factor::Factorization::factorize).
///
/// After a successful factorization every basic entry holds
/// `BasisMark::Pivot(row)`.  After a singular one the dependent columns are
/// marked `BasisMark::Singular`; [`make_non_singular`](BasisFlags::make_non_singular)
/// then swaps them for the slacks of the rows left without a pivot.
#[derive(PartialEq, Eq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BasisFlags {
    pub rows: Vec<BasisMark>,
    pub columns: Vec<BasisMark>,
}

impl BasisFlags {
    /// all rows and columns nonbasic
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            rows: vec![BasisMark::NonBasic; nrows],
            columns: vec![BasisMark::NonBasic; ncols],
        }
    }

    /// every row slack basic, every structural nonbasic
    pub fn slack_basis(nrows: usize, ncols: usize) -> Self {
        Self {
            rows: vec![BasisMark::Basic; nrows],
            columns: vec![BasisMark::NonBasic; ncols],
        }
    }

    pub fn set_column_basic(&mut self, j: usize, basic: bool) {
        self.columns[j] = if basic {
            BasisMark::Basic
        } else {
            BasisMark::NonBasic
        };
    }

    pub fn set_row_basic(&mut self, i: usize, basic: bool) {
        self.rows[i] = if basic {
            BasisMark::Basic
        } else {
            BasisMark::NonBasic
        };
    }

    pub fn number_basic(&self) -> usize {
        self.rows
            .iter()
            .chain(self.columns.iter())
            .filter(|m| m.is_basic() || **m == BasisMark::Singular)
            .count()
    }

    /// basis columns in factorization order: structurals, then slacks
    pub(crate) fn basic_columns(&self) -> Vec<BasisColumn> {
        let structurals = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_basic())
            .map(|(j, _)| BasisColumn::Structural(j));
        let slacks = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_basic())
            .map(|(i, _)| BasisColumn::Slack(i));
        structurals.chain(slacks).collect()
    }

    pub(crate) fn mark(&mut self, col: BasisColumn, mark: BasisMark) {
        match col {
            BasisColumn::Structural(j) => self.columns[j] = mark,
            BasisColumn::Slack(i) => self.rows[i] = mark,
        }
    }

    /// Replace every singular column by the slack of an unpivoted row.
    /// Returns the number of slacks brought in.
    pub fn make_non_singular(&mut self, unpivoted_rows: &[usize]) -> usize {
        for m in self.rows.iter_mut().chain(self.columns.iter_mut()) {
            if *m == BasisMark::Singular {
                *m = BasisMark::NonBasic;
            }
        }
        for &i in unpivoted_rows {
            self.rows[i] = BasisMark::Basic;
        }
        unpivoted_rows.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_make_non_singular() {
        let mut flags = BasisFlags::new(3, 3);
        flags.set_column_basic(0, true);
        flags.set_column_basic(1, true);
        flags.set_row_basic(2, true);
        assert_eq!(flags.number_basic(), 3);

        // column 1 turned out dependent, row 1 has no pivot
        flags.columns[1] = BasisMark::Singular;
        let added = flags.make_non_singular(&[1]);
        assert_eq!(added, 1);
        assert_eq!(flags.columns[1], BasisMark::NonBasic);
        assert_eq!(flags.rows[1], BasisMark::Basic);
        assert_eq!(flags.number_basic(), 3);
        assert_eq!(
            flags.basic_columns(),
            vec![
                BasisColumn::Structural(0),
                BasisColumn::Slack(1),
                BasisColumn::Slack(2)
            ]
        );
    }
}
