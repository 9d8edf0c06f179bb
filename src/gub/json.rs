use super::*;
use crate::algebra::*;

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::{fs::File, io, io::Read};

/// Keys and statuses of a GUB basis, for warm starting a later solve.
///
/// Only the bookkeeping is stored; values are recomputed from the
/// statuses and bounds when the snapshot is applied.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GubWarmStart {
    pub keys: Vec<Key>,
    pub set_status: Vec<SetStatus>,
    pub column_status: Vec<Status>,
    pub row_status: Vec<Status>,
    pub pivot_variable: Vec<Sequence>,
}

impl GubWarmStart {
    pub fn write_to_file(&self, file: &mut File) -> Result<(), io::Error> {
        let json = serde_json::to_string(self)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn read_from_file(file: &mut File) -> Result<Self, io::Error> {
        let mut buffer = String::new();
        file.read_to_string(&mut buffer)?;
        let start: GubWarmStart = serde_json::from_str(&buffer)?;
        Ok(start)
    }
}

impl<T> GubMatrix<T>
where
    T: FloatT,
{
    pub fn warm_start(&self, model: &SimplexModel<T>) -> GubWarmStart {
        GubWarmStart {
            keys: self.sets.iter().map(|set| set.key).collect(),
            set_status: self.sets.iter().map(|set| set.status).collect(),
            column_status: model.column_status.clone(),
            row_status: model.row_status.clone(),
            pivot_variable: model.pivot_variable.clone(),
        }
    }

    /// Install a snapshot taken by [`warm_start`](Self::warm_start) on a
    /// problem of the same shape.  Nonbasic values are moved to the bounds
    /// named by their statuses, then the chains and the effective rhs are
    /// rebuilt.
    pub fn apply_warm_start(&mut self, model: &mut SimplexModel<T>, start: &GubWarmStart) -> Result<(), GubError> {
        let nsets = self.sets.len();
        if start.keys.len() != nsets
            || start.set_status.len() != nsets
            || start.column_status.len() != model.number_columns
            || start.row_status.len() != model.number_rows
            || start.pivot_variable.len() != model.number_rows
        {
            return Err(GubError::UnknownSequence);
        }
        for (s, &key) in start.keys.iter().enumerate() {
            if let Key::Member(k) = key {
                if self.set_of(k) != Some(s) {
                    return Err(GubError::NotAMember);
                }
                if !start.column_status[k].is_basic() {
                    return Err(GubError::NoBasicMember(s));
                }
            }
        }

        model.column_status.clone_from(&start.column_status);
        model.row_status.clone_from(&start.row_status);
        model.pivot_variable.clone_from(&start.pivot_variable);
        for j in 0..model.number_columns {
            model.solution[j] = match model.column_status[j] {
                Status::AtLowerBound | Status::IsFixed => model.lower[j],
                Status::AtUpperBound => model.upper[j],
                Status::IsFree => T::zero(),
                Status::Basic | Status::SuperBasic => model.solution[j],
            };
        }

        for s in 0..nsets {
            let set = &mut self.sets[s];
            set.key = start.keys[s];
            set.status = start.set_status[s];
            self.relink_set(model, s);
            let sum = self.set_sum(model, s);
            let set = &mut self.sets[s];
            set.feasibility = match set.key {
                Key::Slack => SetFeasibility::classify(sum, set.lower, set.upper, model.primal_tolerance),
                Key::Member(_) => SetFeasibility::Feasible,
            };
        }
        self.saved = None;
        self.possible_pivot_key = None;
        self.refactorization_due = true;
        self.rhs_offset(model, true);
        Ok(())
    }
}

#[test]
fn test_warm_start_json() {
    use std::io::{Seek, SeekFrom};

    let A = CscMatrix::from(&[[1., 2., 1.], [0., 1., 3.]]);
    let mut gub = GubMatrix::new(A.clone(), &[0], &[3], &[3.], &[3.], GubSettings::default()).unwrap();
    let mut model = SimplexModel::new(2, 3);
    model.cost = vec![1., 2., 3.];
    model.upper = vec![4.; 3];
    gub.use_effective_rhs(&mut model, true).unwrap();
    let start = gub.warm_start(&model);

    let mut file = tempfile::tempfile().unwrap();
    start.write_to_file(&mut file).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    let read = GubWarmStart::read_from_file(&mut file).unwrap();
    assert_eq!(read, start);

    let mut fresh = GubMatrix::new(A, &[0], &[3], &[3.], &[3.], GubSettings::default()).unwrap();
    let mut cold = SimplexModel::new(2, 3);
    cold.upper = vec![4.; 3];
    cold.solution = model.solution.clone();
    fresh.apply_warm_start(&mut cold, &read).unwrap();
    assert_eq!(fresh.key(0), gub.key(0));
    assert_eq!(fresh.members(0).collect::<Vec<_>>(), gub.members(0).collect::<Vec<_>>());
    assert_eq!(fresh.rhs(), gub.rhs());

    let mut bad = read.clone();
    bad.column_status[0] = Status::AtLowerBound;
    assert_eq!(
        fresh.apply_warm_start(&mut cold, &bad),
        Err(GubError::NoBasicMember(0))
    );
}
