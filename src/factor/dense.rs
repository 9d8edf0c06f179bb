use super::markowitz::{ActiveMatrix, Elimination, PivotStep};
use crate::algebra::FloatT;

const NONE: usize = usize::MAX;

/// Finish the elimination on a dense copy of the active submatrix.
///
/// Columns are taken in their current order with partial pivoting over
/// the remaining rows.  A column whose largest remaining entry is below
/// `zero_tolerance` is reported singular.
pub(crate) fn eliminate_dense<T>(active: &mut ActiveMatrix<T>, zero_tolerance: T, out: &mut Elimination<T>)
where
    T: FloatT,
{
    let rows = active.active_rows();
    let cols = active.active_cols();
    let (nr, nc) = (rows.len(), cols.len());
    out.dense_size = nc;

    let mut local = vec![NONE; active.nrows()];
    for (i, &r) in rows.iter().enumerate() {
        local[r] = i;
    }

    // column major, nr x nc
    let mut a = vec![T::zero(); nr * nc];
    for (j, &k) in cols.iter().enumerate() {
        for (r, v) in active.col_entries(k) {
            a[j * nr + local[r]] = v;
        }
    }

    let mut pivoted = vec![false; nr];
    for j in 0..nc {
        let colj = &a[j * nr..(j + 1) * nr];
        let mut p = NONE;
        let mut pmax = T::zero();
        for i in 0..nr {
            if !pivoted[i] && colj[i].abs() > pmax {
                pmax = colj[i].abs();
                p = i;
            }
        }
        if p == NONE || pmax < zero_tolerance {
            active.retire_col(cols[j]);
            out.singular_columns.push(cols[j]);
            continue;
        }

        let piv = colj[p];
        pivoted[p] = true;
        let lower: Vec<(usize, T)> = (0..nr)
            .filter(|&i| !pivoted[i] && colj[i].abs() >= zero_tolerance)
            .map(|i| (i, colj[i] / piv))
            .collect();

        let mut upper = Vec::new();
        for jj in (j + 1)..nc {
            let u = a[jj * nr + p];
            if u.abs() < zero_tolerance {
                continue;
            }
            upper.push((cols[jj], u));
            for &(i, l) in &lower {
                a[jj * nr + i] -= l * u;
            }
        }

        active.retire_col(cols[j]);
        active.retire_row(rows[p]);
        out.steps.push(PivotStep {
            row: rows[p],
            col: cols[j],
            diag: piv,
            lower: lower.into_iter().map(|(i, l)| (rows[i], l)).collect(),
            upper,
        });
    }
}
