#![allow(non_snake_case)]

use tomlin::{algebra::*, factor::*};

fn factorize_all(A: &CscMatrix<f64>, settings: FactorSettings<f64>) -> Factorization<f64> {
    let mut flags = BasisFlags::new(A.m, A.n);
    (0..A.n).for_each(|j| flags.set_column_basic(j, true));
    let mut factor = Factorization::new(settings);
    factor.factorize(A, &mut flags).unwrap();
    factor
}

// structural column held at every pivot row
fn columns_by_row(factor: &Factorization<f64>) -> Vec<usize> {
    (0..factor.number_rows())
        .map(|p| match factor.variable_at(p) {
            Some(BasisColumn::Structural(j)) => j,
            other => panic!("unexpected basis column {other:?}"),
        })
        .collect()
}

fn test_basis() -> CscMatrix<f64> {
    CscMatrix::from(&[
        [4., 0., 1., 0., 0., 0.],
        [1., 3., 0., 0., 2., 0.],
        [0., 1., 5., 1., 0., 0.],
        [2., 0., 0., 6., 1., 1.],
        [0., 0., 1., 0., 2., 0.],
        [0., 1., 0., 0., 0., 3.],
    ])
}

#[test]
fn test_lower_triangular_inverse_column() {
    // identity with a 2 at row 1, column 0
    let A = CscMatrix::from(&[[1., 0., 0.], [2., 1., 0.], [0., 0., 1.]]);
    let mut factor = factorize_all(&A, FactorSettings::default());

    let mut x = IndexedVector::unit(3, 0);
    factor.update_column(&mut x).unwrap();

    let at = |j: usize| x.get(factor.row_of_column(j).unwrap());
    assert_eq!(at(0), 1.);
    assert_eq!(at(1), -2.);
    assert_eq!(at(2), 0.);
}

#[test]
fn test_unit_solves_give_inverse_columns() {
    let A = test_basis();
    let n = A.n;
    for strategy in [SolveStrategy::Dense, SolveStrategy::SemiSparse, SolveStrategy::Sparse] {
        let settings = FactorSettingsBuilder::default()
            .solve_strategy(strategy)
            .build()
            .unwrap();
        let mut factor = factorize_all(&A, settings);
        let by_row = columns_by_row(&factor);

        for i in 0..n {
            let mut x = IndexedVector::unit(n, i);
            factor.update_column(&mut x).unwrap();

            // B x must reproduce e_i
            let mut y = vec![0.; n];
            for p in 0..n {
                A.col_axpy(by_row[p], x.get(p), &mut y);
            }
            for (k, &v) in y.iter().enumerate() {
                let expected = if k == i { 1. } else { 0. };
                assert!((v - expected).abs() < 1e-12, "strategy {strategy:?}, e_{i}");
            }
        }
    }
}

#[test]
fn test_transpose_solve() {
    let A = test_basis();
    let n = A.n;
    let mut factor = factorize_all(&A, FactorSettings::default());
    let by_row = columns_by_row(&factor);

    // Bᵀ y = c, with c indexed by pivot row
    let c = [1., -1., 2., 0., 3., 1.];
    let mut y = IndexedVector::from_dense(&c);
    factor.update_column_transpose(&mut y).unwrap();
    for p in 0..n {
        let dot = A.col_dot(by_row[p], y.dense());
        assert!((dot - c[p]).abs() < 1e-12);
    }
}

#[test]
fn test_dense_fallback_matches_sparse() {
    let A = test_basis();
    let dense = FactorSettingsBuilder::default()
        .dense_minimum_size(2)
        .dense_threshold(0.0)
        .build()
        .unwrap();
    let sparse = FactorSettingsBuilder::default()
        .dense_enable(false)
        .build()
        .unwrap();

    let mut with_dense = factorize_all(&A, dense);
    let mut without = factorize_all(&A, sparse);
    assert!(with_dense.dense_size() > 0);
    assert_eq!(without.dense_size(), 0);

    let b = [1., 2., 3., 4., 5., 6.];
    let mut x1 = IndexedVector::from_dense(&b);
    let mut x2 = IndexedVector::from_dense(&b);
    with_dense.update_column(&mut x1).unwrap();
    without.update_column(&mut x2).unwrap();

    let r1 = columns_by_row(&with_dense);
    let r2 = columns_by_row(&without);
    for j in 0..A.n {
        let p1 = r1.iter().position(|&c| c == j).unwrap();
        let p2 = r2.iter().position(|&c| c == j).unwrap();
        assert!((x1.get(p1) - x2.get(p2)).abs() < 1e-10);
    }
}

#[test]
fn test_singular_basis_is_repaired_with_slacks() {
    // column 2 is the sum of columns 0 and 1
    let A = CscMatrix::from(&[[1., 0., 1.], [0., 1., 1.], [0., 0., 0.]]);
    let mut flags = BasisFlags::new(3, 3);
    (0..3).for_each(|j| flags.set_column_basic(j, true));
    let mut factor = Factorization::<f64>::new(FactorSettings::default());

    let err = factor.factorize(&A, &mut flags).unwrap_err();
    assert_eq!(err, FactorError::Singular { rank: 2, deficiency: 1 });
    assert_eq!(err.status_code(), -1);
    assert_eq!(flags.columns.iter().filter(|m| **m == BasisMark::Singular).count(), 1);
    assert_eq!(factor.unpivoted_rows(), &[2]);

    let rows = factor.unpivoted_rows().to_vec();
    assert_eq!(flags.make_non_singular(&rows), 1);
    factor.factorize(&A, &mut flags).unwrap();
    assert!(factor.is_ready());
    assert!(factor.row_of_slack(2).is_some());
}

#[test]
fn test_too_many_columns() {
    let A = CscMatrix::<f64>::identity(2);
    let mut flags = BasisFlags::slack_basis(2, 2);
    flags.set_column_basic(0, true);
    let mut factor = Factorization::<f64>::new(FactorSettings::default());
    let err = factor.factorize(&A, &mut flags).unwrap_err();
    assert_eq!(err, FactorError::TooManyColumns);
    assert_eq!(err.status_code(), -2);

    let mut x = IndexedVector::new(2);
    assert_eq!(factor.update_column(&mut x), Err(FactorError::NotFactorized));
}
