#![allow(non_snake_case)]

use tomlin::{algebra::*, factor::*};

fn data() -> CscMatrix<f64> {
    CscMatrix::from(&[
        [2., 0., 1., 1., 0.],
        [1., 3., 0., 2., 1.],
        [0., 1., 4., 1., 2.],
    ])
}

fn factorized(A: &CscMatrix<f64>, settings: FactorSettings<f64>) -> Factorization<f64> {
    let mut flags = BasisFlags::new(3, A.n);
    (0..3).for_each(|j| flags.set_column_basic(j, true));
    let mut factor = Factorization::new(settings);
    factor.factorize(A, &mut flags).unwrap();
    factor
}

fn spike(A: &CscMatrix<f64>, factor: &mut Factorization<f64>, j: usize) -> IndexedVector<f64> {
    let mut a = vec![0.; 3];
    A.col_axpy(j, 1., &mut a);
    let mut alpha = IndexedVector::from_dense(&a);
    factor.update_column_ft(&mut alpha).unwrap();
    alpha
}

fn residual(A: &CscMatrix<f64>, factor: &mut Factorization<f64>, at: &[usize]) -> f64 {
    let b = [1., -2., 3.];
    let mut x = IndexedVector::from_dense(&b);
    factor.update_column(&mut x).unwrap();
    let mut y = vec![0.; 3];
    for (p, &j) in at.iter().enumerate() {
        A.col_axpy(j, x.get(p), &mut y);
    }
    y.iter().zip(&b).map(|(a, b)| (a - b).abs()).fold(0., f64::max)
}

fn positions(factor: &Factorization<f64>) -> Vec<usize> {
    (0..3)
        .map(|p| match factor.variable_at(p) {
            Some(BasisColumn::Structural(j)) => j,
            other => panic!("unexpected basis column {other:?}"),
        })
        .collect()
}

#[test]
fn test_rejects_pivot_beyond_tolerance() {
    let A = data();
    let mut factor = factorized(&A, FactorSettings::default());
    let at = positions(&factor);
    let t = factor.row_of_column(0).unwrap();

    let alpha = spike(&A, &mut factor, 3);
    let pivot = alpha.get(t);

    // off by 1e-3 relative: well beyond 1e-5 with no updates applied
    let status = factor.replace_column(&alpha, t, pivot * (1. + 1e-3), true);
    assert_eq!(status, ReplaceStatus::Singular);
    assert_eq!(status.code(), 2);
    assert!(!status.needs_refactorization());
    assert_eq!(factor.pivots(), 0);
    assert!(residual(&A, &mut factor, &at) < 1e-12);

    // within tolerance the same spike is accepted
    let status = factor.replace_column(&alpha, t, pivot * (1. + 1e-7), true);
    assert_eq!(status, ReplaceStatus::Accurate);
    assert_eq!(factor.pivots(), 1);
}

#[test]
fn test_tolerance_tightens_with_updates() {
    let A = data();
    let mut factor = factorized(&A, FactorSettings::default());
    let mut at = positions(&factor);

    // two accurate updates: columns 3 and 4 replace columns 0 and 1
    for (leaving, entering) in [(0, 3), (1, 4)] {
        let t = at.iter().position(|&j| j == leaving).unwrap();
        let alpha = spike(&A, &mut factor, entering);
        let status = factor.replace_column(&alpha, t, alpha.get(t), true);
        assert_eq!(status, ReplaceStatus::Accurate);
        at[t] = entering;
        assert!(residual(&A, &mut factor, &at) < 1e-10);
    }
    assert!(factor.check_consistency());

    // a relative error of 5e-6 passed before any update; now it does not
    let t = at.iter().position(|&j| j == 2).unwrap();
    let alpha = spike(&A, &mut factor, 0);
    let status = factor.replace_column(&alpha, t, alpha.get(t) * (1. + 5e-6), true);
    assert_eq!(status, ReplaceStatus::Singular);
    assert_eq!(factor.pivots(), 2);
    assert!(residual(&A, &mut factor, &at) < 1e-10);
}

#[test]
fn test_product_form_updates() {
    let settings = FactorSettingsBuilder::default()
        .forrest_tomlin(false)
        .build()
        .unwrap();
    let A = data();
    let mut factor = factorized(&A, settings);
    let mut at = positions(&factor);

    let t = at.iter().position(|&j| j == 1).unwrap();
    let alpha = spike(&A, &mut factor, 4);
    assert_eq!(factor.replace_column_pfi(&alpha, t), ReplaceStatus::Accurate);
    at[t] = 4;
    assert!(residual(&A, &mut factor, &at) < 1e-10);
    assert!(factor.number_elements_r() > 0);

    // transposed solves see the update too
    let c = [1., 0., -1.];
    let mut y = IndexedVector::from_dense(&c);
    factor.update_column_transpose(&mut y).unwrap();
    for (p, &j) in at.iter().enumerate() {
        assert!((A.col_dot(j, y.dense()) - c[p]).abs() < 1e-10);
    }
}

#[test]
fn test_refactorize_after_maximum_pivots() {
    let settings = FactorSettingsBuilder::default()
        .maximum_pivots(1)
        .build()
        .unwrap();
    let A = data();
    let mut factor = factorized(&A, settings);
    let at = positions(&factor);

    let t = at.iter().position(|&j| j == 0).unwrap();
    let alpha = spike(&A, &mut factor, 3);
    assert_eq!(factor.replace_column(&alpha, t, alpha.get(t), true), ReplaceStatus::Accurate);

    let alpha = spike(&A, &mut factor, 4);
    let status = factor.replace_column(&alpha, t, alpha.get(t), true);
    assert_eq!(status, ReplaceStatus::TooManyPivots);
    assert!(status.needs_refactorization());
}
