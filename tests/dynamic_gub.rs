#![allow(non_snake_case)]

use std::collections::HashSet;
use tomlin::{algebra::*, gub::*};

// one row, no static columns; a pool of `n` unit columns in a single set
// with costs -1, -2, ...
fn generator(n: usize, window: usize) -> (DynamicGubMatrix<f64>, SimplexModel<f64>) {
    let columns = CscMatrix::from_columns(1, &vec![vec![(0, 1.0)]; n]);
    let cost = (1..=n).map(|k| -(k as f64)).collect();
    let pool = GubColumnPool::new(columns, cost, vec![0, n]).unwrap();
    let settings = GubSettingsBuilder::default().window_size(window).build().unwrap();
    let matrix = CscMatrix::empty(1);
    let dynamic = DynamicGubMatrix::new(matrix, &[0], &[0], &[0.], &[f64::MAX], pool, settings).unwrap();
    let model = SimplexModel::new(1, dynamic.number_columns());
    (dynamic, model)
}

// every committed slot holds a distinct pool column
fn assert_window_consistent(dynamic: &DynamicGubMatrix<f64>, model: &SimplexModel<f64>) {
    let live: Vec<usize> = (dynamic.first_dynamic()..dynamic.first_available())
        .map(|slot| dynamic.id(slot).expect("committed slot without a column"))
        .collect();
    let unique: HashSet<usize> = live.iter().copied().collect();
    assert_eq!(unique.len(), live.len());
    for &p in &live {
        assert_eq!(dynamic.dynamic_status(p), DynamicStatus::InSmall);
    }
    for seq in &model.pivot_variable {
        if let Sequence::Structural(slot) = *seq {
            assert!(dynamic.id(slot).is_some());
        }
    }
}

// enter `best` on row 0 in place of the current basic variable
fn pivot_in(dynamic: &mut DynamicGubMatrix<f64>, model: &mut SimplexModel<f64>, best: Sequence) {
    let leaving = model.pivot_variable[0];
    model.sequence_in = Some(best);
    model.sequence_out = Some(leaving);
    model.pivot_row = Some(PivotRow::Row(0));
    model.set_status(best, Status::Basic);
    model.set_status(leaving, Status::AtLowerBound);
    dynamic.update_pivot(model, 0., 0.).unwrap();
}

#[test]
fn test_window_compacts_under_generation() {
    let (mut dynamic, mut model) = generator(7, 5);
    let mut winners = HashSet::new();

    for _ in 0..7 {
        let best = dynamic.partial_pricing(&mut model, 0., 1., 7).unwrap().unwrap();
        let Sequence::Structural(slot) = best.sequence else {
            panic!("expected a generated column, got {:?}", best.sequence);
        };
        assert!(winners.insert(dynamic.id(slot).unwrap()));

        pivot_in(&mut dynamic, &mut model, best.sequence);
        dynamic.synchronize(&mut model, SyncMode::Flag).unwrap();

        assert!(dynamic.live_slots() <= 5);
        assert_window_consistent(&dynamic, &model);
    }

    assert_eq!(winners.len(), 7);
    assert!(dynamic.compactions() >= 1);
    assert_eq!(winners, (0..7).collect());
}

#[test]
fn test_generated_ids_are_unique() {
    let (mut dynamic, mut model) = generator(4, 3);
    for _ in 0..4 {
        let best = dynamic.partial_pricing(&mut model, 0., 1., 4).unwrap().unwrap();
        pivot_in(&mut dynamic, &mut model, best.sequence);
        dynamic.synchronize(&mut model, SyncMode::Flag).unwrap();
        dynamic.synchronize(&mut model, SyncMode::Rebuild).unwrap();
        assert_window_consistent(&dynamic, &model);

        // only the basic column survives a rebuild
        assert_eq!(dynamic.live_slots(), 1);
    }
    assert_eq!(dynamic.compactions(), 4);
}

#[test]
fn test_restore_drops_later_columns() {
    let (mut dynamic, mut model) = generator(3, 3);
    dynamic.synchronize(&mut model, SyncMode::Rebuild).unwrap();

    let best = dynamic.partial_pricing(&mut model, 0., 1., 3).unwrap().unwrap();
    pivot_in(&mut dynamic, &mut model, best.sequence);
    assert_eq!(dynamic.live_slots(), 1);

    // the driver puts its statuses back, then asks the layer to follow
    model.row_status[0] = Status::Basic;
    dynamic.synchronize(&mut model, SyncMode::Restore).unwrap();
    assert_eq!(dynamic.live_slots(), 0);
    assert_eq!(dynamic.id(0), None);
    assert_eq!(dynamic.dynamic_status(2), DynamicStatus::AtLowerBound);
    assert_eq!(model.pivot_variable, vec![Sequence::RowSlack(0)]);
    assert_window_consistent(&dynamic, &model);
}

#[test]
fn test_pool_dual_infeasibilities() {
    let (mut dynamic, mut model) = generator(3, 3);
    let outcome = dynamic.synchronize(&mut model, SyncMode::DualInfeasibilities).unwrap();
    let SyncOutcome::DualInfeasibilities(infeasibilities) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    // every pool column at its lower bound has a negative reduced cost
    assert_eq!(infeasibilities.count, 3);
    assert!((infeasibilities.sum - (6. - 3e-7)).abs() < 1e-9);

    // a dual of -3 prices all of them out
    model.duals = vec![-3.];
    let outcome = dynamic.synchronize(&mut model, SyncMode::DualInfeasibilities).unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::DualInfeasibilities(DualInfeasibilities::default())
    );
    assert_eq!(dynamic.partial_pricing(&mut model, 0., 1., 3).unwrap(), None);
    assert_eq!(
        dynamic.synchronize(&mut model, SyncMode::RefactorCheck).unwrap(),
        SyncOutcome::Refactorize(false)
    );
}
