mod common;

use std::sync::Arc;

use cabotage_lib::{EvaluationParams, Location, ResultStore, SqliteRouteCache};
use tempfile::tempdir;

use common::{evaluator, Behavior, FakeBackend, FakeResolver};

#[test]
fn stored_evaluation_can_be_read_back_and_replaced() {
    let eval = evaluator(
        FakeBackend::new(Behavior::Ok),
        FakeResolver::new(),
        Arc::new(SqliteRouteCache::open_in_memory(None).unwrap()),
    );
    let result = eval
        .evaluate(
            &Location::Text("São Paulo, SP".to_string()),
            &Location::Text("Recife, PE".to_string()),
            26.0,
            &EvaluationParams::default(),
        )
        .unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("results/evaluations.sqlite");
    {
        let store = ResultStore::open(&path).unwrap();
        assert!(store.is_empty().unwrap());
        store.upsert(&result).unwrap();
        store.upsert(&result).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    let store = ResultStore::open(&path).unwrap();
    let stored = store
        .get(
            &result.input.origin,
            &result.input.destination,
            26.0,
            "semi_27t",
        )
        .unwrap()
        .expect("stored row");
    assert_eq!(
        stored.selection.destination_port.port.name,
        result.selection.destination_port.port.name
    );
    assert!((stored.deltas.co2e_kg - result.deltas.co2e_kg).abs() < 1e-6);

    assert!(store
        .get(&result.input.origin, &result.input.destination, 27.0, "semi_27t")
        .unwrap()
        .is_none());
}
