mod common;

use std::sync::Arc;

use cabotage_lib::fuel::Metrics;
use cabotage_lib::ports::HotelFactorSource;
use cabotage_lib::routing::RouteStrategy;
use cabotage_lib::{
    DistanceSource, Error, EvaluationParams, Location, RouteCache, RouteProfile, SqliteRouteCache,
};

use common::{
    evaluator, fortaleza, joinville, recife, sao_paulo, Behavior, FakeBackend, FakeResolver,
};

fn memory_cache() -> Arc<dyn RouteCache> {
    Arc::new(SqliteRouteCache::open_in_memory(None).unwrap())
}

fn text(s: &str) -> Location {
    Location::Text(s.to_string())
}

#[test]
fn sao_paulo_to_recife_goes_through_santos_and_suape() {
    let backend = FakeBackend::new(Behavior::Ok);
    let eval = evaluator(backend, FakeResolver::new(), memory_cache());

    let result = eval
        .evaluate(
            &text("São Paulo, SP"),
            &text("Recife, PE"),
            26.0,
            &EvaluationParams::default(),
        )
        .unwrap();

    assert_eq!(result.selection.origin_port.port.name, "Santos (SP)");
    assert_eq!(result.selection.destination_port.port.name, "Suape (PE)");
    assert_eq!(result.cabotage.sea.distance_km, 2300.0);
    assert_eq!(result.cabotage.sea.provenance, Some(DistanceSource::Matrix));
    assert_eq!(
        result.cabotage.port_ops.hotel_origin.hotel_factor_source,
        HotelFactorSource::Table
    );

    let used = result.selection.profiles_used;
    assert_eq!(used.road_only.profile, RouteProfile::DrivingHgv);
    assert_eq!(used.origin_to_port.strategy, RouteStrategy::Direct);
    assert_eq!(result.road_only.leg.profile.as_deref(), Some("driving-hgv"));
    assert_eq!(result.input.truck, "semi_27t");
}

#[test]
fn totals_and_deltas_are_exact_sums() {
    let eval = evaluator(FakeBackend::new(Behavior::Ok), FakeResolver::new(), memory_cache());
    let result = eval
        .evaluate(
            &text("São Paulo, SP"),
            &text("Fortaleza, CE"),
            40.0,
            &EvaluationParams::default(),
        )
        .unwrap();

    let c = &result.cabotage;
    let expected = Metrics::sum([
        c.origin_to_port.leg.metrics(),
        c.sea.metrics(),
        c.port_ops.totals,
        c.port_to_destination.leg.metrics(),
    ]);
    assert_eq!(c.totals, expected);
    assert_eq!(result.deltas, c.totals - result.road_only.leg.metrics());

    // Two trips for 40 t on a 27 t semi, on every road leg.
    assert_eq!(result.road_only.fuel.trips, 2);
    assert_eq!(c.origin_to_port.fuel.trips, 2);
    assert!(c.totals.hours >= c.sea.hours + 24.0);
}

#[test]
fn warm_cache_reproduces_result_without_external_calls() {
    let backend = FakeBackend::new(Behavior::Ok);
    let resolver = FakeResolver::new();
    let eval = evaluator(backend.clone(), resolver.clone(), memory_cache());
    let params = EvaluationParams::default();

    let first = eval
        .evaluate(&text("São Paulo, SP"), &text("Recife, PE"), 26.0, &params)
        .unwrap();
    let directions = backend.directions_calls();
    let geocodes = resolver.geocode_calls();
    assert_eq!(directions, 3);
    assert_eq!(geocodes, 2);

    let second = eval
        .evaluate(&text("São Paulo, SP"), &text("Recife, PE"), 26.0, &params)
        .unwrap();
    assert_eq!(backend.directions_calls(), directions);
    assert_eq!(resolver.geocode_calls(), geocodes);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn warm_cache_is_bit_identical_across_destinations() {
    let backend = FakeBackend::new(Behavior::Ok);
    let eval = evaluator(backend.clone(), FakeResolver::new(), memory_cache());
    let params = EvaluationParams::default();
    let origin = Location::Coordinates(sao_paulo());

    for destination in [recife(), fortaleza(), joinville()] {
        let destination = Location::Coordinates(destination);
        let cold = eval.evaluate(&origin, &destination, 26.0, &params).unwrap();
        let calls = backend.directions_calls();
        let warm = eval.evaluate(&origin, &destination, 26.0, &params).unwrap();
        assert_eq!(backend.directions_calls(), calls);
        assert_eq!(cold, warm, "{destination}");
        assert_eq!(
            serde_json::to_value(&cold).unwrap(),
            serde_json::to_value(&warm).unwrap()
        );
    }
}

#[test]
fn oversized_cargo_is_rejected_before_routing() {
    let backend = FakeBackend::new(Behavior::Ok);
    let resolver = FakeResolver::new();
    let eval = evaluator(backend.clone(), resolver.clone(), memory_cache());

    let err = eval
        .evaluate(
            &text("São Paulo, SP"),
            &text("Recife, PE"),
            1e13,
            &EvaluationParams::default(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "cargo_t"));
    assert_eq!(err.category(), cabotage_lib::ErrorCategory::InputValidation);
    assert_eq!(backend.directions_calls(), 0);
    assert_eq!(resolver.geocode_calls(), 0);
}

#[test]
fn postal_code_origin_is_resolved_and_cached() {
    let backend = FakeBackend::new(Behavior::Ok);
    let resolver = FakeResolver::new();
    let eval = evaluator(backend.clone(), resolver.clone(), memory_cache());
    let params = EvaluationParams::default();

    let origin: Location = "01310-200".parse().unwrap();
    let first = eval
        .evaluate(&origin, &text("Recife, PE"), 26.0, &params)
        .unwrap();
    assert_eq!(first.input.origin, "cep:01310200");
    assert_eq!(first.selection.origin_port.port.name, "Santos (SP)");

    let second = eval
        .evaluate(&"01310200".parse().unwrap(), &text("Recife, PE"), 26.0, &params)
        .unwrap();
    assert_eq!(resolver.geocode_calls(), 2);
    assert_eq!(first, second);
}

#[test]
fn unresolved_address_fails_before_routing() {
    let backend = FakeBackend::new(Behavior::Ok);
    let eval = evaluator(backend.clone(), FakeResolver::new(), memory_cache());

    let err = eval
        .evaluate(
            &text("São Paulo, SP"),
            &text("Atlantis"),
            10.0,
            &EvaluationParams::default(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::UnresolvedAddress { .. }));
    assert_eq!(backend.directions_calls(), 0);
}

#[test]
fn invalid_inputs_make_no_external_calls() {
    let backend = FakeBackend::new(Behavior::Ok);
    let resolver = FakeResolver::new();
    let eval = evaluator(backend.clone(), resolver.clone(), memory_cache());

    let err = eval
        .evaluate(
            &text("São Paulo, SP"),
            &text("Recife, PE"),
            -3.0,
            &EvaluationParams::default(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCargoMass { .. }));

    let params = EvaluationParams {
        truck: "semi_72t".to_string(),
        ..EvaluationParams::default()
    };
    let err = eval
        .evaluate(&text("São Paulo, SP"), &text("Recife, PE"), 10.0, &params)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownTruckPreset { .. }));

    let params = EvaluationParams {
        empty_backhaul_share: 2.0,
        ..EvaluationParams::default()
    };
    assert!(eval
        .evaluate(&text("São Paulo, SP"), &text("Recife, PE"), 10.0, &params)
        .is_err());

    assert_eq!(resolver.geocode_calls(), 0);
    assert_eq!(backend.directions_calls(), 0);
}

#[test]
fn routing_failure_fails_the_whole_evaluation() {
    let eval = evaluator(
        FakeBackend::new(Behavior::RateLimited),
        FakeResolver::new(),
        memory_cache(),
    );
    let err = eval
        .evaluate(
            &text("São Paulo, SP"),
            &text("Recife, PE"),
            10.0,
            &EvaluationParams::default(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::RateLimited { .. }));
}

#[test]
fn sea_coverage_requirement_skips_unlisted_ports() {
    let manaus = Location::Coordinates(common::coords(-3.10, -60.02));

    let eval = evaluator(FakeBackend::new(Behavior::Ok), FakeResolver::new(), memory_cache());
    let open = eval
        .evaluate(&text("São Paulo, SP"), &manaus, 10.0, &EvaluationParams::default())
        .unwrap();
    assert_eq!(open.selection.destination_port.port.name, "Manaus (AM)");
    assert_eq!(open.cabotage.sea.provenance, Some(DistanceSource::Haversine));
    assert_eq!(
        open.cabotage.port_ops.hotel_destination.hotel_factor_source,
        HotelFactorSource::Default
    );

    let strict = eval.require_sea_coverage(true);
    let covered = strict
        .evaluate(&text("São Paulo, SP"), &manaus, 10.0, &EvaluationParams::default())
        .unwrap();
    assert_ne!(covered.selection.destination_port.port.name, "Manaus (AM)");
    assert_eq!(covered.cabotage.sea.provenance, Some(DistanceSource::Matrix));
}

#[test]
fn bulk_evaluation_preserves_input_order() {
    let backend = FakeBackend::new(Behavior::Ok);
    let resolver = FakeResolver::new();
    let eval = evaluator(backend, resolver.clone(), memory_cache());

    let destinations = vec![
        text("Recife, PE"),
        text("Fortaleza, CE"),
        text("Atlantis"),
        text("Joinville, SC"),
    ];
    let results = eval.evaluate_many(
        &text("São Paulo, SP"),
        &destinations,
        26.0,
        &EvaluationParams::default(),
    );

    assert_eq!(results.len(), 4);
    let port_of = |i: usize| {
        results[i]
            .as_ref()
            .map(|r| r.selection.destination_port.port.name.clone())
            .unwrap()
    };
    assert_eq!(port_of(0), "Suape (PE)");
    assert_eq!(port_of(1), "Pecém (CE)");
    assert!(matches!(results[2], Err(Error::UnresolvedAddress { .. })));
    assert_eq!(port_of(3), "Itajaí (SC)");
}
