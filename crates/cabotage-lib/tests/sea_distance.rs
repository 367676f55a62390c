mod common;

use cabotage_lib::geo::haversine_km;
use cabotage_lib::{DistanceSource, Error, SeaDistanceProvider, SeaMatrix};

use common::{fixture_catalog, fixture_matrix};

#[test]
fn listed_pairs_come_from_matrix_in_both_directions() {
    let catalog = fixture_catalog();
    let matrix = fixture_matrix(&catalog);
    let provider = SeaDistanceProvider::new(&catalog, &matrix);

    let forward = provider.distance_between("Santos (SP)", "Suape (PE)").unwrap();
    let backward = provider.distance_between("Suape (PE)", "Santos (SP)").unwrap();
    assert_eq!(forward.distance_km, 2300.0);
    assert_eq!(forward.source, DistanceSource::Matrix);
    assert_eq!(forward, backward);
}

#[test]
fn entries_given_by_alias_are_canonicalized() {
    let catalog = fixture_catalog();
    let matrix = fixture_matrix(&catalog);
    let provider = SeaDistanceProvider::new(&catalog, &matrix);

    let d = provider.distance_between("pecem (ce)", "SUAPE (PE)").unwrap();
    assert_eq!(d.distance_km, 750.0);
    assert_eq!(d.source, DistanceSource::Matrix);

    let entry = matrix.get("Pecém (CE)", "Suape (PE)").expect("listed pair");
    assert_eq!(entry.source.as_deref(), Some("manual survey"));
}

#[test]
fn duplicate_entry_with_same_distance_is_accepted() {
    let catalog = fixture_catalog();
    let matrix = fixture_matrix(&catalog);
    // 8 nested pairs plus Pecém-Suape; the repeated Suape-Salvador pair adds nothing.
    assert_eq!(matrix.len(), 9);
    assert_eq!(matrix.coastline_factor(), 1.15);
}

#[test]
fn missing_pair_falls_back_to_scaled_great_circle() {
    let catalog = fixture_catalog();
    let matrix = fixture_matrix(&catalog);
    let provider = SeaDistanceProvider::new(&catalog, &matrix);

    let itajai = catalog.lookup("Itajaí (SC)").unwrap();
    let pecem = catalog.lookup("Pecém (CE)").unwrap();
    let d = provider.distance(itajai, pecem);
    let expected = haversine_km(&itajai.coordinates, &pecem.coordinates) * 1.15;
    assert_eq!(d.source, DistanceSource::Haversine);
    assert!((d.distance_km - expected).abs() < 1e-9);
    assert_eq!(d, provider.distance(pecem, itajai));
}

#[test]
fn port_absent_from_matrix_always_falls_back() {
    let catalog = fixture_catalog();
    let matrix = fixture_matrix(&catalog);
    let provider = SeaDistanceProvider::new(&catalog, &matrix);

    let manaus = catalog.lookup("Manaus (AM)").unwrap();
    assert!(!matrix.covers(manaus));
    for other in catalog.ports().iter().filter(|p| p.name != manaus.name) {
        assert_eq!(provider.distance(manaus, other).source, DistanceSource::Haversine);
    }
    assert!(matrix.covers(catalog.lookup("Santos (SP)").unwrap()));
}

#[test]
fn same_port_is_zero() {
    let catalog = fixture_catalog();
    let matrix = fixture_matrix(&catalog);
    let provider = SeaDistanceProvider::new(&catalog, &matrix);

    let d = provider.distance_between("Porto de Santos", "santos").unwrap();
    assert_eq!(d.distance_km, 0.0);
    assert_eq!(d.source, DistanceSource::Matrix);
}

#[test]
fn unknown_label_is_reported() {
    let catalog = fixture_catalog();
    let matrix = fixture_matrix(&catalog);
    let provider = SeaDistanceProvider::new(&catalog, &matrix);

    assert!(matches!(
        provider.distance_between("Santos (SP)", "Atlantis"),
        Err(Error::UnknownPort { .. })
    ));
}

#[test]
fn conflicting_or_invalid_entries_are_rejected() {
    let catalog = fixture_catalog();

    let conflict = r#"{"matrix": {"Santos (SP)": {"Rio de Janeiro (RJ)": 370.0}},
        "entries": [{"a": "Porto do Rio", "b": "Porto de Santos", "km": 400.0}]}"#;
    assert!(matches!(
        SeaMatrix::from_reader(conflict.as_bytes(), &catalog),
        Err(Error::SeaMatrixValidation { .. })
    ));

    let negative = r#"{"entries": [{"a": "Santos (SP)", "b": "Suape (PE)", "km": -1.0}]}"#;
    assert!(SeaMatrix::from_reader(negative.as_bytes(), &catalog).is_err());

    let self_pair = r#"{"entries": [{"a": "Santos (SP)", "b": "Porto de Santos", "km": 12.0}]}"#;
    assert!(SeaMatrix::from_reader(self_pair.as_bytes(), &catalog).is_err());

    let bad_factor = r#"{"coastline_factor": 0.0}"#;
    assert!(SeaMatrix::from_reader(bad_factor.as_bytes(), &catalog).is_err());
}

#[test]
fn empty_matrix_uses_default_coastline_factor() {
    let catalog = fixture_catalog();
    let matrix = SeaMatrix::from_reader("{}".as_bytes(), &catalog).unwrap();
    assert!(matrix.is_empty());
    assert_eq!(matrix.coastline_factor(), 1.15);

    let provider = SeaDistanceProvider::new(&catalog, &matrix);
    let d = provider.distance_between("Santos (SP)", "Rio de Janeiro (RJ)").unwrap();
    assert_eq!(d.source, DistanceSource::Haversine);
}
