mod common;

use cabotage_lib::ports::{HotelFactorSource, PortRole, PortSelector};
use cabotage_lib::{Error, ErrorCategory, HotelFactors, PortCatalog};

use common::{coords, fixture_catalog, fixture_hotel, recife, sao_paulo};

#[test]
fn lookup_normalizes_case_diacritics_and_aliases() {
    let catalog = fixture_catalog();
    assert_eq!(catalog.len(), 7);

    let by_alias = catalog.lookup("  porto   DO pecem ").expect("alias resolves");
    assert_eq!(by_alias.name, "Pecém (CE)");

    let by_name = catalog.lookup("itajai (sc)").expect("canonical name resolves");
    assert_eq!(by_name.id, "BRITJ");

    let by_short_alias = catalog.lookup("SANTOS").expect("short alias resolves");
    assert_eq!(by_short_alias.name, "Santos (SP)");
}

#[test]
fn port_prefix_is_optional_in_lookups() {
    let catalog = fixture_catalog();

    let salvador = catalog.lookup("Porto de Salvador (BA)").expect("prefix dropped");
    assert_eq!(salvador.id, "BRSSA");
    let itajai = catalog.lookup("PORTO DO  Itajaí (SC)").expect("prefix dropped");
    assert_eq!(itajai.id, "BRITJ");
    // Explicit aliases still win over prefix stripping.
    assert_eq!(catalog.lookup("Porto do Rio").unwrap().name, "Rio de Janeiro (RJ)");

    assert!(catalog.resolve("Porto de Atlantis").is_none());
}

#[test]
fn unknown_port_suggests_close_names() {
    let catalog = fixture_catalog();
    let err = catalog.lookup("Santoz (SP)").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InputValidation);
    match err {
        Error::UnknownPort { suggestions, .. } => {
            assert_eq!(suggestions.first().map(String::as_str), Some("Santos (SP)"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn alias_claimed_by_two_ports_is_fatal() {
    let json = r#"[
        {"name": "Santos (SP)", "lat": -23.96, "lon": -46.33, "aliases": ["Porto Central"]},
        {"name": "Guarujá (SP)", "lat": -23.99, "lon": -46.29, "aliases": ["porto central"]}
    ]"#;
    let err = PortCatalog::from_reader(json.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::AliasCollision { .. }));
    assert_eq!(err.category(), ErrorCategory::ConfigurationIntegrity);
}

#[test]
fn alias_matching_another_ports_name_is_fatal() {
    let json = r#"[
        {"name": "Santos (SP)", "lat": -23.96, "lon": -46.33},
        {"name": "Guarujá (SP)", "lat": -23.99, "lon": -46.29, "aliases": ["SANTOS (SP)"]}
    ]"#;
    assert!(matches!(
        PortCatalog::from_reader(json.as_bytes()),
        Err(Error::AliasCollision { .. })
    ));
}

#[test]
fn empty_and_duplicate_catalogs_are_rejected() {
    assert!(matches!(
        PortCatalog::from_reader("[]".as_bytes()),
        Err(Error::EmptyPortCatalog)
    ));

    let json = r#"[
        {"name": "Suape (PE)", "lat": -8.39, "lon": -34.96},
        {"name": "suape  (pe)", "lat": -8.40, "lon": -34.97}
    ]"#;
    assert!(matches!(
        PortCatalog::from_reader(json.as_bytes()),
        Err(Error::DuplicatePortName { .. })
    ));
}

#[test]
fn invalid_port_coordinates_are_rejected() {
    let json = r#"[{"name": "Nowhere", "lat": -123.0, "lon": 10.0}]"#;
    assert!(matches!(
        PortCatalog::from_reader(json.as_bytes()),
        Err(Error::PortDataValidation { .. })
    ));
}

#[test]
fn selector_uses_nearest_gate_as_anchor() {
    let catalog = fixture_catalog();
    let selector = PortSelector::new(&catalog);

    let selection = selector
        .nearest_port(&sao_paulo(), PortRole::Origin)
        .expect("a port is selected");
    assert_eq!(selection.port.name, "Santos (SP)");
    // Alemoa sits north-west of the nominal point, closer to São Paulo.
    assert_eq!(selection.gate.as_ref().map(|g| g.label.as_str()), Some("Alemoa"));
    assert!(selection.distance_km < sao_paulo().distance_km(&selection.port.coordinates));

    let suape = selector
        .nearest_port(&recife(), PortRole::Destination)
        .expect("a port is selected");
    assert_eq!(suape.port.name, "Suape (PE)");
    // The gate without coordinates was dropped at load time.
    assert_eq!(suape.port.gates.len(), 1);
}

#[test]
fn equidistant_ports_resolve_to_first_listed() {
    let json = r#"[
        {"name": "Alpha", "lat": -10.0, "lon": -36.0},
        {"name": "Bravo", "lat": -10.0, "lon": -36.0},
        {"name": "Charlie", "lat": -20.0, "lon": -40.0}
    ]"#;
    let catalog = PortCatalog::from_reader(json.as_bytes()).unwrap();
    let selector = PortSelector::new(&catalog);
    for _ in 0..5 {
        let selection = selector
            .nearest_port(&coords(-11.0, -37.0), PortRole::Origin)
            .unwrap();
        assert_eq!(selection.port.name, "Alpha");
    }
}

#[test]
fn filter_excluding_everything_reports_no_port() {
    let catalog = fixture_catalog();
    let selector = PortSelector::new(&catalog);
    let err = selector
        .nearest_port_where(&sao_paulo(), PortRole::Origin, |_| false)
        .unwrap_err();
    assert!(matches!(err, Error::NoPortAvailable { .. }));
    assert_eq!(err.category(), ErrorCategory::DataCoverage);

    let filtered = selector
        .nearest_port_where(&sao_paulo(), PortRole::Origin, |p| p.state != "SP")
        .unwrap();
    assert_ne!(filtered.port.name, "Santos (SP)");
}

#[test]
fn hotel_factors_resolve_by_port_and_city() {
    let catalog = fixture_catalog();
    let hotel = fixture_hotel(&catalog);

    let santos = catalog.lookup("Santos (SP)").unwrap();
    assert_eq!(hotel.factor_for(santos), (0.12, HotelFactorSource::Table));

    // Matched through its city, Ipojuca.
    let suape = catalog.lookup("Suape (PE)").unwrap();
    assert_eq!(hotel.factor_for(suape), (0.09, HotelFactorSource::Table));

    // Null factor in the table, so the default applies.
    let rio = catalog.lookup("Rio de Janeiro (RJ)").unwrap();
    assert_eq!(hotel.factor_for(rio), (0.0, HotelFactorSource::Default));

    let hotel = hotel.with_default(0.05).unwrap();
    assert_eq!(hotel.factor_for(rio), (0.05, HotelFactorSource::Default));
}

#[test]
fn hotel_table_with_wrong_unit_or_negative_factor_is_rejected() {
    let catalog = fixture_catalog();
    let wrong_unit = r#"{"unit": "kg_fuel_per_call", "scope": "hotel_at_berth", "entries": []}"#;
    assert!(matches!(
        HotelFactors::from_reader(wrong_unit.as_bytes(), &catalog),
        Err(Error::HotelFactorValidation { .. })
    ));

    let negative = r#"{"unit": "kg_fuel_per_tonne", "scope": "hotel_at_berth",
        "entries": [{"port": "Santos (SP)", "kg_fuel_per_t": -0.1}]}"#;
    assert!(matches!(
        HotelFactors::from_reader(negative.as_bytes(), &catalog),
        Err(Error::HotelFactorValidation { .. })
    ));
}
