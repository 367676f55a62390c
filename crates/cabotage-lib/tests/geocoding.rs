use std::collections::HashMap;

use parking_lot::Mutex;

use cabotage_lib::routing::geocode::{
    geocode_text, resolve_postal_code, GeocodeHit, GeocodeSearch, PostalAddress, PostalDirectory,
};
use cabotage_lib::routing::{AddressResolver, Geocoder, GeocodingResolver};
use cabotage_lib::{Cep, Error, Location, Point, Result};

/// Scripted provider that records every search it receives.
#[derive(Default)]
struct ScriptedSearch {
    structured: HashMap<String, Vec<GeocodeHit>>,
    text: HashMap<String, Vec<GeocodeHit>>,
    rate_limited: bool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    fn structured(mut self, postal_code: &str, hits: Vec<GeocodeHit>) -> Self {
        self.structured.insert(postal_code.to_string(), hits);
        self
    }

    fn text(mut self, query: &str, hits: Vec<GeocodeHit>) -> Self {
        self.text.insert(query.to_string(), hits);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl GeocodeSearch for ScriptedSearch {
    fn search_text(&self, text: &str) -> Result<Vec<GeocodeHit>> {
        self.calls.lock().push(format!("text:{text}"));
        if self.rate_limited {
            return Err(Error::RateLimited {
                retry_after_secs: Some(1),
            });
        }
        Ok(self.text.get(text).cloned().unwrap_or_default())
    }

    fn search_postal_code(&self, postal_code: &str) -> Result<Vec<GeocodeHit>> {
        self.calls.lock().push(format!("postal:{postal_code}"));
        if self.rate_limited {
            return Err(Error::RateLimited {
                retry_after_secs: Some(1),
            });
        }
        Ok(self.structured.get(postal_code).cloned().unwrap_or_default())
    }
}

enum Directory {
    Knows(PostalAddress),
    Unknown,
    Broken,
}

impl PostalDirectory for Directory {
    fn lookup(&self, _cep: &Cep) -> Result<Option<PostalAddress>> {
        match self {
            Directory::Knows(address) => Ok(Some(address.clone())),
            Directory::Unknown => Ok(None),
            Directory::Broken => Err(Error::RoutingProvider {
                status: Some(503),
                message: "unavailable".to_string(),
            }),
        }
    }
}

/// Geocoder wired like the OpenRouteService client.
struct ScriptedGeocoder {
    search: ScriptedSearch,
    directory: Option<Directory>,
}

impl Geocoder for ScriptedGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<Point>> {
        geocode_text(&self.search, query)
    }

    fn geocode_postal_code(&self, cep: &Cep) -> Result<Option<Point>> {
        let directory = self.directory.as_ref().map(|d| d as &dyn PostalDirectory);
        resolve_postal_code(&self.search, directory, cep)
    }
}

fn cep(text: &str) -> Cep {
    Cep::parse(text).expect("valid CEP")
}

fn country_hit() -> GeocodeHit {
    GeocodeHit::new(-10.0, -55.0, Some("Brasil".into()), "country")
}

fn paulista_hit(layer: &str) -> GeocodeHit {
    GeocodeHit::new(-23.5614, -46.6559, Some("01310-200, São Paulo, SP".into()), layer)
}

#[test]
fn structured_search_on_digits_resolves_first() {
    let search = ScriptedSearch::default().structured("01310200", vec![paulista_hit("postalcode")]);

    let point = resolve_postal_code(&search, None, &cep("01310-200"))
        .unwrap()
        .expect("resolved");
    assert_eq!(point.label, "01310-200, São Paulo, SP");
    assert_eq!(search.calls(), ["postal:01310200"]);
}

#[test]
fn ladder_falls_through_to_hyphenated_then_text() {
    let search = ScriptedSearch::default()
        .structured("01310200", vec![country_hit()])
        .structured("01310-200", vec![paulista_hit("venue")])
        .text("01310-200", vec![paulista_hit("street"), paulista_hit("postcode")]);

    let point = resolve_postal_code(&search, None, &cep("01310200"))
        .unwrap()
        .expect("resolved");
    assert_eq!(point.coordinates.lat, -23.5614);
    assert_eq!(
        search.calls(),
        ["postal:01310200", "postal:01310-200", "text:01310-200"]
    );
}

#[test]
fn directory_address_is_geocoded_as_last_resort() {
    let address = PostalAddress {
        street: "Avenida Paulista".into(),
        neighbourhood: "Bela Vista".into(),
        city: "São Paulo".into(),
        uf: "SP".into(),
    };
    let search = ScriptedSearch::default().text(
        "Avenida Paulista, Bela Vista, São Paulo, SP",
        vec![country_hit(), paulista_hit("street")],
    );

    let point = resolve_postal_code(&search, Some(&Directory::Knows(address)), &cep("01310-200"))
        .unwrap()
        .expect("resolved");
    assert_eq!(point.coordinates.lon, -46.6559);
    assert_eq!(search.calls().len(), 4);
}

#[test]
fn unknown_or_failing_directory_leaves_postal_code_unresolved() {
    for directory in [Directory::Unknown, Directory::Broken] {
        let geocoder = ScriptedGeocoder {
            search: ScriptedSearch::default(),
            directory: Some(directory),
        };
        let resolver = GeocodingResolver::new(geocoder);
        let err = resolver.resolve(&"99999-999".parse().unwrap()).unwrap_err();
        assert!(
            matches!(&err, Error::UnresolvedAddress { query } if query == "CEP 99999-999"),
            "{err}"
        );
    }
}

#[test]
fn provider_errors_propagate_from_postal_search() {
    let search = ScriptedSearch {
        rate_limited: true,
        ..ScriptedSearch::default()
    };
    let err = resolve_postal_code(&search, None, &cep("01310-200")).unwrap_err();
    assert!(matches!(err, Error::RateLimited { .. }));
    assert_eq!(search.calls().len(), 1);
}

#[test]
fn vague_query_landing_on_country_centroid_is_unresolved() {
    let geocoder = ScriptedGeocoder {
        search: ScriptedSearch::default().text(
            "somewhere in brazil",
            vec![
                country_hit(),
                GeocodeHit::new(-10.2, -54.8, Some("Brasil".into()), "locality"),
            ],
        ),
        directory: None,
    };
    let resolver = GeocodingResolver::new(geocoder);

    let err = resolver
        .resolve(&Location::Text("somewhere in brazil".into()))
        .unwrap_err();
    assert!(matches!(err, Error::UnresolvedAddress { .. }));
}

#[test]
fn text_geocoding_skips_rejected_hits() {
    let search = ScriptedSearch::default().text(
        "Recife, PE",
        vec![
            country_hit(),
            GeocodeHit::new(-8.05, -34.88, None, "locality"),
        ],
    );
    let point = geocode_text(&search, "Recife, PE").unwrap().expect("resolved");
    assert_eq!(point.label, "Recife, PE");
    assert_eq!(point.coordinates.lat, -8.05);
}
