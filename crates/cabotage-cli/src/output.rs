//! Output formatting for evaluations and catalog listings.
//!
//! Text renderers return `String`s so they can be tested without capturing
//! stdout. Numbers are rounded only here: totals are shown to two decimals
//! and the displayed deltas are computed from the rounded totals, so the
//! printed rows always add up.

use std::fmt::Write as _;
use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use cabotage_lib::fuel::Metrics;
use cabotage_lib::ports::{HotelFactorSource, PortSelection};
use cabotage_lib::sea::SeaDistance;
use cabotage_lib::{
    DistanceSource, EvaluationResult, HotelFactors, Port, PortCatalog, TruckPreset,
};

use crate::terminal::{arrow, format_number, ColorPalette};

/// Decimal places used for displayed metrics.
pub const DISPLAY_DECIMALS: i32 = 2;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Rounded figures exactly as printed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayTotals {
    pub road_only: Metrics,
    pub cabotage: Metrics,
    /// `cabotage - road_only` over the rounded values.
    pub deltas: Metrics,
}

impl DisplayTotals {
    pub fn from_result(result: &EvaluationResult) -> Self {
        let road_only = result.road_only.leg.metrics().rounded(DISPLAY_DECIMALS);
        let cabotage = result.cabotage.totals.rounded(DISPLAY_DECIMALS);
        // Re-round to drop float noise from the subtraction.
        let deltas = (cabotage - road_only).rounded(DISPLAY_DECIMALS);
        Self {
            road_only,
            cabotage,
            deltas,
        }
    }
}

/// Serialize any value as pretty JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)
}

fn row(out: &mut String, label: &str, m: &Metrics, style: &str, reset: &str) {
    let _ = writeln!(
        out,
        "{}  {:<22} {:>12} {:>9} {:>11} {:>11} {:>13}{}",
        style,
        label,
        format_number(m.distance_km, 2),
        format_number(m.hours, 2),
        format_number(m.fuel_kg, 2),
        format_number(m.co2e_kg, 2),
        format_number(m.cost_brl, 2),
        reset,
    );
}

fn port_line(selection: &PortSelection, palette: &ColorPalette) -> String {
    let via = selection
        .gate
        .as_ref()
        .map(|g| format!(" via {}", g.label))
        .unwrap_or_default();
    format!(
        "{}{}{}{} ({} km from endpoint)",
        palette.cyan,
        selection.port.name,
        palette.reset,
        via,
        format_number(selection.distance_km, 1)
    )
}

/// Human-readable report for one evaluation.
pub fn render_evaluation_text(result: &EvaluationResult, palette: &ColorPalette) -> String {
    let mut out = String::new();
    let totals = DisplayTotals::from_result(result);
    let cabotage = &result.cabotage;
    let sea_label = format!(
        "sea ({})",
        cabotage
            .sea
            .provenance
            .map(|p| p.to_string())
            .unwrap_or_else(|| "matrix".to_string())
    );

    let _ = writeln!(
        out,
        "{}Road vs. cabotage: {} {} {}{} ({} t, {})",
        palette.bold,
        result.origin.label,
        arrow(),
        result.destination.label,
        palette.reset,
        format_number(result.input.cargo_t, 2),
        result.input.truck,
    );
    let _ = writeln!(
        out,
        "  origin port       {}",
        port_line(&result.selection.origin_port, palette)
    );
    let _ = writeln!(
        out,
        "  destination port  {}",
        port_line(&result.selection.destination_port, palette)
    );
    out.push('\n');

    let _ = writeln!(
        out,
        "{}  {:<22} {:>12} {:>9} {:>11} {:>11} {:>13}{}",
        palette.gray, "", "km", "hours", "fuel kg", "CO2e kg", "cost BRL", palette.reset
    );
    row(&mut out, "road only", &totals.road_only, palette.bold, palette.reset);
    row(
        &mut out,
        "origin to port",
        &cabotage.origin_to_port.leg.metrics().rounded(DISPLAY_DECIMALS),
        "",
        "",
    );
    row(
        &mut out,
        &sea_label,
        &cabotage.sea.metrics().rounded(DISPLAY_DECIMALS),
        "",
        "",
    );
    row(
        &mut out,
        "port operations",
        &cabotage.port_ops.totals.rounded(DISPLAY_DECIMALS),
        "",
        "",
    );
    row(
        &mut out,
        "port to destination",
        &cabotage.port_to_destination.leg.metrics().rounded(DISPLAY_DECIMALS),
        "",
        "",
    );
    row(&mut out, "cabotage total", &totals.cabotage, palette.bold, palette.reset);
    out.push('\n');

    let d = &totals.deltas;
    let _ = writeln!(
        out,
        "{}Delta (cabotage - road){}: {}{} kg CO2e{}, {}{} BRL{}, {} h",
        palette.bold,
        palette.reset,
        palette.for_delta(d.co2e_kg),
        format_number(d.co2e_kg, 2),
        palette.reset,
        palette.for_delta(d.cost_brl),
        format_number(d.cost_brl, 2),
        palette.reset,
        format_number(d.hours, 2),
    );

    for note in notes(result) {
        let _ = writeln!(out, "{}note:{} {}", palette.yellow, palette.reset, note);
    }
    out
}

/// Fallbacks worth pointing out next to the numbers.
fn notes(result: &EvaluationResult) -> Vec<String> {
    let mut notes = Vec::new();
    let cabotage = &result.cabotage;
    if cabotage.sea.provenance == Some(DistanceSource::Haversine) {
        notes.push(format!(
            "{} {} {} is not in the sea matrix; distance estimated from great-circle",
            result.selection.origin_port.port.name,
            arrow(),
            result.selection.destination_port.port.name
        ));
    }
    for hotel in [
        &cabotage.port_ops.hotel_origin,
        &cabotage.port_ops.hotel_destination,
    ] {
        if hotel.hotel_factor_source == HotelFactorSource::Default {
            notes.push(format!(
                "no hotel factor for {}; used default {} kg/t",
                hotel.port, hotel.kg_fuel_per_t
            ));
        }
    }
    let used = &result.selection.profiles_used;
    for (leg, route) in [
        ("road only", &used.road_only),
        ("origin to port", &used.origin_to_port),
        ("port to destination", &used.port_to_destination),
    ] {
        if route.profile != result.input.profile {
            notes.push(format!("{leg} leg routed with {}", route.profile));
        }
    }
    notes
}

/// JSON document for one evaluation: the full result plus the rounded
/// figures shown in text mode.
#[derive(Debug, Serialize)]
pub struct EvaluationReport<'a> {
    #[serde(flatten)]
    pub result: &'a EvaluationResult,
    pub display: DisplayTotals,
}

impl<'a> EvaluationReport<'a> {
    pub fn new(result: &'a EvaluationResult) -> Self {
        Self {
            result,
            display: DisplayTotals::from_result(result),
        }
    }
}

/// One-line summary used by the batch command.
pub fn render_batch_line(result: &EvaluationResult, palette: &ColorPalette) -> String {
    let totals = DisplayTotals::from_result(result);
    format!(
        "{} {} {}: {} {} {} | road {} kg CO2e, cabotage {} kg CO2e, delta {}{}{} kg / {}{}{} BRL",
        result.origin.label,
        arrow(),
        result.destination.label,
        result.selection.origin_port.port.name,
        arrow(),
        result.selection.destination_port.port.name,
        format_number(totals.road_only.co2e_kg, 2),
        format_number(totals.cabotage.co2e_kg, 2),
        palette.for_delta(totals.deltas.co2e_kg),
        format_number(totals.deltas.co2e_kg, 2),
        palette.reset,
        palette.for_delta(totals.deltas.cost_brl),
        format_number(totals.deltas.cost_brl, 2),
        palette.reset,
    )
}

/// Port listing row for JSON output.
#[derive(Debug, Serialize)]
pub struct PortListing<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub lat: f64,
    pub lon: f64,
    pub gates: Vec<&'a str>,
    pub aliases: &'a [String],
    pub hotel_kg_fuel_per_t: f64,
    pub hotel_factor_source: HotelFactorSource,
}

pub fn port_listings<'a>(catalog: &'a PortCatalog, hotel: &HotelFactors) -> Vec<PortListing<'a>> {
    catalog
        .ports()
        .iter()
        .map(|port: &'a Port| {
            let (factor, source) = hotel.factor_for(port);
            PortListing {
                id: &port.id,
                name: &port.name,
                city: &port.city,
                state: &port.state,
                lat: port.coordinates.lat,
                lon: port.coordinates.lon,
                gates: port.gates.iter().map(|g| g.label.as_str()).collect(),
                aliases: &port.aliases,
                hotel_kg_fuel_per_t: factor,
                hotel_factor_source: source,
            }
        })
        .collect()
}

pub fn render_ports_text(listings: &[PortListing<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Ports ({}):", listings.len());
    let _ = writeln!(
        out,
        "{:<8} {:<22} {:<5} {:>10} {:>10} {:>10}  {}",
        "Id", "Name", "UF", "Lat", "Lon", "Hotel kg/t", "Gates"
    );
    for p in listings {
        let hotel = match p.hotel_factor_source {
            HotelFactorSource::Table => format!("{:.2}", p.hotel_kg_fuel_per_t),
            HotelFactorSource::Default => format!("{:.2}*", p.hotel_kg_fuel_per_t),
        };
        let gates = if p.gates.is_empty() {
            "-".to_string()
        } else {
            p.gates.join(", ")
        };
        let _ = writeln!(
            out,
            "{:<8} {:<22} {:<5} {:>10.4} {:>10.4} {:>10}  {}",
            p.id, p.name, p.state, p.lat, p.lon, hotel, gates
        );
    }
    if listings
        .iter()
        .any(|p| p.hotel_factor_source == HotelFactorSource::Default)
    {
        let _ = writeln!(out, "* default hotel factor (port not in hotel table)");
    }
    out
}

pub fn render_trucks_text(presets: &[TruckPreset]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Truck presets ({}):", presets.len());
    let _ = writeln!(
        out,
        "{:<18} {:>6} {:>10} {:>10} {:>12} {:>12}",
        "Name", "Axles", "Payload t", "km/L", "km/L empty", "Empty gain"
    );
    for preset in presets {
        let loaded = preset
            .km_per_l_loaded()
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|_| "n/a".to_string());
        let empty = preset
            .km_per_l_empty()
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|_| "n/a".to_string());
        let _ = writeln!(
            out,
            "{:<18} {:>6} {:>10.1} {:>10} {:>12} {:>11.0}%",
            preset.name,
            preset.axles,
            preset.payload_t,
            loaded,
            empty,
            preset.empty_efficiency_gain * 100.0
        );
    }
    out
}

/// Sea distance query result for JSON output.
#[derive(Debug, Serialize)]
pub struct SeaDistanceReport<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub distance_km: f64,
    pub source: DistanceSource,
    pub coastline_factor: f64,
}

pub fn render_sea_distance_text(report: &SeaDistanceReport<'_>) -> String {
    let mut line = format!(
        "{} {} {}: {} km ({})",
        report.from,
        arrow(),
        report.to,
        format_number(report.distance_km, 2),
        report.source
    );
    if report.source == DistanceSource::Haversine {
        let _ = write!(
            line,
            " great-circle x {:.2} coastline factor",
            report.coastline_factor
        );
    }
    line
}

impl<'a> SeaDistanceReport<'a> {
    pub fn new(from: &'a Port, to: &'a Port, distance: SeaDistance, coastline_factor: f64) -> Self {
        Self {
            from: &from.name,
            to: &to.name,
            distance_km: distance.distance_km,
            source: distance.source,
            coastline_factor,
        }
    }
}
