//! `batch`: one origin against a file of destinations.
//!
//! The destinations file holds one location per line. Blank lines and lines
//! starting with `#` are skipped. Evaluations run in parallel and share the
//! route cache; each destination succeeds or fails on its own.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use cabotage_cli::output::{print_json, render_batch_line, EvaluationReport, OutputFormat};
use cabotage_cli::terminal::ColorPalette;
use cabotage_lib::{Location, ResultStore};

use super::evaluate::ensure_cargo;
use super::{GlobalOptions, ParamArgs, StaticData};

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Origin shared by every evaluation.
    #[arg(long, allow_hyphen_values = true)]
    pub origin: Location,

    /// File with one destination (address, CEP or "lat,lon") per line.
    #[arg(long)]
    pub destinations_file: PathBuf,

    #[command(flatten)]
    pub params: ParamArgs,

    /// Store successful evaluations in this SQLite file.
    #[arg(long)]
    pub results_db: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<EvaluationReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Parse a destinations file.
pub fn read_destinations(path: &Path) -> Result<Vec<Location>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read destinations from {}", path.display()))?;
    contents
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(idx, line)| {
            line.parse::<Location>()
                .with_context(|| format!("{}:{}: invalid destination", path.display(), idx + 1))
        })
        .collect()
}

pub fn handle_batch(global: &GlobalOptions, args: &BatchArgs) -> Result<()> {
    ensure_cargo(args.params.cargo_t)?;
    let destinations = read_destinations(&args.destinations_file)?;
    if destinations.is_empty() {
        bail!(
            "no destinations found in {}",
            args.destinations_file.display()
        );
    }

    let data = StaticData::load(global, args.params.default_hotel_factor)?;
    let params = args.params.to_params(data.diesel_prices.as_ref())?;
    let evaluator = data.evaluator(global, &params, args.params.require_sea_coverage)?;
    let store = args
        .results_db
        .as_deref()
        .map(|path| {
            ResultStore::open(path)
                .with_context(|| format!("failed to open results database {}", path.display()))
        })
        .transpose()?;

    let results = evaluator.evaluate_many(&args.origin, &destinations, args.params.cargo_t, &params);

    let mut failures = 0usize;
    for (destination, result) in destinations.iter().zip(&results) {
        match result {
            Ok(result) => {
                if let Some(store) = &store {
                    store.upsert(result)?;
                }
            }
            Err(err) => {
                failures += 1;
                warn!(destination = %destination, error = %err, "evaluation failed");
            }
        }
    }

    match args.format {
        OutputFormat::Json => {
            let entries: Vec<BatchEntry<'_>> = destinations
                .iter()
                .zip(&results)
                .map(|(destination, result)| BatchEntry {
                    destination: destination.to_string(),
                    result: result.as_ref().ok().map(EvaluationReport::new),
                    error: result.as_ref().err().map(ToString::to_string),
                })
                .collect();
            print_json(&entries)?;
        }
        OutputFormat::Text => {
            let palette = ColorPalette::detect();
            for (destination, result) in destinations.iter().zip(&results) {
                match result {
                    Ok(result) => println!("{}", render_batch_line(result, &palette)),
                    Err(err) => println!(
                        "{}{}: failed: {}{}",
                        palette.red, destination, err, palette.reset
                    ),
                }
            }
        }
    }

    info!(
        total = destinations.len(),
        failures,
        stored = store.is_some(),
        "batch complete"
    );
    if failures > 0 {
        bail!("{failures} of {} evaluations failed", destinations.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destinations_file_skips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("destinations.txt");
        fs::write(
            &path,
            "# coastal capitals\nRecife, PE\n\n  -3.7319, -38.5267  \n",
        )
        .unwrap();

        let destinations = read_destinations(&path).unwrap();
        assert_eq!(destinations.len(), 2);
        assert_eq!(destinations[0], Location::Text("Recife, PE".to_string()));
        assert!(matches!(destinations[1], Location::Coordinates(_)));
    }

    #[test]
    fn out_of_range_coordinates_are_reported_with_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("destinations.txt");
        fs::write(&path, "Recife, PE\n95.0,10.0\n").unwrap();

        let err = read_destinations(&path).unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }
}
