//! `evaluate`: one shipment, road only versus cabotage.

use anyhow::{Context, Result};
use clap::Args;

use cabotage_cli::output::{print_json, render_evaluation_text, EvaluationReport, OutputFormat};
use cabotage_cli::terminal::ColorPalette;
use cabotage_lib::{Error as LibError, Location};

use super::{GlobalOptions, ParamArgs, StaticData};

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Origin: an address, a city, a CEP or "lat,lon".
    #[arg(long, allow_hyphen_values = true)]
    pub origin: Location,

    /// Destination: an address, a city, a CEP or "lat,lon".
    #[arg(long, allow_hyphen_values = true)]
    pub destination: Location,

    #[command(flatten)]
    pub params: ParamArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn handle_evaluate(global: &GlobalOptions, args: &EvaluateArgs) -> Result<()> {
    // Input checks come before any data loading or network setup.
    ensure_cargo(args.params.cargo_t)?;

    let data = StaticData::load(global, args.params.default_hotel_factor)?;
    let params = args.params.to_params(data.diesel_prices.as_ref())?;
    let evaluator = data.evaluator(global, &params, args.params.require_sea_coverage)?;

    let result = evaluator
        .evaluate(&args.origin, &args.destination, args.params.cargo_t, &params)
        .with_context(|| {
            format!(
                "evaluation failed for {} -> {}",
                args.origin, args.destination
            )
        })?;

    match args.format {
        OutputFormat::Json => print_json(&EvaluationReport::new(&result))?,
        OutputFormat::Text => print!("{}", render_evaluation_text(&result, &ColorPalette::detect())),
    }
    Ok(())
}

pub(crate) fn ensure_cargo(cargo_t: f64) -> Result<()> {
    if !cargo_t.is_finite() || cargo_t <= 0.0 {
        return Err(LibError::InvalidCargoMass { cargo_t }.into());
    }
    Ok(())
}
