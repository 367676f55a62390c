//! `trucks`: list the built-in truck presets.

use anyhow::Result;

use cabotage_cli::output::render_trucks_text;
use cabotage_lib::TruckPreset;

pub fn handle_trucks() -> Result<()> {
    print!("{}", render_trucks_text(TruckPreset::all()));
    Ok(())
}
