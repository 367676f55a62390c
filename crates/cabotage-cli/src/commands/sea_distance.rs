//! `sea-distance`: offline port-pair distance lookup.

use anyhow::Result;
use clap::Args;

use cabotage_cli::output::{print_json, render_sea_distance_text, SeaDistanceReport};
use cabotage_lib::SeaDistanceProvider;

use super::{GlobalOptions, StaticData};

#[derive(Args, Debug)]
pub struct SeaDistanceArgs {
    /// Port name or alias.
    #[arg(long)]
    pub from: String,

    /// Port name or alias.
    #[arg(long)]
    pub to: String,

    /// Print JSON instead of a line of text.
    #[arg(long)]
    pub json: bool,
}

pub fn handle_sea_distance(global: &GlobalOptions, args: &SeaDistanceArgs) -> Result<()> {
    let data = StaticData::load(global, None)?;
    let from = data.catalog.lookup(&args.from)?;
    let to = data.catalog.lookup(&args.to)?;
    let distance = SeaDistanceProvider::new(&data.catalog, &data.sea_matrix).distance(from, to);
    let report = SeaDistanceReport::new(from, to, distance, data.sea_matrix.coastline_factor());

    if args.json {
        print_json(&report)?;
    } else {
        println!("{}", render_sea_distance_text(&report));
    }
    Ok(())
}
