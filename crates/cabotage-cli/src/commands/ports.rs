//! `ports`: list the port catalog.

use anyhow::Result;

use cabotage_cli::output::{port_listings, print_json, render_ports_text};

use super::{GlobalOptions, StaticData};

pub fn handle_ports(global: &GlobalOptions, json: bool) -> Result<()> {
    let data = StaticData::load(global, None)?;
    let listings = port_listings(&data.catalog, &data.hotel);
    if json {
        print_json(&listings)?;
    } else {
        print!("{}", render_ports_text(&listings));
    }
    Ok(())
}
