//! Cabotage CLI library.
//!
//! Rendering, terminal detection and logging setup shared by the `cabotage`
//! binary's subcommands.

pub mod logging;
pub mod output;
pub mod terminal;
