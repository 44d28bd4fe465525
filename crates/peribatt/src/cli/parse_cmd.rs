//! `parse` subcommand — parse a saved report and list its devices.
//!
//! Takes the output of `upower -d` captured to a file (or piped on stdin)
//! and shows what the indicator would make of it.

use std::io::Read;
use std::path::Path;

use super::{Result, devices, load_settings, report};

pub(super) fn cmd_parse(file: Option<&Path>, json: bool, config_path: Option<&Path>) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let records = report::parse(&raw);
    let settings = load_settings(config_path);
    devices::print_records(&records, &settings, json)
}
