//! `devices` subcommand — list batteries reported by UPower.

use std::path::Path;

use super::{
    DeviceRecord, DevicesOutput, NO_PERCENT, PADDING, Result, Settings, report, resolve_icon,
};
use peribatt_lib::runner::{CommandRunner, SystemRunner, default_command};

pub(super) fn cmd_devices(json: bool, config_path: Option<&Path>) -> Result<()> {
    let settings = super::load_settings(config_path);
    let raw = SystemRunner.run(&default_command())?;
    let records = report::parse(&raw);
    print_records(&records, &settings, json)
}

/// Listing shared by `devices` and `parse`.
pub(super) fn print_records(
    records: &[DeviceRecord],
    settings: &Settings,
    json: bool,
) -> Result<()> {
    if json {
        let output = DevicesOutput {
            count: records.len(),
            devices: records.to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    if records.is_empty() {
        println!("No battery devices found.");
        return Ok(());
    }

    let hidden = settings.hidden_set();
    println!(
        "Found {} battery device{}:",
        records.len(),
        if records.len() == 1 { "" } else { "s" }
    );
    println!();

    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let marker = if hidden.contains(&record.serial) {
            "  (hidden)"
        } else {
            ""
        };
        println!("  [{}] {}{marker}", i + 1, record.model);
        println!("      Serial: {}", record.serial);
        if !record.kind.is_empty() {
            println!("      Kind:   {}", record.kind);
        }
        println!("      State:  {}", record.state_label());
        let mut charge = record
            .percent_label()
            .unwrap_or_else(|| NO_PERCENT.to_string());
        if !record.percentage_reliable() {
            charge.push_str(" (unreliable)");
        }
        println!("      Charge: {charge}");
        println!(
            "      Icon:   {}",
            resolve_icon(record, settings.symbolic_icons)
        );
        // Remaining parsed properties, as reported
        let width = record
            .extra
            .keys()
            .map(|k| k.len() + 1 + PADDING)
            .max()
            .unwrap_or(0);
        for (key, value) in &record.extra {
            let label = format!("{key}:");
            println!("        {label:<width$}{value}");
        }
    }

    Ok(())
}
