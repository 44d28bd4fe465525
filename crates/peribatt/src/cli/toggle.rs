//! `toggle` subcommand — hide a device from the indicator, or show it again.

use std::path::Path;

use super::{Result, SettingsStore, ToggleOutput, open_settings};

pub(super) fn cmd_toggle(serial: &str, json: bool, config_path: Option<&Path>) -> Result<()> {
    let store = open_settings(config_path)?;
    let hidden = store.toggle_hidden_device(serial)?;

    if json {
        let output = ToggleOutput {
            serial: serial.to_string(),
            hidden,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    if hidden {
        println!("Device {serial} is now hidden from the indicator.");
    } else {
        println!("Device {serial} is shown again.");
    }
    Ok(())
}
