//! CLI subcommands — battery reports, the watch loop, settings control.

mod config_cmd;
mod devices;
mod parse_cmd;
mod status;
mod toggle;
mod watch;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use peribatt_lib::error::Result;
pub(super) use peribatt_lib::icon::resolve_icon;
pub(super) use peribatt_lib::render::NO_PERCENT;
pub(super) use peribatt_lib::report::{self, DeviceRecord};
pub(super) use peribatt_lib::settings::{FileSettings, Settings, SettingsStore};
pub(super) use peribatt_lib::visibility::compute_visibility;

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output: at least
/// PADDING spaces after the longest key at either level, with top-level and
/// indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    // Indent keys carry a "  " prefix that eats into the inner width
    let top = top.iter().map(|k| k.len() + PADDING).max().unwrap_or(0);
    let indent = indent.iter().map(|k| k.len() + PADDING + 2).max().unwrap_or(0);
    top.max(indent)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{key:<width$}{value}", width = w);
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Open the settings store, logging load-time warnings.
pub(super) fn open_settings(custom_path: Option<&Path>) -> Result<FileSettings> {
    let (store, warnings) = FileSettings::open(custom_path)?;
    for w in &warnings {
        log::warn!("{w}");
    }
    Ok(store)
}

/// Settings snapshot for read-only commands. Falls back to defaults when no
/// store can be opened, so display commands keep working.
pub(super) fn load_settings(custom_path: Option<&Path>) -> Settings {
    match FileSettings::open(custom_path) {
        Ok((store, warnings)) => {
            for w in &warnings {
                log::warn!("{w}");
            }
            store.snapshot()
        }
        Err(e) => {
            log::warn!("could not open settings: {e}");
            Settings::default()
        }
    }
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct StatusOutput {
    pub version: String,
    pub report: Option<ReportJson>,
    pub indicator: Option<IndicatorJson>,
    pub settings: Settings,
}

#[derive(Serialize)]
pub(super) struct ReportJson {
    pub command: String,
    pub devices: usize,
}

#[derive(Serialize)]
pub(super) struct IndicatorJson {
    pub shown: usize,
    pub hidden: usize,
}

#[derive(Serialize)]
pub(super) struct DevicesOutput {
    pub count: usize,
    pub devices: Vec<DeviceRecord>,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Settings,
}

#[derive(Serialize)]
pub(super) struct ToggleOutput {
    pub serial: String,
    pub hidden: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show battery report availability and configuration overview
    Status,

    /// List batteries reported by UPower
    Devices,

    /// Parse a saved report file and list its devices (stdin when omitted)
    Parse {
        /// Report file to read
        file: Option<PathBuf>,
    },

    /// Watch batteries continuously, refreshing on the configured interval
    Watch {
        /// Read the report from a file instead of running upower
        #[arg(long, value_name = "PATH")]
        from_file: Option<PathBuf>,

        /// Run one refresh cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Hide a device from the indicator, or show it again
    Toggle {
        /// Device serial, as shown by `devices`
        serial: String,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current settings and the file they come from
    Show,
    /// Print the settings file path
    Path,
    /// Print one setting
    Get { key: String },
    /// Change one setting
    Set { key: String, value: String },
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, json: bool, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        Command::Status => status::cmd_status(json, config_path),
        Command::Devices => devices::cmd_devices(json, config_path),
        Command::Parse { file } => parse_cmd::cmd_parse(file.as_deref(), json, config_path),
        Command::Watch { from_file, once } => {
            watch::cmd_watch(from_file.as_deref(), once, json, config_path)
        }
        Command::Toggle { serial } => toggle::cmd_toggle(&serial, json, config_path),
        Command::Config { action } => config_cmd::cmd_config(action, json, config_path),
    }
}
