//! `status` subcommand — one fetched report, per-device, plus configuration.

use std::path::Path;

use super::{
    IndicatorJson, ReportJson, Result, Settings, StatusOutput, compute_visibility, kv, kv_indent,
    kv_width, report,
};
use peribatt_lib::render::{MenuAction, Ornament, build_frame};
use peribatt_lib::runner::{CommandRunner, SystemRunner, default_command};
use peribatt_lib::visibility::Visibility;

/// Run the report command and return its raw text. None when upower is
/// missing or exits nonzero.
fn fetch_report() -> Option<String> {
    match SystemRunner.run(&default_command()) {
        Ok(raw) => Some(raw),
        Err(e) => {
            log::warn!("{e}");
            None
        }
    }
}

/// Shown and hidden counts for a computed split.
fn counts(visibility: &Visibility<'_>) -> (usize, usize) {
    let hidden = visibility.menu.iter().filter(|slot| slot.hidden).count();
    (visibility.indicator.len(), hidden)
}

/// Print or serialize the status output.
fn print_status(raw: Option<&str>, settings: &Settings, json: bool) -> Result<()> {
    let command = default_command().join(" ");
    let records = raw.map(report::parse);
    let hidden_serials = settings.hidden_set();
    let visibility = records
        .as_ref()
        .map(|r| compute_visibility(r, &hidden_serials, settings.hideempty_menuitem));

    if json {
        let output = StatusOutput {
            version: env!("CARGO_PKG_VERSION").to_string(),
            report: records.as_ref().map(|r| ReportJson {
                command: command.clone(),
                devices: r.len(),
            }),
            indicator: visibility.as_ref().map(|v| {
                let (shown, hidden) = counts(v);
                IndicatorJson { shown, hidden }
            }),
            settings: settings.clone(),
        };
        let json_str = serde_json::to_string_pretty(&output).map_err(|e| {
            peribatt_lib::PeribattError::Config(format!("JSON serialization failed: {e}"))
        })?;
        println!("{json_str}");
        return Ok(());
    }

    // Human-readable output
    let w = kv_width(
        &["Version:", "Report:", "Indicator:"],
        &["Command:", "Devices:", "Shown:", "Hidden:", "Interval:", "Icons:"],
    );

    kv("Version:", env!("CARGO_PKG_VERSION"), w);
    println!();

    match &visibility {
        Some(v) => {
            let (shown, hidden) = counts(v);
            kv("Report:", "AVAILABLE", w);
            kv_indent("Command:", &command, w);
            kv_indent("Devices:", v.menu.len(), w);
            println!();
            kv("Indicator:", if shown == 0 { "EMPTY" } else { "SHOWING" }, w);
            kv_indent("Shown:", shown, w);
            kv_indent("Hidden:", hidden, w);
            if !v.menu.is_empty() {
                println!();
                println!("Devices:");
                let frame = build_frame(v, settings);
                for entry in &frame.entries {
                    if !matches!(entry.action, MenuAction::ToggleDevice(_)) {
                        continue;
                    }
                    let mark = match entry.ornament {
                        Ornament::Check => "  (hidden)",
                        Ornament::Dot => "  (hidden, shown anyway)",
                        _ => "",
                    };
                    println!("  {}  [{}]{mark}", entry.label, entry.icon);
                }
            }
        }
        None => {
            kv("Report:", "NOT AVAILABLE", w);
            kv_indent("Command:", &command, w);
        }
    }

    println!();
    println!("Config:");
    kv_indent("Interval:", format_args!("{}s", settings.refresh_interval), w);
    kv_indent(
        "Icons:",
        if settings.symbolic_icons {
            "symbolic"
        } else {
            "full-color"
        },
        w,
    );

    Ok(())
}

pub(super) fn cmd_status(json: bool, config_path: Option<&Path>) -> Result<()> {
    let settings = super::load_settings(config_path);
    let raw = fetch_report();
    print_status(raw.as_deref(), &settings, json)
}
