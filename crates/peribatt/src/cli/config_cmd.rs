//! `config` subcommand — show or change settings.

use std::path::{Path, PathBuf};

use super::{
    ConfigAction, ConfigOutput, Result, Settings, SettingsStore, kv, kv_indent, kv_width,
    load_settings, open_settings, warn_json_unsupported,
};
use peribatt_lib::PeribattError;
use peribatt_lib::settings::{self, SettingKind, SettingValue, SettingsError};

pub(super) fn cmd_config(
    action: Option<ConfigAction>,
    json: bool,
    custom_path: Option<&Path>,
) -> Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => cmd_show(json, custom_path),
        ConfigAction::Path => {
            if json {
                warn_json_unsupported("config path");
            }
            cmd_path(custom_path)
        }
        ConfigAction::Get { key } => cmd_get(&key, json, custom_path),
        ConfigAction::Set { key, value } => {
            if json {
                warn_json_unsupported("config set");
            }
            cmd_set(&key, &value, custom_path)
        }
    }
}

fn settings_file(custom_path: Option<&Path>) -> Option<PathBuf> {
    custom_path.map(|p| p.to_path_buf()).or_else(Settings::path)
}

fn cmd_show(json: bool, custom_path: Option<&Path>) -> Result<()> {
    let settings = load_settings(custom_path);
    let config_path = settings_file(custom_path);
    let config_exists = config_path.as_ref().map(|p| p.exists()).unwrap_or(false);

    if json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:"],
        &[
            "refresh-interval:",
            "refresh-menuitem:",
            "settings-menuitem:",
            "symbolic-icons:",
            "hideempty-menuitem:",
            "hidden-devices:",
        ],
    );

    match &config_path {
        Some(p) => {
            if config_exists {
                kv("Config file:", format_args!("{} (loaded)", p.display()), w);
            } else {
                kv(
                    "Config file:",
                    format_args!("{} (not found, using defaults)", p.display()),
                    w,
                );
            }
        }
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent("refresh-interval:", settings.refresh_interval, w);
    kv_indent("refresh-menuitem:", settings.refresh_menuitem, w);
    kv_indent("settings-menuitem:", settings.settings_menuitem, w);
    kv_indent("symbolic-icons:", settings.symbolic_icons, w);
    kv_indent("hideempty-menuitem:", settings.hideempty_menuitem, w);
    let hidden = if settings.hidden_devices.is_empty() {
        "(none)".to_string()
    } else {
        settings.hidden_devices.join(", ")
    };
    kv_indent("hidden-devices:", hidden, w);
    Ok(())
}

fn cmd_path(custom_path: Option<&Path>) -> Result<()> {
    match settings_file(custom_path) {
        Some(p) => {
            println!("{}", p.display());
            Ok(())
        }
        None => Err(PeribattError::Config(
            "no settings directory on this platform".into(),
        )),
    }
}

fn cmd_get(key: &str, json: bool, custom_path: Option<&Path>) -> Result<()> {
    let store = open_settings(custom_path)?;
    let value = store.get(key)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "key": key, "value": value_json(&value) })
        );
        return Ok(());
    }
    println!("{value}");
    Ok(())
}

fn cmd_set(key: &str, raw: &str, custom_path: Option<&Path>) -> Result<()> {
    let kind = settings::schema_kind(key)
        .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
    let value = parse_value(kind, raw).ok_or_else(|| {
        PeribattError::Config(format!("`{raw}` is not a valid {} value", kind.name()))
    })?;

    let store = open_settings(custom_path)?;
    store.set(key, value)?;
    let stored = store.get(key)?;
    println!("{key} = {stored}");
    Ok(())
}

/// Parse a raw CLI string into the schema type for `kind`.
fn parse_value(kind: SettingKind, raw: &str) -> Option<SettingValue> {
    match kind {
        SettingKind::Uint => raw.parse().ok().map(SettingValue::Uint),
        SettingKind::Flag => match raw {
            "true" | "on" | "yes" | "1" => Some(SettingValue::Flag(true)),
            "false" | "off" | "no" | "0" => Some(SettingValue::Flag(false)),
            _ => None,
        },
        SettingKind::List => Some(SettingValue::List(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )),
    }
}

fn value_json(value: &SettingValue) -> serde_json::Value {
    match value {
        SettingValue::Uint(n) => (*n).into(),
        SettingValue::Flag(b) => (*b).into(),
        SettingValue::List(items) => items.iter().map(|s| s.as_str()).collect(),
    }
}
