//! Device report parser — `upower -d` text into structured device records.
//!
//! The report is a sequence of blocks separated by blank lines. A block
//! describing a battery-powered peripheral starts with a `Device:` line and
//! carries `key: value` properties, one of which is `serial:`; the device
//! kind appears as a bare, colon-free line among the properties. Blocks
//! without a `Device:` header or without a serial (the daemon trailer, the
//! aggregate display device) are skipped silently. Parsing never fails:
//! malformed text degrades to best-effort records.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

/// One property value from a report block.
///
/// The literal tokens `yes`/`no` are coerced to flags; everything else is
/// kept as the trimmed string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropValue {
    Flag(bool),
    Text(String),
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Flag(b) => write!(f, "{b}"),
            PropValue::Text(t) => f.write_str(t),
        }
    }
}

/// One parsed device block.
///
/// `serial` is the stable identity key; [`parse`] guarantees it is non-empty
/// and unique across the returned set. Well-known properties land in the
/// named fields as raw trimmed strings; everything else goes to `extra` with
/// its key normalized (whitespace and hyphens become underscores).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceRecord {
    /// Device kind ("mouse", "keyboard", ...), captured from the bare
    /// colon-free line in the block. Free text; later lines win.
    #[serde(rename = "type")]
    pub kind: String,
    pub model: String,
    pub serial: String,
    /// Charge state ("charging", "discharging", ...); empty when absent.
    pub state: String,
    /// Raw textual percentage. May carry trailing annotations, and the
    /// substring "ignored" marks the reading as unreliable.
    pub percentage: String,
    /// Vendor-supplied fallback icon identifier, surrounding quotes stripped.
    pub icon_name: String,
    pub extra: BTreeMap<String, PropValue>,
}

impl DeviceRecord {
    /// False iff the percentage reading is marked "ignored" by the source.
    pub fn percentage_reliable(&self) -> bool {
        !self.percentage.contains("ignored")
    }

    /// Leading integer of the raw percentage rendered as `"{n}%"`, or `None`
    /// when the value has no leading integer ("ignored", empty, free text).
    pub fn percent_label(&self) -> Option<String> {
        let digits: String = self
            .percentage
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse::<u32>().ok().map(|n| format!("{n}%"))
    }

    pub fn is_charging(&self) -> bool {
        self.state == "charging"
    }

    /// Charge state for display; "unknown" when the report omitted it.
    pub fn state_label(&self) -> &str {
        if self.state.is_empty() {
            "unknown"
        } else {
            &self.state
        }
    }

    fn assign(&mut self, key: &str, value: &str) {
        match key {
            "type" => self.kind = value.to_string(),
            "model" => self.model = value.to_string(),
            "serial" => self.serial = value.to_string(),
            "state" => self.state = value.to_string(),
            "percentage" => self.percentage = value.to_string(),
            "icon_name" => self.icon_name = strip_surrounding_quotes(value).to_string(),
            _ => {
                self.extra.insert(key.to_string(), coerce_value(value));
            }
        }
    }
}

/// Parse a full device report into records, in input order.
///
/// Keeps only blocks whose first non-blank line is a `Device:` header and
/// whose properties yield a non-empty serial; a block repeating an earlier
/// serial is dropped (first occurrence wins). `parse("")` is empty.
pub fn parse(raw: &str) -> Vec<DeviceRecord> {
    let mut records = Vec::new();
    let mut seen = BTreeSet::new();

    for block in raw.split("\n\n") {
        let Some(record) = parse_block(block) else {
            continue;
        };
        if record.serial.is_empty() || !seen.insert(record.serial.clone()) {
            continue;
        }
        records.push(record);
    }

    records
}

fn parse_block(block: &str) -> Option<DeviceRecord> {
    let first = block.lines().find(|line| !line.trim().is_empty())?;
    if !first.trim_start().starts_with("Device:") {
        return None;
    }

    let mut record = DeviceRecord::default();
    for line in block.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match split_property(line) {
            Some((key, value)) => record.assign(&key, value),
            // No key before a colon: this is the bare device-kind line
            // (or a history row — later lines win, model matching in the
            // icon resolver compensates).
            None => record.kind = line.trim().to_string(),
        }
    }
    Some(record)
}

/// Split a `key: value` line; the key is everything before the first colon.
/// Returns `None` for lines without a colon or with an empty key.
fn split_property(line: &str) -> Option<(String, &str)> {
    let (raw_key, value) = line.split_once(':')?;
    let key = raw_key.trim();
    if key.is_empty() {
        return None;
    }
    Some((normalize_key(key), value.trim()))
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect()
}

fn coerce_value(value: &str) -> PropValue {
    match value {
        "no" => PropValue::Flag(false),
        "yes" => PropValue::Flag(true),
        _ => PropValue::Text(value.to_string()),
    }
}

fn strip_surrounding_quotes(value: &str) -> &str {
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUSE_BLOCK: &str = "\
Device: /org/freedesktop/UPower/devices/mouse_hidpp_battery_0
  native-path:          hidpp_battery_0
  model:                MX Master 3
  serial:               4069-6f-a1-0b-c2
  power supply:         no
  updated:              Thu 26 Jan 2023 10:21:10 AM (23 seconds ago)
  has history:          yes
  mouse
    present:             yes
    state:               discharging
    percentage:          55% (should be ignored)
    icon-name:           'battery-missing-symbolic'";

    const KEYBOARD_BLOCK: &str = "\
Device: /org/freedesktop/UPower/devices/keyboard_hidpp_battery_1
  model:                K380 Keyboard
  serial:               f4-73-35-9a-00
  keyboard
    state:               charging
    percentage:          72%
    icon-name:           'battery-full-charging-symbolic'";

    const DAEMON_BLOCK: &str = "\
Daemon:
  daemon-version:  0.99.17
  on-battery:      no";

    const DISPLAY_BLOCK: &str = "\
Device: /org/freedesktop/UPower/devices/DisplayDevice
  power supply:         yes
  battery
    state:               fully-charged
    percentage:          100%";

    fn sample() -> String {
        format!("{MOUSE_BLOCK}\n\n{KEYBOARD_BLOCK}\n\n{DISPLAY_BLOCK}\n\n{DAEMON_BLOCK}\n")
    }

    // ── block selection ──

    #[test]
    fn empty_input_yields_no_records() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn whitespace_only_input_yields_no_records() {
        assert!(parse("\n\n\n  \n\n").is_empty());
    }

    #[test]
    fn keeps_device_blocks_with_serial_in_order() {
        let records = parse(&sample());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].serial, "4069-6f-a1-0b-c2");
        assert_eq!(records[1].serial, "f4-73-35-9a-00");
    }

    #[test]
    fn daemon_trailer_is_dropped() {
        let records = parse(&format!("{DAEMON_BLOCK}\n\n{MOUSE_BLOCK}"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model, "MX Master 3");
    }

    #[test]
    fn display_device_without_serial_is_dropped() {
        let records = parse(DISPLAY_BLOCK);
        assert!(records.is_empty());
    }

    #[test]
    fn block_without_device_header_is_dropped() {
        let block = "Monitor: something\n  serial: abc\n  state: charging";
        assert!(parse(block).is_empty());
    }

    #[test]
    fn header_after_leading_blank_lines_still_matches() {
        let block = format!("\n  \n{MOUSE_BLOCK}");
        let records = parse(&block);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_serial_value_is_dropped() {
        let block = "Device: /x\n  serial:\n  model: Ghost";
        assert!(parse(block).is_empty());
    }

    #[test]
    fn duplicate_serial_keeps_first_block() {
        let twin = MOUSE_BLOCK.replace("MX Master 3", "Impostor");
        let records = parse(&format!("{MOUSE_BLOCK}\n\n{twin}"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model, "MX Master 3");
    }

    // ── property folding ──

    #[test]
    fn well_known_fields_are_extracted() {
        let records = parse(MOUSE_BLOCK);
        let r = &records[0];
        assert_eq!(r.kind, "mouse");
        assert_eq!(r.model, "MX Master 3");
        assert_eq!(r.state, "discharging");
        assert_eq!(r.percentage, "55% (should be ignored)");
        assert_eq!(r.icon_name, "battery-missing-symbolic");
    }

    #[test]
    fn bare_line_becomes_kind() {
        let records = parse("Device: /x\n  serial: s1\n  touchpad\n  state: charging");
        assert_eq!(records[0].kind, "touchpad");
    }

    #[test]
    fn last_bare_line_wins_for_kind() {
        let records = parse("Device: /x\n  serial: s1\n  mouse\n  1674727270\t55.000\tdischarging");
        assert_eq!(records[0].kind, "1674727270\t55.000\tdischarging");
    }

    #[test]
    fn duplicate_key_last_occurrence_wins() {
        let records = parse("Device: /x\n  serial: s1\n  model: First\n  model: Second");
        assert_eq!(records[0].model, "Second");
    }

    #[test]
    fn keys_are_normalized_to_underscores() {
        let records = parse(MOUSE_BLOCK);
        let r = &records[0];
        assert_eq!(r.extra.get("power_supply"), Some(&PropValue::Flag(false)));
        assert_eq!(r.extra.get("has_history"), Some(&PropValue::Flag(true)));
        assert!(r.extra.contains_key("native_path"));
    }

    #[test]
    fn key_case_is_preserved() {
        let records = parse(MOUSE_BLOCK);
        assert_eq!(
            records[0].extra.get("Device"),
            Some(&PropValue::Text(
                "/org/freedesktop/UPower/devices/mouse_hidpp_battery_0".into()
            ))
        );
    }

    #[test]
    fn yes_no_values_become_flags() {
        let records = parse("Device: /x\n  serial: s1\n  present: yes\n  rechargeable: no");
        let r = &records[0];
        assert_eq!(r.extra.get("present"), Some(&PropValue::Flag(true)));
        assert_eq!(r.extra.get("rechargeable"), Some(&PropValue::Flag(false)));
    }

    #[test]
    fn other_values_are_kept_as_trimmed_text() {
        let records = parse("Device: /x\n  serial: s1\n  warning-level:    none   ");
        assert_eq!(
            records[0].extra.get("warning_level"),
            Some(&PropValue::Text("none".into()))
        );
    }

    #[test]
    fn value_may_contain_colons() {
        let records =
            parse("Device: /x\n  serial: s1\n  updated: Thu 10:21:10 AM (23 seconds ago)");
        assert_eq!(
            records[0].extra.get("updated"),
            Some(&PropValue::Text("Thu 10:21:10 AM (23 seconds ago)".into()))
        );
    }

    #[test]
    fn colonless_key_line_is_treated_as_kind() {
        // A line starting with a colon has no key, so it falls back to the
        // bare-line rule.
        let records = parse("Device: /x\n  serial: s1\n  : stray");
        assert_eq!(records[0].kind, ": stray");
    }

    // ── icon name quoting ──

    #[test]
    fn icon_name_quotes_are_stripped() {
        let records = parse("Device: /x\n  serial: s1\n  icon-name: 'battery-good-symbolic'");
        assert_eq!(records[0].icon_name, "battery-good-symbolic");
    }

    #[test]
    fn unquoted_icon_name_is_preserved() {
        let records = parse("Device: /x\n  serial: s1\n  icon-name: battery-good");
        assert_eq!(records[0].icon_name, "battery-good");
    }

    #[test]
    fn lone_quote_is_not_stripped() {
        let records = parse("Device: /x\n  serial: s1\n  icon-name: 'battery-good");
        assert_eq!(records[0].icon_name, "'battery-good");
    }

    // ── display accessors ──

    #[test]
    fn percent_label_parses_leading_integer() {
        let records = parse(&sample());
        assert_eq!(records[0].percent_label(), Some("55%".into()));
        assert_eq!(records[1].percent_label(), Some("72%".into()));
    }

    #[test]
    fn percent_label_none_without_leading_integer() {
        let mut r = DeviceRecord {
            percentage: "ignored".into(),
            ..DeviceRecord::default()
        };
        assert_eq!(r.percent_label(), None);
        r.percentage = String::new();
        assert_eq!(r.percent_label(), None);
    }

    #[test]
    fn annotated_percentage_is_unreliable() {
        let records = parse(&sample());
        assert!(!records[0].percentage_reliable());
        assert!(records[1].percentage_reliable());
    }

    #[test]
    fn charging_state_detection() {
        let records = parse(&sample());
        assert!(!records[0].is_charging());
        assert!(records[1].is_charging());
    }

    #[test]
    fn state_label_defaults_to_unknown() {
        let records = parse("Device: /x\n  serial: s1\n  model: Mystery");
        assert_eq!(records[0].state_label(), "unknown");
        assert_eq!(records[0].state, "");
    }

    #[test]
    fn prop_value_displays_flags_and_text() {
        assert_eq!(PropValue::Flag(true).to_string(), "true");
        assert_eq!(PropValue::Flag(false).to_string(), "false");
        assert_eq!(PropValue::Text("1.5 Wh".into()).to_string(), "1.5 Wh");
    }

    // ── serialization ──

    #[test]
    fn record_serializes_with_type_field() {
        let records = parse(MOUSE_BLOCK);
        let json = serde_json::to_string(&records[0]).expect("serialize DeviceRecord");
        assert!(json.contains("\"type\":\"mouse\""));
        assert!(json.contains("\"serial\":\"4069-6f-a1-0b-c2\""));
        // yes/no coercion shows through as JSON booleans
        assert!(json.contains("\"power_supply\":false"));
        assert!(json.contains("\"has_history\":true"));
    }
}
