//! Icon resolution — maps a device record to a panel icon identifier.
//!
//! Model-name matches take priority over the declared kind because the kind
//! line is free text and easily clobbered (history rows, localized dumps).
//! The kind table stores base icon names; the record's own `icon_name`
//! fallback arrives pre-suffixed (or not) from the source. The symbolic
//! suffix handling is therefore asymmetric and deliberately kept that way.

use crate::report::DeviceRecord;

/// Suffix of the monochrome panel icon variants.
pub const SYMBOLIC_SUFFIX: &str = "-symbolic";

const ICON_GAMING: &str = "input-gaming";
const ICON_KEYBOARD: &str = "input-keyboard";
const ICON_MOUSE: &str = "input-mouse";
const ICON_TABLET: &str = "input-tablet";

/// Model-name signature of PS Move style controllers, which report a generic
/// kind but identify themselves in the model field.
const MOTION_CONTROLLER_SIGNATURE: &str = "motion controller";

/// Static kind → base icon table. Both the "table" and "tablet" spellings
/// have been observed in reports.
const KIND_ICONS: &[(&str, &str)] = &[
    ("gaming-input", ICON_GAMING),
    ("mouse", ICON_MOUSE),
    ("touchpad", "input-touchpad"),
    ("keyboard", ICON_KEYBOARD),
    ("pda", "pda"),
    ("printer", "printer"),
    ("scanner", "scanner"),
    ("table", ICON_TABLET),
    ("tablet", ICON_TABLET),
    ("headset", "audio-headset"),
    ("headphones", "audio-headphones"),
    ("camera", "camera-photo"),
    ("video", "camera-video"),
    ("monitor", "video-display"),
    ("speakers", "audio-speakers"),
    ("bluetooth-generic", "bluetooth"),
    ("audio-device", "audio-card"),
];

fn kind_icon(kind: &str) -> Option<&'static str> {
    KIND_ICONS
        .iter()
        .find(|(key, _)| *key == kind)
        .map(|(_, icon)| *icon)
}

/// Resolve the icon for a device record.
///
/// Decision order: model contains "keyboard" → keyboard icon; model contains
/// "mouse" → mouse icon; model carries the motion-controller signature →
/// gaming icon; kind is in the static table → table icon; otherwise the
/// record's own `icon_name`.
///
/// With `prefer_symbolic`, table-resolved icons get [`SYMBOLIC_SUFFIX`]
/// appended while the fallback is passed through untouched; without it,
/// table icons are emitted bare and the fallback has a symbolic suffix
/// stripped if present. Total: always returns a string, never panics.
pub fn resolve_icon(record: &DeviceRecord, prefer_symbolic: bool) -> String {
    let model = record.model.to_lowercase();

    let table_icon = if model.contains("keyboard") {
        Some(ICON_KEYBOARD)
    } else if model.contains("mouse") {
        Some(ICON_MOUSE)
    } else if model.contains(MOTION_CONTROLLER_SIGNATURE) {
        Some(ICON_GAMING)
    } else {
        kind_icon(&record.kind)
    };

    match table_icon {
        Some(base) if prefer_symbolic => format!("{base}{SYMBOLIC_SUFFIX}"),
        Some(base) => base.to_string(),
        None if prefer_symbolic => record.icon_name.clone(),
        None => record
            .icon_name
            .strip_suffix(SYMBOLIC_SUFFIX)
            .unwrap_or(&record.icon_name)
            .to_string(),
    }
}
