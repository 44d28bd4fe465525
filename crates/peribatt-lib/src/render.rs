//! Render frame model — what one refresh cycle hands to the drawing layer.
//!
//! The core never touches a GUI toolkit. Each cycle produces one
//! [`RenderFrame`]: indicator segments for the compact panel area plus the
//! full menu entry list. Whatever draws the panel implements [`RenderSink`]
//! and translates the frame; activations flow back as the opaque
//! [`MenuAction`] each entry carries.

use serde::Serialize;

use crate::icon::resolve_icon;
use crate::report::DeviceRecord;
use crate::settings::Settings;
use crate::visibility::Visibility;

/// Menu icon for "Refresh now". Pre-suffixed; not affected by the
/// symbolic-icons preference.
const REFRESH_ICON: &str = "emblem-synchronizing-symbolic";
/// Menu icon for "Settings".
const SETTINGS_ICON: &str = "preferences-system-symbolic";

/// Label shown when a record has no usable percentage.
pub const NO_PERCENT: &str = "n/a";

/// Menu-entry decoration in the leading gutter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ornament {
    /// Plain entry.
    None,
    /// Hidden device currently force-shown by the hide-empty override.
    Dot,
    /// Hidden device.
    Check,
    /// No gutter at all (control entries).
    Hidden,
}

/// What activating a menu entry means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MenuAction {
    /// Toggle this serial in the hidden device list.
    ToggleDevice(String),
    RefreshNow,
    OpenSettings,
}

/// One icon+label pair in the compact panel area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSegment {
    pub icon: String,
    pub label: String,
    /// Style hint: draw the label in the charging accent.
    pub charging: bool,
    /// Style hint: false means the reading is flagged unreliable.
    pub reliable: bool,
}

/// One popup menu entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuEntry {
    pub label: String,
    pub icon: String,
    /// The record's own vendor icon, when it has one.
    pub secondary_icon: Option<String>,
    pub ornament: Ornament,
    pub action: MenuAction,
}

/// Everything one refresh cycle renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderFrame {
    pub segments: Vec<IndicatorSegment>,
    pub entries: Vec<MenuEntry>,
}

/// Receives one frame per refresh cycle.
pub trait RenderSink {
    fn present(&mut self, frame: &RenderFrame);
}

/// Build the frame for one refresh cycle.
///
/// Device menu entries come first in parse order, then "Refresh now" and
/// "Settings" as the flags allow. Indicator segments cover exactly the
/// records the visibility policy put in the indicator list.
pub fn build_frame(visibility: &Visibility<'_>, settings: &Settings) -> RenderFrame {
    let segments = visibility
        .indicator
        .iter()
        .map(|record| IndicatorSegment {
            icon: resolve_icon(record, settings.symbolic_icons),
            label: percent_or_placeholder(record),
            charging: record.is_charging(),
            reliable: record.percentage_reliable(),
        })
        .collect();

    let mut entries: Vec<MenuEntry> = visibility
        .menu
        .iter()
        .map(|slot| {
            let record = slot.record;
            let ornament = if slot.hidden {
                if visibility.shows(&record.serial) {
                    Ornament::Dot
                } else {
                    Ornament::Check
                }
            } else {
                Ornament::None
            };
            MenuEntry {
                label: format!(
                    "{} ({}) {}",
                    record.model,
                    record.state_label(),
                    percent_or_placeholder(record)
                ),
                icon: resolve_icon(record, settings.symbolic_icons),
                secondary_icon: (!record.icon_name.is_empty()).then(|| record.icon_name.clone()),
                ornament,
                action: MenuAction::ToggleDevice(record.serial.clone()),
            }
        })
        .collect();

    if settings.refresh_menuitem {
        entries.push(MenuEntry {
            label: "Refresh now".into(),
            icon: REFRESH_ICON.into(),
            secondary_icon: None,
            ornament: Ornament::Hidden,
            action: MenuAction::RefreshNow,
        });
    }
    if settings.settings_menuitem {
        entries.push(MenuEntry {
            label: "Settings".into(),
            icon: SETTINGS_ICON.into(),
            secondary_icon: None,
            ornament: Ornament::Hidden,
            action: MenuAction::OpenSettings,
        });
    }

    RenderFrame { segments, entries }
}

fn percent_or_placeholder(record: &DeviceRecord) -> String {
    record
        .percent_label()
        .unwrap_or_else(|| NO_PERCENT.to_string())
}

/// Frame-capturing sink for tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;

    /// Stores every presented frame for assertions.
    #[derive(Default)]
    pub struct RecordingSink {
        pub frames: Vec<RenderFrame>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn last_frame(&self) -> Option<&RenderFrame> {
            self.frames.last()
        }

        pub fn frame_count(&self) -> usize {
            self.frames.len()
        }
    }

    impl RenderSink for RecordingSink {
        fn present(&mut self, frame: &RenderFrame) {
            self.frames.push(frame.clone());
        }
    }
}
