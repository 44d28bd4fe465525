//! Settings store — schema-validated preferences with change notification.
//!
//! [`Settings`] is the plain snapshot persisted as TOML; [`SettingsStore`] is
//! the string-keyed surface the rest of the system talks to: typed get/set
//! against a fixed schema, change subscriptions delivering [`SettingChange`]
//! events over mpsc senders, and an immediately-persisted toggle for the
//! hidden device list. Accessing a key outside the schema is a hard error,
//! not a silent default — it means the calling code is wrong.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use serde::{Deserialize, Serialize};

/// Header comment prepended to saved settings files.
const CONFIG_HEADER: &str =
    "# Peribatt settings — changes made outside the app may be overwritten.\n\n";

/// Seconds between automatic refreshes.
pub const REFRESH_INTERVAL: &str = "refresh-interval";
/// Whether the menu carries a "Refresh now" entry.
pub const REFRESH_MENUITEM: &str = "refresh-menuitem";
/// Whether the menu carries a "Settings" entry.
pub const SETTINGS_MENUITEM: &str = "settings-menuitem";
/// Prefer monochrome symbolic icons over full-color ones.
pub const SYMBOLIC_ICONS: &str = "symbolic-icons";
/// Allow the indicator to show nothing when every device is hidden.
pub const HIDEEMPTY_MENUITEM: &str = "hideempty-menuitem";
/// Serials of devices the user has hidden from the indicator.
pub const HIDDEN_DEVICES: &str = "hidden-devices";

pub const REFRESH_INTERVAL_DEFAULT: u32 = 300;
pub const REFRESH_INTERVAL_MIN: u32 = 5;
pub const REFRESH_INTERVAL_MAX: u32 = 86400;

/// Value type of a schema key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Uint,
    Flag,
    List,
}

impl SettingKind {
    pub fn name(self) -> &'static str {
        match self {
            SettingKind::Uint => "uint",
            SettingKind::Flag => "flag",
            SettingKind::List => "string list",
        }
    }
}

/// The full settings schema: every key the store accepts, with its type.
pub const SCHEMA: &[(&str, SettingKind)] = &[
    (REFRESH_INTERVAL, SettingKind::Uint),
    (REFRESH_MENUITEM, SettingKind::Flag),
    (SETTINGS_MENUITEM, SettingKind::Flag),
    (SYMBOLIC_ICONS, SettingKind::Flag),
    (HIDEEMPTY_MENUITEM, SettingKind::Flag),
    (HIDDEN_DEVICES, SettingKind::List),
];

/// Look up the declared type of a schema key.
pub fn schema_kind(key: &str) -> Option<SettingKind> {
    SCHEMA
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, kind)| *kind)
}

/// One typed setting value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Uint(u32),
    Flag(bool),
    List(Vec<String>),
}

impl SettingValue {
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Uint(_) => SettingKind::Uint,
            SettingValue::Flag(_) => SettingKind::Flag,
            SettingValue::List(_) => SettingKind::List,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind().name()
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Uint(n) => write!(f, "{n}"),
            SettingValue::Flag(b) => write!(f, "{b}"),
            SettingValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

/// Errors from the settings store.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// The key is not part of the schema — a programming error at the call
    /// site, never an expected runtime condition.
    UnknownKey(String),
    /// The value's type does not match the key's schema type.
    TypeMismatch {
        key: String,
        expected: &'static str,
        got: &'static str,
    },
    /// A numeric value is outside its declared range.
    OutOfRange {
        key: String,
        value: u32,
        min: u32,
        max: u32,
    },
    /// Persisting the settings file failed.
    Storage(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::UnknownKey(key) => {
                write!(f, "unknown setting \"{key}\": not in the schema")
            }
            SettingsError::TypeMismatch { key, expected, got } => {
                write!(f, "setting \"{key}\" expects {expected}, got {got}")
            }
            SettingsError::OutOfRange {
                key,
                value,
                min,
                max,
            } => {
                write!(f, "setting \"{key}\": {value} is outside {min}..={max}")
            }
            SettingsError::Storage(e) => write!(f, "settings persistence failed: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Module-level Result alias using [`SettingsError`].
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Plain settings snapshot, as persisted to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between automatic refreshes. Valid range 5..=86400.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u32,

    /// Show a "Refresh now" entry in the menu.
    #[serde(default = "default_true")]
    pub refresh_menuitem: bool,

    /// Show a "Settings" entry in the menu.
    #[serde(default = "default_true")]
    pub settings_menuitem: bool,

    /// Prefer monochrome symbolic icons.
    #[serde(default = "default_true")]
    pub symbolic_icons: bool,

    /// Allow an empty indicator when every device is hidden.
    #[serde(default)]
    pub hideempty_menuitem: bool,

    /// Serials hidden from the indicator. Stale entries for vanished
    /// devices are harmless and kept.
    #[serde(default)]
    pub hidden_devices: Vec<String>,
}

fn default_refresh_interval() -> u32 {
    REFRESH_INTERVAL_DEFAULT
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            refresh_interval: REFRESH_INTERVAL_DEFAULT,
            refresh_menuitem: true,
            settings_menuitem: true,
            symbolic_icons: true,
            hideempty_menuitem: false,
            hidden_devices: Vec::new(),
        }
    }
}

impl Settings {
    /// Platform-specific settings directory.
    pub fn dir() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            dirs::config_dir().map(|p| p.join("Peribatt"))
        }
        #[cfg(not(windows))]
        {
            dirs::config_dir().map(|p| p.join("peribatt"))
        }
    }

    /// Full path to the settings file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// The hidden serials as a set, for visibility computation.
    pub fn hidden_set(&self) -> BTreeSet<String> {
        self.hidden_devices.iter().cloned().collect()
    }

    /// Save atomically (write to temp file, then rename).
    ///
    /// A header comment is prepended to warn that manual edits may be
    /// overwritten.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct
                // write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Load from a path, returning the settings and any warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist and
    /// `(defaults, [warning])` if it exists but can't be parsed. An
    /// out-of-range `refresh_interval` is clamped with a warning.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        let (mut settings, mut warnings) = match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Settings>(&contents) {
                Ok(settings) => (settings, vec![]),
                Err(e) => {
                    let warning = format!(
                        "settings parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        };

        let clamped = settings
            .refresh_interval
            .clamp(REFRESH_INTERVAL_MIN, REFRESH_INTERVAL_MAX);
        if clamped != settings.refresh_interval {
            warnings.push(format!(
                "refresh_interval {} is outside {REFRESH_INTERVAL_MIN}..={REFRESH_INTERVAL_MAX}, clamped to {clamped}",
                settings.refresh_interval
            ));
            settings.refresh_interval = clamped;
        }

        (settings, warnings)
    }
}

/// One change event: the schema key that was written.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChange {
    pub key: String,
}

pub type SubscriptionId = u64;

/// Settings access surface: schema-validated get/set, snapshots, and
/// any-key change subscriptions.
pub trait SettingsStore {
    /// Read a schema key. `UnknownKey` for anything outside the schema.
    fn get(&self, key: &str) -> Result<SettingValue>;

    /// Write a schema key, validating type and range, persisting, and
    /// notifying subscribers. State is untouched on any error.
    fn set(&self, key: &str, value: SettingValue) -> Result<()>;

    /// Typed copy of the current settings.
    fn snapshot(&self) -> Settings;

    /// Register `tx` for change events on every key. The returned id
    /// deregisters via [`unsubscribe`](SettingsStore::unsubscribe);
    /// dropping the receiver also ends delivery.
    fn subscribe(&self, tx: mpsc::Sender<SettingChange>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);

    /// Toggle `serial` in the hidden device list: remove it if present,
    /// else add it. Persisted immediately. Returns the new hidden state.
    fn toggle_hidden_device(&self, serial: &str) -> Result<bool> {
        let value = self.get(HIDDEN_DEVICES)?;
        let got = value.kind_name();
        let SettingValue::List(mut list) = value else {
            return Err(SettingsError::TypeMismatch {
                key: HIDDEN_DEVICES.into(),
                expected: "string list",
                got,
            });
        };
        let hidden = match list.iter().position(|s| s == serial) {
            Some(idx) => {
                list.remove(idx);
                false
            }
            None => {
                list.push(serial.to_string());
                true
            }
        };
        self.set(HIDDEN_DEVICES, SettingValue::List(list))?;
        Ok(hidden)
    }
}

/// Fan-out of change events to subscribers; disconnected receivers are
/// pruned on the next notify.
#[derive(Default)]
struct ChangeBus {
    subscribers: RefCell<Vec<(SubscriptionId, mpsc::Sender<SettingChange>)>>,
    next_id: Cell<SubscriptionId>,
}

impl ChangeBus {
    fn subscribe(&self, tx: mpsc::Sender<SettingChange>) -> SubscriptionId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.subscribers.borrow_mut().push((id, tx));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    fn notify(&self, key: &str) {
        self.subscribers
            .borrow_mut()
            .retain(|(_, tx)| tx.send(SettingChange { key: key.into() }).is_ok());
    }
}

fn get_value(state: &Settings, key: &str) -> Result<SettingValue> {
    match key {
        REFRESH_INTERVAL => Ok(SettingValue::Uint(state.refresh_interval)),
        REFRESH_MENUITEM => Ok(SettingValue::Flag(state.refresh_menuitem)),
        SETTINGS_MENUITEM => Ok(SettingValue::Flag(state.settings_menuitem)),
        SYMBOLIC_ICONS => Ok(SettingValue::Flag(state.symbolic_icons)),
        HIDEEMPTY_MENUITEM => Ok(SettingValue::Flag(state.hideempty_menuitem)),
        HIDDEN_DEVICES => Ok(SettingValue::List(state.hidden_devices.clone())),
        _ => Err(SettingsError::UnknownKey(key.to_string())),
    }
}

fn set_value(state: &mut Settings, key: &str, value: SettingValue) -> Result<()> {
    match key {
        REFRESH_INTERVAL => {
            let n = expect_uint(key, &value)?;
            if !(REFRESH_INTERVAL_MIN..=REFRESH_INTERVAL_MAX).contains(&n) {
                return Err(SettingsError::OutOfRange {
                    key: key.into(),
                    value: n,
                    min: REFRESH_INTERVAL_MIN,
                    max: REFRESH_INTERVAL_MAX,
                });
            }
            state.refresh_interval = n;
        }
        REFRESH_MENUITEM => state.refresh_menuitem = expect_flag(key, &value)?,
        SETTINGS_MENUITEM => state.settings_menuitem = expect_flag(key, &value)?,
        SYMBOLIC_ICONS => state.symbolic_icons = expect_flag(key, &value)?,
        HIDEEMPTY_MENUITEM => state.hideempty_menuitem = expect_flag(key, &value)?,
        HIDDEN_DEVICES => state.hidden_devices = expect_list(key, value)?,
        _ => return Err(SettingsError::UnknownKey(key.into())),
    }
    Ok(())
}

fn expect_uint(key: &str, value: &SettingValue) -> Result<u32> {
    match value {
        SettingValue::Uint(n) => Ok(*n),
        other => Err(SettingsError::TypeMismatch {
            key: key.into(),
            expected: "uint",
            got: other.kind_name(),
        }),
    }
}

fn expect_flag(key: &str, value: &SettingValue) -> Result<bool> {
    match value {
        SettingValue::Flag(b) => Ok(*b),
        other => Err(SettingsError::TypeMismatch {
            key: key.into(),
            expected: "flag",
            got: other.kind_name(),
        }),
    }
}

fn expect_list(key: &str, value: SettingValue) -> Result<Vec<String>> {
    match value {
        SettingValue::List(items) => Ok(items),
        other => Err(SettingsError::TypeMismatch {
            key: key.into(),
            expected: "string list",
            got: other.kind_name(),
        }),
    }
}

/// File-backed settings store.
///
/// Every successful `set` rewrites the TOML file atomically before
/// subscribers are notified; validation or persistence failures leave both
/// memory and disk untouched.
pub struct FileSettings {
    path: PathBuf,
    state: RefCell<Settings>,
    bus: ChangeBus,
}

impl FileSettings {
    /// Open the store at `path`, or at the default platform path.
    ///
    /// Returns the store plus any load warnings (malformed file, clamped
    /// values). A missing file is not a warning — it means defaults.
    pub fn open(path: Option<&Path>) -> crate::error::Result<(Self, Vec<String>)> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Settings::path().ok_or_else(|| {
                crate::PeribattError::Config("no settings directory on this platform".into())
            })?,
        };
        let (settings, warnings) = Settings::load_from(&path);
        let store = FileSettings {
            path,
            state: RefCell::new(settings),
            bus: ChangeBus::default(),
        };
        Ok((store, warnings))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Result<SettingValue> {
        get_value(&self.state.borrow(), key)
    }

    fn set(&self, key: &str, value: SettingValue) -> Result<()> {
        let mut next = self.snapshot();
        set_value(&mut next, key, value)?;
        next.save_to(&self.path)
            .map_err(|e| SettingsError::Storage(format!("{}: {e}", self.path.display())))?;
        *self.state.borrow_mut() = next;
        self.bus.notify(key);
        Ok(())
    }

    fn snapshot(&self) -> Settings {
        self.state.borrow().clone()
    }

    fn subscribe(&self, tx: mpsc::Sender<SettingChange>) -> SubscriptionId {
        self.bus.subscribe(tx)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.bus.unsubscribe(id)
    }
}

#[doc(hidden)]
pub mod mock {
    //! In-memory settings store for tests — no filesystem, plus failure
    //! injection for the persistence path.

    use super::*;

    pub struct MemorySettings {
        state: RefCell<Settings>,
        bus: ChangeBus,
        fail_next_set: Cell<bool>,
    }

    impl MemorySettings {
        pub fn new() -> Self {
            Self::with_settings(Settings::default())
        }

        pub fn with_settings(settings: Settings) -> Self {
            MemorySettings {
                state: RefCell::new(settings),
                bus: ChangeBus::default(),
                fail_next_set: Cell::new(false),
            }
        }

        /// Make the next `set` fail with a `Storage` error, leaving state
        /// untouched.
        pub fn fail_next_set(&self) {
            self.fail_next_set.set(true);
        }

        /// Live subscriber count, for asserting unsubscribe behavior.
        pub fn subscriber_count(&self) -> usize {
            self.bus.subscribers.borrow().len()
        }
    }

    impl Default for MemorySettings {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SettingsStore for MemorySettings {
        fn get(&self, key: &str) -> Result<SettingValue> {
            get_value(&self.state.borrow(), key)
        }

        fn set(&self, key: &str, value: SettingValue) -> Result<()> {
            if self.fail_next_set.take() {
                return Err(SettingsError::Storage("injected failure".into()));
            }
            set_value(&mut self.state.borrow_mut(), key, value)?;
            self.bus.notify(key);
            Ok(())
        }

        fn snapshot(&self) -> Settings {
            self.state.borrow().clone()
        }

        fn subscribe(&self, tx: mpsc::Sender<SettingChange>) -> SubscriptionId {
            self.bus.subscribe(tx)
        }

        fn unsubscribe(&self, id: SubscriptionId) {
            self.bus.unsubscribe(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MemorySettings;
    use super::*;

    // ── schema ──

    #[test]
    fn schema_covers_all_keys() {
        assert_eq!(schema_kind(REFRESH_INTERVAL), Some(SettingKind::Uint));
        assert_eq!(schema_kind(REFRESH_MENUITEM), Some(SettingKind::Flag));
        assert_eq!(schema_kind(SETTINGS_MENUITEM), Some(SettingKind::Flag));
        assert_eq!(schema_kind(SYMBOLIC_ICONS), Some(SettingKind::Flag));
        assert_eq!(schema_kind(HIDEEMPTY_MENUITEM), Some(SettingKind::Flag));
        assert_eq!(schema_kind(HIDDEN_DEVICES), Some(SettingKind::List));
    }

    #[test]
    fn schema_rejects_unknown_key() {
        assert_eq!(schema_kind("refresh_interval"), None);
        assert_eq!(schema_kind("bogus"), None);
    }

    #[test]
    fn schema_has_no_duplicate_keys() {
        for i in 0..SCHEMA.len() {
            for j in (i + 1)..SCHEMA.len() {
                assert_ne!(SCHEMA[i].0, SCHEMA[j].0);
            }
        }
    }

    // ── defaults & serde ──

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.refresh_interval, 300);
        assert!(s.refresh_menuitem);
        assert!(s.settings_menuitem);
        assert!(s.symbolic_icons);
        assert!(!s.hideempty_menuitem);
        assert!(s.hidden_devices.is_empty());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let s: Settings = toml::from_str("").unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let s: Settings = toml::from_str("refresh_interval = 60").unwrap();
        assert_eq!(s.refresh_interval, 60);
        assert!(s.refresh_menuitem);
        assert!(s.hidden_devices.is_empty());
    }

    #[test]
    fn wrong_type_toml_is_an_error() {
        let result: std::result::Result<Settings, _> =
            toml::from_str("refresh_interval = \"soon\"");
        assert!(result.is_err());
    }

    #[test]
    fn serialize_roundtrip() {
        let s = Settings {
            refresh_interval: 120,
            symbolic_icons: false,
            hidden_devices: vec!["abc".into(), "xyz".into()],
            ..Settings::default()
        };
        let toml_str = toml::to_string_pretty(&s).unwrap();
        let back: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn settings_path_ends_with_toml() {
        let path = Settings::path().unwrap();
        assert_eq!(path.file_name().unwrap(), "config.toml");
    }

    #[test]
    fn hidden_set_collects_serials() {
        let s = Settings {
            hidden_devices: vec!["b".into(), "a".into(), "b".into()],
            ..Settings::default()
        };
        let set = s.hidden_set();
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
        assert!(set.contains("b"));
    }

    // ── typed get/set ──

    #[test]
    fn get_returns_typed_values() {
        let store = MemorySettings::new();
        assert_eq!(
            store.get(REFRESH_INTERVAL).unwrap(),
            SettingValue::Uint(300)
        );
        assert_eq!(
            store.get(SYMBOLIC_ICONS).unwrap(),
            SettingValue::Flag(true)
        );
        assert_eq!(
            store.get(HIDDEN_DEVICES).unwrap(),
            SettingValue::List(vec![])
        );
    }

    #[test]
    fn get_unknown_key_fails_loudly() {
        let store = MemorySettings::new();
        let err = store.get("no-such-setting").unwrap_err();
        assert_eq!(err, SettingsError::UnknownKey("no-such-setting".into()));
        assert!(err.to_string().contains("no-such-setting"));
    }

    #[test]
    fn set_unknown_key_fails_loudly() {
        let store = MemorySettings::new();
        let err = store
            .set("no-such-setting", SettingValue::Flag(true))
            .unwrap_err();
        assert!(matches!(err, SettingsError::UnknownKey(_)));
    }

    #[test]
    fn set_updates_snapshot() {
        let store = MemorySettings::new();
        store.set(SYMBOLIC_ICONS, SettingValue::Flag(false)).unwrap();
        store.set(REFRESH_INTERVAL, SettingValue::Uint(60)).unwrap();
        let snap = store.snapshot();
        assert!(!snap.symbolic_icons);
        assert_eq!(snap.refresh_interval, 60);
    }

    #[test]
    fn set_rejects_type_mismatch() {
        let store = MemorySettings::new();
        let err = store
            .set(REFRESH_INTERVAL, SettingValue::Flag(true))
            .unwrap_err();
        assert_eq!(
            err,
            SettingsError::TypeMismatch {
                key: REFRESH_INTERVAL.into(),
                expected: "uint",
                got: "flag",
            }
        );
    }

    #[test]
    fn set_rejects_out_of_range_interval() {
        let store = MemorySettings::new();
        let low = store.set(REFRESH_INTERVAL, SettingValue::Uint(4)).unwrap_err();
        assert!(matches!(low, SettingsError::OutOfRange { value: 4, .. }));
        let high = store
            .set(REFRESH_INTERVAL, SettingValue::Uint(86401))
            .unwrap_err();
        assert!(matches!(high, SettingsError::OutOfRange { value: 86401, .. }));
        // Unchanged after the failed writes
        assert_eq!(store.snapshot().refresh_interval, 300);
    }

    #[test]
    fn set_accepts_range_bounds() {
        let store = MemorySettings::new();
        store.set(REFRESH_INTERVAL, SettingValue::Uint(5)).unwrap();
        assert_eq!(store.snapshot().refresh_interval, 5);
        store
            .set(REFRESH_INTERVAL, SettingValue::Uint(86400))
            .unwrap();
        assert_eq!(store.snapshot().refresh_interval, 86400);
    }

    // ── hidden device toggle ──

    #[test]
    fn toggle_adds_unknown_serial() {
        let store = MemorySettings::new();
        assert!(store.toggle_hidden_device("abc").unwrap());
        assert_eq!(
            store.get(HIDDEN_DEVICES).unwrap(),
            SettingValue::List(vec!["abc".into()])
        );
    }

    #[test]
    fn toggle_removes_known_serial() {
        let store = MemorySettings::with_settings(Settings {
            hidden_devices: vec!["abc".into(), "xyz".into()],
            ..Settings::default()
        });
        assert!(!store.toggle_hidden_device("abc").unwrap());
        assert_eq!(
            store.get(HIDDEN_DEVICES).unwrap(),
            SettingValue::List(vec!["xyz".into()])
        );
    }

    #[test]
    fn toggle_twice_restores_original_set() {
        let store = MemorySettings::with_settings(Settings {
            hidden_devices: vec!["keep".into()],
            ..Settings::default()
        });
        let before = store.snapshot().hidden_set();
        assert!(store.toggle_hidden_device("abc").unwrap());
        assert!(!store.toggle_hidden_device("abc").unwrap());
        assert_eq!(store.snapshot().hidden_set(), before);
    }

    // ── change notification ──

    #[test]
    fn set_notifies_subscribers_with_key() {
        let store = MemorySettings::new();
        let (tx, rx) = mpsc::channel();
        store.subscribe(tx);
        store.set(SYMBOLIC_ICONS, SettingValue::Flag(false)).unwrap();
        assert_eq!(rx.try_recv().unwrap().key, SYMBOLIC_ICONS);
    }

    #[test]
    fn every_subscriber_sees_the_change() {
        let store = MemorySettings::new();
        let (tx1, rx1) = mpsc::channel();
        let (tx2, rx2) = mpsc::channel();
        store.subscribe(tx1);
        store.subscribe(tx2);
        store.set(REFRESH_INTERVAL, SettingValue::Uint(30)).unwrap();
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let store = MemorySettings::new();
        let (tx, rx) = mpsc::channel();
        let id = store.subscribe(tx);
        store.unsubscribe(id);
        store.set(SYMBOLIC_ICONS, SettingValue::Flag(false)).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_pruned_silently() {
        let store = MemorySettings::new();
        let (tx, rx) = mpsc::channel();
        store.subscribe(tx);
        drop(rx);
        // Two writes: the first prunes, the second must still succeed.
        store.set(SYMBOLIC_ICONS, SettingValue::Flag(false)).unwrap();
        store.set(SYMBOLIC_ICONS, SettingValue::Flag(true)).unwrap();
    }

    #[test]
    fn toggle_notifies_hidden_devices_change() {
        let store = MemorySettings::new();
        let (tx, rx) = mpsc::channel();
        store.subscribe(tx);
        store.toggle_hidden_device("abc").unwrap();
        assert_eq!(rx.try_recv().unwrap().key, HIDDEN_DEVICES);
    }

    #[test]
    fn failed_set_does_not_notify() {
        let store = MemorySettings::new();
        let (tx, rx) = mpsc::channel();
        store.subscribe(tx);
        let _ = store.set(REFRESH_INTERVAL, SettingValue::Uint(1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn injected_storage_failure_leaves_state() {
        let store = MemorySettings::new();
        store.fail_next_set();
        let err = store.set(SYMBOLIC_ICONS, SettingValue::Flag(false)).unwrap_err();
        assert!(matches!(err, SettingsError::Storage(_)));
        assert!(store.snapshot().symbolic_icons);
        // Failure is one-shot
        store.set(SYMBOLIC_ICONS, SettingValue::Flag(false)).unwrap();
    }

    // ── load_from / save_to ──

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let s = Settings {
            refresh_interval: 42,
            hideempty_menuitem: true,
            hidden_devices: vec!["abc".into()],
            ..Settings::default()
        };
        s.save_to(&path).unwrap();
        let (loaded, warnings) = Settings::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(loaded, s);
    }

    #[test]
    fn saved_file_starts_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Settings::default().save_to(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# Peribatt settings"));
    }

    #[test]
    fn save_cleans_up_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Settings::default().save_to(&path).unwrap();
        assert!(!dir.path().join("config.toml.tmp").exists());
    }

    #[test]
    fn load_missing_file_gives_defaults_without_warning() {
        let dir = tempfile::tempdir().unwrap();
        let (s, warnings) = Settings::load_from(&dir.path().join("absent.toml"));
        assert_eq!(s, Settings::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn load_malformed_file_warns_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is { not valid toml").unwrap();
        let (s, warnings) = Settings::load_from(&path);
        assert_eq!(s, Settings::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("settings parse error"));
    }

    #[test]
    fn load_clamps_out_of_range_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refresh_interval = 1").unwrap();
        let (s, warnings) = Settings::load_from(&path);
        assert_eq!(s.refresh_interval, 5);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("clamped"));

        std::fs::write(&path, "refresh_interval = 100000").unwrap();
        let (s, _) = Settings::load_from(&path);
        assert_eq!(s.refresh_interval, 86400);
    }

    // ── FileSettings ──

    #[test]
    fn file_store_set_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let (store, warnings) = FileSettings::open(Some(&path)).unwrap();
        assert!(warnings.is_empty());
        store.set(REFRESH_INTERVAL, SettingValue::Uint(60)).unwrap();

        let (reopened, _) = FileSettings::open(Some(&path)).unwrap();
        assert_eq!(reopened.snapshot().refresh_interval, 60);
    }

    #[test]
    fn file_store_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let (store, _) = FileSettings::open(Some(&path)).unwrap();
        store.toggle_hidden_device("abc").unwrap();

        let (reopened, _) = FileSettings::open(Some(&path)).unwrap();
        assert_eq!(reopened.snapshot().hidden_devices, vec!["abc".to_string()]);
    }

    #[test]
    fn file_store_rejected_set_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let (store, _) = FileSettings::open(Some(&path)).unwrap();
        assert!(store.set(REFRESH_INTERVAL, SettingValue::Uint(1)).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn file_store_notifies_after_persisting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let (store, _) = FileSettings::open(Some(&path)).unwrap();
        let (tx, rx) = mpsc::channel();
        store.subscribe(tx);
        store.set(HIDEEMPTY_MENUITEM, SettingValue::Flag(true)).unwrap();
        assert_eq!(rx.try_recv().unwrap().key, HIDEEMPTY_MENUITEM);
        assert!(path.exists());
    }

    #[test]
    fn file_store_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let (store, _) = FileSettings::open(Some(&path)).unwrap();
        assert_eq!(store.path(), path);
    }
}
