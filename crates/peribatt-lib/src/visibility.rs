//! Visibility policy — splits parsed devices into indicator and menu lists.
//!
//! The menu always lists every device, tagged with its hidden flag; the
//! indicator shows the non-hidden ones. Unless the user explicitly allowed an
//! empty indicator, the first device is forced back in when everything is
//! hidden. Pure computation over one refresh cycle; the hidden set itself is
//! owned and persisted by the settings store.

use std::collections::BTreeSet;

use crate::report::DeviceRecord;

/// One menu row: a device and whether the user has hidden it.
#[derive(Debug, Clone, Copy)]
pub struct MenuSlot<'a> {
    pub record: &'a DeviceRecord,
    pub hidden: bool,
}

/// Computed display split for one refresh cycle.
#[derive(Debug)]
pub struct Visibility<'a> {
    /// Devices shown as indicator segments, in parse order.
    pub indicator: Vec<&'a DeviceRecord>,
    /// Every device, tagged with its hidden flag, in parse order.
    pub menu: Vec<MenuSlot<'a>>,
}

impl Visibility<'_> {
    /// Whether the device with `serial` ends up shown in the indicator.
    pub fn shows(&self, serial: &str) -> bool {
        self.indicator.iter().any(|r| r.serial == serial)
    }
}

/// Compute the indicator/menu split.
///
/// Hidden serials that match no current record have no effect (stale entries
/// are harmless and stay in storage). With `hide_empty_allowed == false`, an
/// all-hidden device list still yields one indicator entry: the first record
/// by parse order.
pub fn compute_visibility<'a>(
    records: &'a [DeviceRecord],
    hidden_serials: &BTreeSet<String>,
    hide_empty_allowed: bool,
) -> Visibility<'a> {
    let menu: Vec<MenuSlot<'a>> = records
        .iter()
        .map(|record| MenuSlot {
            record,
            hidden: hidden_serials.contains(&record.serial),
        })
        .collect();

    let mut indicator: Vec<&DeviceRecord> = menu
        .iter()
        .filter(|slot| !slot.hidden)
        .map(|slot| slot.record)
        .collect();

    if indicator.is_empty()
        && !hide_empty_allowed
        && let Some(first) = records.first()
    {
        indicator.push(first);
    }

    Visibility { indicator, menu }
}
