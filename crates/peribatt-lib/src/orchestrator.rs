//! Refresh orchestration — the cyclic fetch/parse/render state machine.
//!
//! One orchestrator owns the whole refresh cycle: cancel the pending timer,
//! fetch the report through the command runner, parse it, compute visibility
//! from a settings snapshot, hand one frame to the sink, re-arm the
//! single-slot timer. Fetch failures are fail-stop: the phase drops to
//! [`Phase::Idle`] with no timer armed, and a manual trigger or settings
//! change is needed to resume.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::render::{self, MenuAction, RenderSink};
use crate::report;
use crate::runner::{CommandRunner, default_command};
use crate::settings::{SettingChange, SettingsStore, SubscriptionId};
use crate::visibility::compute_visibility;

/// Delay for the debounced manual refresh.
pub const MANUAL_REFRESH_DELAY: Duration = Duration::from_millis(500);

/// Where the cycle currently rests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Halted: no timer armed, waiting for an external trigger.
    Idle,
    Fetching,
    Parsing,
    Rendering,
    /// Timer armed, waiting for the deadline.
    Scheduled,
}

/// The single timer slot.
///
/// At most one armed deadline exists at any instant; arming replaces the
/// previous deadline.
#[derive(Debug, Default)]
pub struct TimerSlot {
    deadline: Option<Instant>,
}

impl TimerSlot {
    pub fn arm(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Take the deadline if it is due at `now`, leaving the slot empty.
    pub fn fire_due(&mut self, now: Instant) -> Option<Instant> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.deadline.take(),
            _ => None,
        }
    }
}

/// What handling a menu action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The serial's hidden state was toggled and persisted.
    HiddenToggled { serial: String, hidden: bool },
    /// A debounced refresh was armed.
    RefreshQueued,
    /// The embedder should open its settings surface.
    OpenSettingsRequested,
}

/// Counts from one completed refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Parsed device records.
    pub devices: usize,
    /// Records placed in the indicator area.
    pub shown: usize,
}

/// Owns the refresh cycle and the three injected collaborators.
///
/// Single-threaded: `refresh`, `poll`, and `handle_action` take the current
/// `Instant` explicitly so embedders and tests control the clock. The
/// orchestrator subscribes to settings changes at construction; any change
/// makes the next `poll` refresh immediately, superseding the timer.
pub struct Orchestrator<R: CommandRunner, S: SettingsStore, K: RenderSink> {
    runner: R,
    settings: S,
    sink: K,
    command: Vec<String>,
    timer: TimerSlot,
    phase: Phase,
    changes: mpsc::Receiver<SettingChange>,
    subscription: Option<SubscriptionId>,
}

impl<R: CommandRunner, S: SettingsStore, K: RenderSink> Orchestrator<R, S, K> {
    /// Wire up the collaborators and subscribe to settings changes.
    ///
    /// Starts `Idle` with no timer armed; nothing happens until the first
    /// [`refresh`](Self::refresh) or [`poll`](Self::poll).
    pub fn new(runner: R, settings: S, sink: K) -> Self {
        let (tx, rx) = mpsc::channel();
        let subscription = settings.subscribe(tx);
        Orchestrator {
            runner,
            settings,
            sink,
            command: default_command(),
            timer: TimerSlot::default(),
            phase: Phase::Idle,
            changes: rx,
            subscription: Some(subscription),
        }
    }

    /// Override the report command.
    pub fn with_command(mut self, argv: Vec<String>) -> Self {
        self.command = argv;
        self
    }

    /// Run one full cycle at `now`: fetch, parse, render, re-arm.
    ///
    /// On fetch failure the error is logged and propagated, the phase drops
    /// to `Idle` with no timer armed, and the sink keeps its previous frame.
    pub fn refresh(&mut self, now: Instant) -> Result<RefreshSummary> {
        self.timer.cancel();
        self.phase = Phase::Fetching;

        let raw = match self.runner.run(&self.command) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("report fetch failed: {e}");
                self.phase = Phase::Idle;
                return Err(e.into());
            }
        };

        self.phase = Phase::Parsing;
        let records = report::parse(&raw);

        self.phase = Phase::Rendering;
        let snapshot = self.settings.snapshot();
        let hidden = snapshot.hidden_set();
        let visibility = compute_visibility(&records, &hidden, snapshot.hideempty_menuitem);
        let frame = render::build_frame(&visibility, &snapshot);
        let summary = RefreshSummary {
            devices: records.len(),
            shown: frame.segments.len(),
        };
        self.sink.present(&frame);

        self.timer
            .arm(now + Duration::from_secs(u64::from(snapshot.refresh_interval)));
        self.phase = Phase::Scheduled;
        log::debug!(
            "refresh complete: {} devices, {} shown, next in {}s",
            summary.devices,
            summary.shown,
            snapshot.refresh_interval
        );
        Ok(summary)
    }

    /// Drive the cycle from an event loop.
    ///
    /// A pending settings change triggers an immediate refresh, superseding
    /// the timer; otherwise the timer fires if due. Returns the summary of
    /// the cycle that ran, `None` when there was nothing to do.
    pub fn poll(&mut self, now: Instant) -> Result<Option<RefreshSummary>> {
        if self.drain_changes() {
            log::debug!("settings changed, refreshing");
            return self.refresh(now).map(Some);
        }
        if self.timer.fire_due(now).is_some() {
            return self.refresh(now).map(Some);
        }
        Ok(None)
    }

    fn drain_changes(&mut self) -> bool {
        let mut any = false;
        while self.changes.try_recv().is_ok() {
            any = true;
        }
        any
    }

    /// Resolve one of the opaque actions carried by menu entries.
    ///
    /// `ToggleDevice` persists through the settings store; the resulting
    /// change event makes the next `poll` refresh. `RefreshNow` arms the
    /// short debounce timer instead of fetching synchronously, so rapid
    /// activations collapse into one cycle.
    pub fn handle_action(&mut self, action: &MenuAction, now: Instant) -> Result<ActionOutcome> {
        match action {
            MenuAction::ToggleDevice(serial) => {
                let hidden = self.settings.toggle_hidden_device(serial)?;
                log::debug!("device {serial} hidden: {hidden}");
                Ok(ActionOutcome::HiddenToggled {
                    serial: serial.clone(),
                    hidden,
                })
            }
            MenuAction::RefreshNow => {
                self.timer.arm(now + MANUAL_REFRESH_DELAY);
                self.phase = Phase::Scheduled;
                Ok(ActionOutcome::RefreshQueued)
            }
            MenuAction::OpenSettings => Ok(ActionOutcome::OpenSettingsRequested),
        }
    }

    /// Cancel the timer and deregister the settings listener.
    ///
    /// Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        self.timer.cancel();
        self.phase = Phase::Idle;
        if let Some(id) = self.subscription.take() {
            self.settings.unsubscribe(id);
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Deadline of the armed timer, when one exists.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}

impl<R: CommandRunner, S: SettingsStore, K: RenderSink> Drop for Orchestrator<R, S, K> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
