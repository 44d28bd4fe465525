//! `watch` subcommand — refresh continuously on the configured interval.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use super::{RUNNING, Result, SettingsStore, open_settings};
use crate::term::TerminalSink;
use peribatt_lib::orchestrator::Orchestrator;
use peribatt_lib::runner::{CommandRunner, FileRunner, SystemRunner, default_command};

/// Poll granularity of the loop. The refresh timer decides when a cycle
/// actually runs; this only bounds how late it can fire.
const POLL_TICK: Duration = Duration::from_millis(250);

pub(super) fn cmd_watch(
    from_file: Option<&Path>,
    once: bool,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let store = open_settings(config_path)?;

    if !json {
        let source = match from_file {
            Some(path) => format!("file {}", path.display()),
            None => default_command().join(" "),
        };
        println!("Peribatt — peripheral battery watch.");
        println!("[source] {source}");
        println!(
            "[config] refresh every {}s",
            store.snapshot().refresh_interval
        );
        if !once {
            println!("Watching... (Ctrl+C to stop)");
        }
        println!();
    }

    match from_file {
        Some(path) => run_session(FileRunner::new(path), store, json, once),
        None => run_session(SystemRunner, store, json, once),
    }
}

/// Drive refresh cycles until shutdown. The first cycle runs immediately;
/// later ones fire from the orchestrator's timer or settings changes.
fn run_session<R: CommandRunner, S: SettingsStore>(
    runner: R,
    store: S,
    json: bool,
    once: bool,
) -> Result<()> {
    let mut orch = Orchestrator::new(runner, store, TerminalSink::new(json));
    orch.refresh(Instant::now())?;

    if once {
        orch.shutdown();
        return Ok(());
    }

    while RUNNING.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_TICK);
        orch.poll(Instant::now())?;
    }

    orch.shutdown();
    Ok(())
}
