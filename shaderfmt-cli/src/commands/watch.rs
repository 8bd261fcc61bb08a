//! Watch mode: format shader files whenever they are written.

use anyhow::{Context, Result};
use notify_debouncer_mini::notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind};
use shaderfmt_core::format::is_supported;
use shaderfmt_core::{SaveEventRouter, SavedDocument};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::host::Host;

/// Extra quiet time after a formatter run before its file is watched again.
const SETTLE_GRACE: Duration = Duration::from_millis(500);

/// Upper bound on how long a running formatter keeps its file suppressed.
const HOLD_LIMIT: Duration = Duration::from_secs(600);

/// Run the watch command.
pub async fn run(
    cli: &Cli,
    paths: &[PathBuf],
    executable: Option<PathBuf>,
    offline: bool,
    debounce_ms: u64,
) -> Result<i32> {
    let host = Host::new(cli, executable)?;

    // Activation
    let settings = host.settings();
    if offline {
        info!("Offline, skipping update check");
    } else {
        let report = host.update(&settings).await?;
        debug!(outcome = ?report.outcome, phases = ?report.phases, "Update cycle finished");
    }

    let router = host.router();
    let debounce = Duration::from_millis(debounce_ms);
    let settle = Arc::new(Mutex::new(SettleWindow::new(debounce + SETTLE_GRACE)));

    // Set up file watcher
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();
    let mut debouncer = new_debouncer(debounce, move |events: DebounceEventResult| match events {
        Ok(events) => {
            let changed: Vec<PathBuf> = events
                .into_iter()
                .filter(|e| e.kind == DebouncedEventKind::Any)
                .map(|e| e.path)
                .collect();

            if !changed.is_empty() && tx.send(changed).is_err() {
                debug!("Watch loop gone, dropping file events");
            }
        }
        Err(e) => warn!("File watch error: {:?}", e),
    })
    .context("Failed to create file watcher")?;

    for path in paths {
        debouncer
            .watcher()
            .watch(path, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        info!("Watching: {}", path.display());
    }

    println!("Watching for shader saves. Press Ctrl+C to stop.");

    // Main watch loop
    loop {
        tokio::select! {
            changed = rx.recv() => {
                let Some(changed) = changed else { break };
                for path in changed {
                    dispatch(&router, &settle, path);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch");
                break;
            }
        }
    }

    drop(debouncer);
    drop(router);
    host.finish().await;
    Ok(0)
}

/// Hands one changed file to the router unless it is the formatter's own write.
fn dispatch(router: &Arc<SaveEventRouter>, settle: &Arc<Mutex<SettleWindow>>, path: PathBuf) {
    let doc = SavedDocument::from_path(&path);
    if !path.is_file() || !is_supported(&doc) {
        return;
    }

    {
        let Ok(mut window) = settle.lock() else {
            return;
        };
        if !window.should_dispatch(&path, Instant::now()) {
            debug!(file = %path.display(), "Ignoring formatter write");
            return;
        }
        window.hold(&path);
    }

    let Some(handle) = router.on_save(doc) else {
        return;
    };

    // Held while the formatter runs, then quiet until its rewrite has settled.
    let settle = Arc::clone(settle);
    tokio::spawn(async move {
        let outcome = handle.await;
        debug!(file = %path.display(), ?outcome, "Save handled");
        if let Ok(mut window) = settle.lock() {
            window.mark(&path, Instant::now());
        }
    });
}

/// Per-path quiet period after a formatter run.
#[derive(Debug)]
struct SettleWindow {
    window: Duration,
    quiet_until: HashMap<PathBuf, Instant>,
}

impl SettleWindow {
    fn new(window: Duration) -> Self {
        Self {
            window,
            quiet_until: HashMap::new(),
        }
    }

    /// Suppresses `path` until the next `mark`.
    fn hold(&mut self, path: &Path) {
        self.quiet_until
            .insert(path.to_path_buf(), Instant::now() + HOLD_LIMIT);
    }

    fn mark(&mut self, path: &Path, now: Instant) {
        self.quiet_until.insert(path.to_path_buf(), now + self.window);
    }

    fn should_dispatch(&mut self, path: &Path, now: Instant) -> bool {
        self.quiet_until.retain(|_, until| *until > now);
        !self.quiet_until.contains_key(path)
    }
}
