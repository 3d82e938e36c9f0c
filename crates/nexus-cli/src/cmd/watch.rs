//! `nexus watch`: run the reminder scan on a timer until Ctrl-C or sign-out.

use super::open_app;
use anyhow::Context;
use chrono::Local;
use nexus_core::app::App;
use nexus_core::notification::AppNotification;
use nexus_core::reminder::{DesktopNotifier, NoopNotifier};
use nexus_core::schedule::ReminderScheduler;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::info;

/// Terminal bell plus a line on stderr.
struct TerminalNotifier;

impl DesktopNotifier for TerminalNotifier {
    fn notify(&self, title: &str, body: &str) -> anyhow::Result<()> {
        let mut err = std::io::stderr().lock();
        write!(err, "\x07")?;
        writeln!(err, "{title}: {body}")?;
        Ok(())
    }
}

fn emit(notification: &AppNotification, json: bool) {
    if json {
        match serde_json::to_string(notification) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!("failed to encode notification: {e}"),
        }
    } else {
        println!(
            "[{}] {} ({})",
            notification.time.with_timezone(&Local).format("%H:%M:%S"),
            notification.title,
            notification.message
        );
    }
}

/// One pass against fresh state. `Break` once the session is gone.
fn tick(app: &mut App, notifier: &dyn DesktopNotifier, json: bool) -> ControlFlow<()> {
    app.reload();
    if app.current_user().is_none() {
        info!("session ended; stopping reminders");
        return ControlFlow::Break(());
    }
    for notification in app.run_reminder_scan(notifier) {
        emit(&notification, json);
    }
    ControlFlow::Continue(())
}

pub fn run(root: &Path, once: bool, quiet: bool, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    app.require_user()?;
    let notifier: Box<dyn DesktopNotifier> = if quiet || json {
        Box::new(NoopNotifier)
    } else {
        Box::new(TerminalNotifier)
    };

    if once {
        let _ = tick(&mut app, notifier.as_ref(), json);
        return Ok(());
    }

    let period = Duration::from_secs(app.config().reminders.interval_secs);
    if !json {
        eprintln!(
            "Watching reminders every {}s. Press Ctrl-C to stop.",
            period.as_secs().max(1)
        );
    }

    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    rt.block_on(async move {
        let stopped = Arc::new(Notify::new());
        let signal = stopped.clone();
        let scheduler = ReminderScheduler::start(period, move || {
            let flow = tick(&mut app, notifier.as_ref(), json);
            if flow.is_break() {
                signal.notify_one();
            }
            flow
        });

        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res.context("failed to listen for Ctrl-C")?;
                scheduler.cancel().await;
                info!("stopped by Ctrl-C");
            }
            _ = stopped.notified() => {
                scheduler.finished().await;
                if !json {
                    eprintln!("Signed out; reminders stopped.");
                }
            }
        }
        Ok(())
    })
}
