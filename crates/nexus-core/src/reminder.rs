//! Reminder scan: which tasks became due within the last minute.
//!
//! The scan itself is pure. It returns the notifications that should fire and
//! leaves de-duplication to [`NotificationLog::push`](crate::notification::NotificationLog::push),
//! which is what keeps a reminder from firing again on the next tick while it
//! is still inside its window.

use crate::notification::AppNotification;
use crate::project::Project;
use crate::types::NotificationKind;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// Width of the window after a reminder's time during which it fires.
pub const REMINDER_WINDOW_MS: i64 = 60_000;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a stored reminder. Offsets are honored; bare date-times are local.
pub fn parse_reminder(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|at| at.with_timezone(&Utc))
}

/// Reminders due in `[now - window, now]` across every non-completed task.
pub fn scan(projects: &[Project], now: DateTime<Utc>) -> Vec<AppNotification> {
    let mut due = Vec::new();
    for project in projects {
        for task in project.tasks.iter().filter(|t| !t.is_completed()) {
            let Some(raw) = task.reminder_at.as_deref() else {
                continue;
            };
            let Some(at) = parse_reminder(raw) else {
                tracing::debug!("skipping unreadable reminder '{raw}' on task {}", task.id);
                continue;
            };
            let diff = (now - at).num_milliseconds();
            if (0..REMINDER_WINDOW_MS).contains(&diff) {
                due.push(AppNotification::new(
                    NotificationKind::Reminder,
                    format!("Reminder: {}", task.title),
                    format!("Project: {} - Task is due soon!", project.name),
                    now,
                ));
            }
        }
    }
    due
}

// ---------------------------------------------------------------------------
// Desktop side channel
// ---------------------------------------------------------------------------

/// Best-effort OS-level alert. Callers ignore failures.
pub trait DesktopNotifier: Send + Sync {
    fn permitted(&self) -> bool {
        true
    }

    fn notify(&self, title: &str, body: &str) -> anyhow::Result<()>;
}

/// Notifier that shows nothing.
pub struct NoopNotifier;

impl DesktopNotifier for NoopNotifier {
    fn permitted(&self) -> bool {
        false
    }

    fn notify(&self, _title: &str, _body: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Hand `notification` to `notifier`, swallowing any failure.
pub fn notify_desktop(notifier: &dyn DesktopNotifier, notification: &AppNotification) {
    if !notifier.permitted() {
        return;
    }
    if let Err(e) = notifier.notify(&notification.title, &notification.message) {
        tracing::debug!("desktop notification failed: {e:#}");
    }
}
