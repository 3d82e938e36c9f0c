use crate::types::NotificationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Two notifications with the same title closer together than this are the
/// same alert.
pub const DEDUP_WINDOW_MS: i64 = 60_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppNotification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub read: bool,
}

impl AppNotification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        time: DateTime<Utc>,
    ) -> Self {
        AppNotification {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
            time,
            kind,
            read: false,
        }
    }

    fn duplicates(&self, other: &AppNotification) -> bool {
        self.title == other.title
            && (self.time - other.time).num_milliseconds().abs() < DEDUP_WINDOW_MS
    }
}

/// Newest-first alert list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationLog {
    items: Vec<AppNotification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<AppNotification>) -> Self {
        NotificationLog { items }
    }

    pub fn items(&self) -> &[AppNotification] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Prepend `notification` unless an entry with the same title already
    /// sits within [`DEDUP_WINDOW_MS`] of it. Returns whether it was added.
    pub fn push(&mut self, notification: AppNotification) -> bool {
        if self.items.iter().any(|n| n.duplicates(&notification)) {
            tracing::debug!("suppressing duplicate notification '{}'", notification.title);
            return false;
        }
        self.items.insert(0, notification);
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns how many entries flipped from unread to read.
    pub fn mark_all_read(&mut self) -> usize {
        let mut flipped = 0;
        for n in self.items.iter_mut().filter(|n| !n.read) {
            n.read = true;
            flipped += 1;
        }
        flipped
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
    }

    fn reminder(title: &str, at: DateTime<Utc>) -> AppNotification {
        AppNotification::new(NotificationKind::Reminder, title, "msg", at)
    }

    #[test]
    fn push_prepends() {
        let mut log = NotificationLog::new();
        assert!(log.push(reminder("a", t0())));
        assert!(log.push(reminder("b", t0())));
        assert_eq!(log.items()[0].title, "b");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn same_title_inside_window_is_suppressed() {
        let mut log = NotificationLog::new();
        assert!(log.push(reminder("Reminder: Ship", t0())));
        assert!(!log.push(reminder("Reminder: Ship", t0() + Duration::seconds(30))));
        assert!(!log.push(reminder("Reminder: Ship", t0() + Duration::milliseconds(59_999))));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn same_title_outside_window_is_kept() {
        let mut log = NotificationLog::new();
        log.push(reminder("Reminder: Ship", t0()));
        assert!(log.push(reminder("Reminder: Ship", t0() + Duration::seconds(60))));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn read_state() {
        let mut log = NotificationLog::new();
        log.push(reminder("a", t0()));
        log.push(reminder("b", t0()));
        assert_eq!(log.unread_count(), 2);
        assert_eq!(log.mark_all_read(), 2);
        assert_eq!(log.unread_count(), 0);
        assert_eq!(log.mark_all_read(), 0);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn kind_serializes_as_type() {
        let json = serde_json::to_value(reminder("a", t0())).unwrap();
        assert_eq!(json["type"], "reminder");
        assert_eq!(json["read"], false);
    }
}
