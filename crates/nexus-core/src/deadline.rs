//! Deadline urgency, evaluated against local wall-clock time.
//!
//! Everything here is a pure function of the deadline, the task status and the
//! caller's notion of "now"; callers re-evaluate whenever they render or poll.

use crate::task::Task;
use crate::types::TaskStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// Days ahead (inclusive) that still count as due soon.
pub const DUE_SOON_DAYS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "date", rename_all = "snake_case")]
pub enum DeadlineStatus {
    None,
    Overdue,
    DueSoon,
    Normal(NaiveDate),
}

impl DeadlineStatus {
    pub fn label(&self) -> String {
        match self {
            DeadlineStatus::None => String::new(),
            DeadlineStatus::Overdue => "Overdue".to_string(),
            DeadlineStatus::DueSoon => "Due Soon".to_string(),
            DeadlineStatus::Normal(d) => d.format("%b %-d, %Y").to_string(),
        }
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self, DeadlineStatus::Overdue | DeadlineStatus::DueSoon)
    }
}

impl fmt::Display for DeadlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Classify a deadline relative to the start of `now`'s day.
///
/// Completed tasks and tasks without a deadline are never flagged.
pub fn classify(deadline: Option<NaiveDate>, status: TaskStatus, now: NaiveDateTime) -> DeadlineStatus {
    let Some(deadline) = deadline else {
        return DeadlineStatus::None;
    };
    if status == TaskStatus::Completed {
        return DeadlineStatus::None;
    }
    // Both sides sit at local midnight, so the ceiling of the day delta is the
    // plain calendar difference.
    let diff_days = (deadline - now.date()).num_days();
    if diff_days < 0 {
        DeadlineStatus::Overdue
    } else if diff_days <= DUE_SOON_DAYS {
        DeadlineStatus::DueSoon
    } else {
        DeadlineStatus::Normal(deadline)
    }
}

pub fn classify_task(task: &Task, now: NaiveDateTime) -> DeadlineStatus {
    classify(task.deadline, task.status, now)
}

/// Whether `now` is past the last instant (23:59:59.999) of the deadline day.
/// A task without a deadline is never late.
pub fn is_late(deadline: Option<NaiveDate>, now: NaiveDateTime) -> bool {
    match deadline.and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999)) {
        Some(end_of_day) => now > end_of_day,
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(15, 45, 0)
            .unwrap()
    }

    fn offset(days: i64) -> Option<NaiveDate> {
        let today = now().date();
        if days >= 0 {
            today.checked_add_days(Days::new(days as u64))
        } else {
            today.checked_sub_days(Days::new((-days) as u64))
        }
    }

    #[test]
    fn no_deadline_is_none() {
        assert_eq!(classify(None, TaskStatus::Pending, now()), DeadlineStatus::None);
    }

    #[test]
    fn yesterday_is_overdue() {
        assert_eq!(classify(offset(-1), TaskStatus::Pending, now()), DeadlineStatus::Overdue);
        assert_eq!(classify(offset(-30), TaskStatus::Blocked, now()), DeadlineStatus::Overdue);
    }

    #[test]
    fn today_through_two_days_is_due_soon() {
        for d in 0..=2 {
            assert_eq!(
                classify(offset(d), TaskStatus::InProgress, now()),
                DeadlineStatus::DueSoon,
                "offset {d}"
            );
        }
    }

    #[test]
    fn three_days_out_is_normal() {
        let status = classify(offset(3), TaskStatus::Pending, now());
        assert_eq!(status, DeadlineStatus::Normal(offset(3).unwrap()));
        assert_eq!(status.label(), "Mar 13, 2026");
        assert!(!status.is_flagged());
    }

    #[test]
    fn completed_is_never_flagged() {
        assert_eq!(classify(offset(-400), TaskStatus::Completed, now()), DeadlineStatus::None);
        assert_eq!(classify(offset(1), TaskStatus::Completed, now()), DeadlineStatus::None);
    }

    #[test]
    fn midnight_boundary_uses_calendar_day() {
        let just_after_midnight = now().date().and_hms_opt(0, 0, 1).unwrap();
        assert_eq!(
            classify(offset(-1), TaskStatus::Pending, just_after_midnight),
            DeadlineStatus::Overdue
        );
        let last_minute = now().date().and_hms_opt(23, 59, 0).unwrap();
        assert_eq!(
            classify(offset(0), TaskStatus::Pending, last_minute),
            DeadlineStatus::DueSoon
        );
    }

    #[test]
    fn lateness_extends_to_end_of_day() {
        let day = now().date();
        let end = day.and_hms_milli_opt(23, 59, 59, 999).unwrap();
        assert!(!is_late(Some(day), end));
        assert!(is_late(Some(day), end + chrono::Duration::milliseconds(1)));
        assert!(is_late(offset(-2), now()));
        assert!(!is_late(None, now()));
    }
}
