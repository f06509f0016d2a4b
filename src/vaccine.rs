use chrono::{Duration, NaiveDate};

use crate::capabilities::SystemNotification;
use crate::models::{ReminderStatus, VaccineReminder};

pub const SNOOZE_DAYS: i64 = 7;
pub const REMINDER_NOTIFICATION_TAG: &str = "vaccine-reminder";

// Alert styling and badge styling are two separate tables over the same status.

pub fn alert_type(status: ReminderStatus) -> &'static str {
    match status {
        ReminderStatus::Due => "warning",
        ReminderStatus::Upcoming => "info",
    }
}

pub fn badge_type(status: ReminderStatus) -> &'static str {
    match status {
        ReminderStatus::Due => "danger",
        ReminderStatus::Upcoming => "warning",
    }
}

pub fn status_label(status: ReminderStatus) -> &'static str {
    match status {
        ReminderStatus::Due => "To do",
        ReminderStatus::Upcoming => "Coming up",
    }
}

/// Age in days at which a vaccine is given.
pub fn schedule_offset_days(vaccine: &str) -> Option<i64> {
    match vaccine.trim() {
        "BCG" => Some(0),
        "DTP" | "Hib" | "Hepatitis B" | "Pneumococcus" | "Rotavirus" => Some(60),
        "MMR" | "Meningococcus C" => Some(365),
        _ => None,
    }
}

/// Recommended date of `vaccine` for a child born on `birth_date`.
pub fn next_vaccine_date(birth_date: NaiveDate, vaccine: &str) -> Option<NaiveDate> {
    schedule_offset_days(vaccine).map(|days| birth_date + Duration::days(days))
}

pub fn due_notification(reminder: &VaccineReminder) -> SystemNotification {
    SystemNotification {
        title: "💉 Vaccine reminder - Maman & Bébé".to_string(),
        body: format!("{}: {}", reminder.child_name, reminder.vaccines.join(", ")),
        tag: Some(REMINDER_NOTIFICATION_TAG.to_string()),
    }
}

pub fn mark_done_prompt(reminder: &VaccineReminder) -> String {
    format!(
        "Mark {} for {} as done?",
        reminder.vaccines.join(", "),
        reminder.child_name
    )
}

/// Cached reminder list, replaced wholesale on every fetch.
#[derive(Debug, Default)]
pub struct ReminderViewModel {
    reminders: Vec<VaccineReminder>,
}

impl ReminderViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, reminders: Vec<VaccineReminder>) {
        log::debug!("Reminder list replaced ({} entries)", reminders.len());
        self.reminders = reminders;
    }

    pub fn reminders(&self) -> &[VaccineReminder] {
        &self.reminders
    }

    pub fn get(&self, index: usize) -> Option<&VaccineReminder> {
        self.reminders.get(index)
    }

    pub fn due(&self) -> Vec<&VaccineReminder> {
        self.reminders
            .iter()
            .filter(|r| r.status == ReminderStatus::Due)
            .collect()
    }
}
