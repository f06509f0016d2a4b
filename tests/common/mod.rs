#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mamanbebe_lib::api::HealthApi;
use mamanbebe_lib::capabilities::{DeviceCapabilities, NotificationPermission, SystemNotification};
use mamanbebe_lib::clock::FakeClock;
use mamanbebe_lib::config::AppConfig;
use mamanbebe_lib::error::{ApiError, CapabilityError};
use mamanbebe_lib::models::{
    BabyDevelopment, ChatReply, ConsultationRecord, PregnancyInput, PregnancyState, ReminderStatus,
    VaccineReminder,
};
use mamanbebe_lib::notify::ConfirmGate;
use mamanbebe_lib::state::AppState;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

/// Scripted backend. Chat replies are consumed in order; every call is counted.
/// The `*_down` switches make the matching read fail with a 500.
#[derive(Default)]
pub struct MockApi {
    pub chat_replies: Mutex<VecDeque<Result<ChatReply, ApiError>>>,
    pub chat_delay: Mutex<Duration>,
    pub chat_calls: AtomicUsize,
    pub chat_in_flight: AtomicUsize,
    pub chat_max_in_flight: AtomicUsize,
    pub history: Mutex<Vec<ConsultationRecord>>,
    pub history_calls: AtomicUsize,
    pub history_down: AtomicBool,
    pub pregnancy: Mutex<Option<PregnancyState>>,
    pub pregnancy_down: AtomicBool,
    pub save_result: Mutex<Option<Result<PregnancyState, ApiError>>>,
    pub save_calls: AtomicUsize,
    pub development: Mutex<Option<BabyDevelopment>>,
    pub development_calls: AtomicUsize,
    pub reminders: Mutex<Vec<VaccineReminder>>,
    pub reminder_calls: AtomicUsize,
    pub reminders_down: AtomicBool,
}

impl MockApi {
    pub fn push_reply(&self, reply: Result<ChatReply, ApiError>) {
        self.chat_replies.lock().unwrap().push_back(reply);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn set_down(switch: &AtomicBool, down: bool) {
        switch.store(down, Ordering::SeqCst);
    }
}

fn unless_down<T>(switch: &AtomicBool, value: T) -> Result<T, ApiError> {
    if switch.load(Ordering::SeqCst) {
        Err(ApiError::Rejected { status: 500, message: "Internal error".into() })
    } else {
        Ok(value)
    }
}

#[async_trait]
impl HealthApi for MockApi {
    async fn send_chat_message(&self, _text: &str) -> Result<ChatReply, ApiError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.chat_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.chat_max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.chat_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.chat_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::transport("no scripted reply")))
    }

    async fn try_fetch_consultation_history(&self, limit: u32) -> Result<Vec<ConsultationRecord>, ApiError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let records = self.history.lock().unwrap().iter().take(limit as usize).cloned().collect();
        unless_down(&self.history_down, records)
    }

    async fn try_fetch_pregnancy_state(&self) -> Result<Option<PregnancyState>, ApiError> {
        let state = self.pregnancy.lock().unwrap().clone();
        unless_down(&self.pregnancy_down, state)
    }

    async fn save_pregnancy_state(&self, _input: &PregnancyInput) -> Result<PregnancyState, ApiError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.save_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ApiError::transport("no scripted save")))
    }

    async fn fetch_baby_development(&self) -> Option<BabyDevelopment> {
        self.development_calls.fetch_add(1, Ordering::SeqCst);
        self.development.lock().unwrap().clone()
    }

    async fn try_fetch_vaccine_reminders(&self) -> Result<Vec<VaccineReminder>, ApiError> {
        self.reminder_calls.fetch_add(1, Ordering::SeqCst);
        let reminders = self.reminders.lock().unwrap().clone();
        unless_down(&self.reminders_down, reminders)
    }
}

/// Records every side effect instead of performing it.
pub struct RecordingDevice {
    pub permission: NotificationPermission,
    pub can_share: bool,
    pub can_copy: bool,
    pub notifications: Mutex<Vec<SystemNotification>>,
    pub sounds: AtomicUsize,
    pub vibrations: AtomicUsize,
    pub shared: Mutex<Vec<String>>,
    pub clipboard: Mutex<Vec<String>>,
}

impl RecordingDevice {
    pub fn new(permission: NotificationPermission) -> Self {
        Self {
            permission,
            can_share: false,
            can_copy: true,
            notifications: Mutex::new(Vec::new()),
            sounds: AtomicUsize::new(0),
            vibrations: AtomicUsize::new(0),
            shared: Mutex::new(Vec::new()),
            clipboard: Mutex::new(Vec::new()),
        }
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

impl DeviceCapabilities for RecordingDevice {
    fn notification_permission(&self) -> NotificationPermission {
        self.permission
    }

    fn show_notification(&self, notification: &SystemNotification) -> Result<(), CapabilityError> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }

    fn play_alert_sound(&self) -> Result<(), CapabilityError> {
        self.sounds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn vibrate(&self, _pattern_ms: &[u32]) -> Result<(), CapabilityError> {
        self.vibrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn share(&self, _title: &str, text: &str) -> Result<(), CapabilityError> {
        if !self.can_share {
            return Err(CapabilityError::Unavailable("share sheet"));
        }
        self.shared.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn write_clipboard(&self, text: &str) -> Result<(), CapabilityError> {
        if !self.can_copy {
            return Err(CapabilityError::Unavailable("clipboard"));
        }
        self.clipboard.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Answers confirmation prompts from a queue; an empty queue declines.
#[derive(Default)]
pub struct ScriptedConfirm {
    pub answers: Mutex<VecDeque<bool>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ConfirmGate for ScriptedConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

pub struct Harness {
    pub state: AppState,
    pub api: Arc<MockApi>,
    pub device: Arc<RecordingDevice>,
    pub confirm: Arc<ScriptedConfirm>,
    pub clock: FakeClock,
}

pub fn harness_with(device: RecordingDevice, confirm: ScriptedConfirm) -> Harness {
    harness_configured(AppConfig::default(), device, confirm)
}

pub fn harness_configured(config: AppConfig, device: RecordingDevice, confirm: ScriptedConfirm) -> Harness {
    let api = Arc::new(MockApi::default());
    let device = Arc::new(device);
    let confirm = Arc::new(confirm);
    let clock = FakeClock::new(t0());
    let state = AppState::new(
        config,
        api.clone(),
        Arc::new(clock.clone()),
        device.clone(),
        confirm.clone(),
    );
    Harness { state, api, device, confirm, clock }
}

pub fn harness() -> Harness {
    harness_with(
        RecordingDevice::new(NotificationPermission::Granted),
        ScriptedConfirm::default(),
    )
}

pub fn reminder(child: &str, vaccines: &[&str], status: ReminderStatus) -> VaccineReminder {
    VaccineReminder {
        child_name: child.to_string(),
        milestone: "2 months".to_string(),
        vaccines: vaccines.iter().map(|v| v.to_string()).collect(),
        recommended_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        status,
    }
}
