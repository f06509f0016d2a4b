use crate::api::HealthApi;
use crate::capabilities::DeviceCapabilities;
use crate::chat::ConversationViewModel;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::error::CommandError;
use crate::notify::{ConfirmGate, ToastCenter};
use crate::pregnancy::PregnancyViewModel;
use crate::vaccine::ReminderViewModel;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// User-triggerable actions that must not run twice at the same time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    SendMessage,
    RefreshHistory,
    SavePregnancy,
    RefreshPregnancy,
    RefreshReminders,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::SendMessage => "sending a message",
            Action::RefreshHistory => "loading the history",
            Action::SavePregnancy => "saving the pregnancy",
            Action::RefreshPregnancy => "loading the pregnancy",
            Action::RefreshReminders => "loading the reminders",
        }
    }
}

// Core application state, built once at start-up and cloned into tasks
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: Arc<dyn HealthApi>,
    pub clock: Arc<dyn Clock>,
    pub device: Arc<dyn DeviceCapabilities>,
    pub confirm: Arc<dyn ConfirmGate>,
    pub toasts: Arc<ToastCenter>,
    // View models are only locked between network calls, never across them.
    pub chat: Arc<Mutex<ConversationViewModel>>,
    pub pregnancy: Arc<Mutex<PregnancyViewModel>>,
    pub vaccines: Arc<Mutex<ReminderViewModel>>,
    in_flight: Arc<DashMap<Action, DateTime<Utc>>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        api: Arc<dyn HealthApi>,
        clock: Arc<dyn Clock>,
        device: Arc<dyn DeviceCapabilities>,
        confirm: Arc<dyn ConfirmGate>,
    ) -> Self {
        let chat = ConversationViewModel::new(config.history_limit as usize, clock.now());
        Self {
            config: Arc::new(config),
            api,
            toasts: Arc::new(ToastCenter::new(clock.clone())),
            clock,
            device,
            confirm,
            chat: Arc::new(Mutex::new(chat)),
            pregnancy: Arc::new(Mutex::new(PregnancyViewModel::new())),
            vaccines: Arc::new(Mutex::new(ReminderViewModel::new())),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Claims `action` until the returned guard is dropped.
    pub fn begin(&self, action: Action) -> Result<InFlightGuard, CommandError> {
        match self.in_flight.entry(action) {
            Entry::Occupied(started) => {
                log::warn!("Ignoring {:?}: already in flight since {}", action, started.get());
                Err(CommandError::Busy(action.label()))
            }
            Entry::Vacant(slot) => {
                slot.insert(self.clock.now());
                Ok(InFlightGuard { in_flight: self.in_flight.clone(), action })
            }
        }
    }

    pub fn is_in_flight(&self, action: Action) -> bool {
        self.in_flight.contains_key(&action)
    }
}

/// Releases its action on drop, whichever way the command ends.
pub struct InFlightGuard {
    in_flight: Arc<DashMap<Action, DateTime<Utc>>>,
    action: Action,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.action);
    }
}
