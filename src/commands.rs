// Interaction controller: every user action and timer tick ends up here.
// Each command reads view-model state, calls the backend with no lock held,
// then writes the result back and reports the outcome.

use crate::capabilities::{self, degrade, notify_if_permitted};
use crate::chat::CLEAR_PROMPT;
use crate::error::{ApiError, CommandError};
use crate::models::{Message, PregnancyInput};
use crate::notify::Notifier;
use crate::pregnancy;
use crate::scheduler::{self, RecurringTask};
use crate::state::{Action, AppState};
use crate::vaccine;
use tokio::task::JoinHandle;

// --- Chat ---

/// Sends `text` and waits for the answer. Returns the assistant message that
/// closed the exchange (the real answer or the synthetic failure message)
/// together with the handle of the delayed history refresh.
pub async fn send_message(
    state: &AppState,
    text: &str,
) -> Result<(Message, JoinHandle<()>), CommandError> {
    let _guard = state.begin(Action::SendMessage)?;

    let text = {
        let mut chat = state.chat.lock().await;
        chat.begin_send(text, state.clock.now())
    };
    let Some(text) = text else {
        return Err(ApiError::validation("message").into());
    };

    log::info!("User sent a message ({} chars)", text.len());
    let result = state.api.send_chat_message(&text).await;

    let (closing, alert) = {
        let mut chat = state.chat.lock().await;
        let alert = match result {
            Ok(reply) => chat.resolve(reply, state.clock.now()),
            Err(e) => {
                log::error!("Chat exchange failed: {}", e);
                chat.fail(state.clock.now());
                None
            }
        };
        let closing = chat.messages().last().cloned();
        (closing, alert)
    };

    if let Some(message_id) = alert {
        log::warn!("Message {} is high urgency", message_id);
        capabilities::raise_urgency_alert(state.device.as_ref());
    }

    // Give the backend a moment to persist the consultation before re-reading it
    let refresher = state.clone();
    let refresh = scheduler::run_after(state.config.history_refresh_delay, async move {
        if let Err(e) = refresh_history(&refresher).await {
            log::debug!("Delayed history refresh skipped: {}", e);
        }
    });

    match closing {
        Some(message) => Ok((message, refresh)),
        // Only reachable if the transcript was replaced mid-exchange
        None => Err(ApiError::transport("transcript was replaced during the exchange").into()),
    }
}

/// Re-reads the history panel. A failed read keeps the entries already shown.
pub async fn refresh_history(state: &AppState) -> Result<usize, CommandError> {
    let _guard = state.begin(Action::RefreshHistory)?;
    let records = state
        .api
        .try_fetch_consultation_history(state.config.history_limit)
        .await
        .map_err(|e| {
            log::warn!("Keeping cached history: {}", e);
            e
        })?;
    let mut chat = state.chat.lock().await;
    chat.replace_history(records);
    Ok(chat.history().len())
}

/// Shows the history entry at `index` in place of the current transcript.
pub async fn open_consultation(state: &AppState, index: usize) -> bool {
    let mut chat = state.chat.lock().await;
    chat.load_history_entry(index, state.clock.now())
}

pub async fn clear_conversation(state: &AppState) -> Result<(), CommandError> {
    let confirmed = state.confirm.confirm(CLEAR_PROMPT);
    let mut chat = state.chat.lock().await;
    if chat.clear(confirmed, state.clock.now()) {
        log::info!("Conversation cleared");
        Ok(())
    } else {
        log::info!("Clear conversation declined");
        Err(CommandError::Cancelled)
    }
}

// --- Pregnancy ---

/// Re-reads the pregnancy, then the development panel when one is registered.
/// A failed read leaves the cached pregnancy in place.
pub async fn refresh_pregnancy(state: &AppState) -> Result<bool, CommandError> {
    let _guard = state.begin(Action::RefreshPregnancy)?;
    let fetched = state.api.try_fetch_pregnancy_state().await.map_err(|e| {
        log::warn!("Keeping cached pregnancy: {}", e);
        e
    })?;
    let registered = {
        let mut vm = state.pregnancy.lock().await;
        vm.replace(fetched, state.clock.today());
        vm.is_registered()
    };
    if registered {
        refresh_development(state).await;
    }
    Ok(registered)
}

pub async fn refresh_development(state: &AppState) {
    let development = state.api.fetch_baby_development().await;
    state.pregnancy.lock().await.set_development(development);
}

/// Re-derives the week from the clock and refreshes dependents when it moved.
pub async fn check_pregnancy_week(state: &AppState) -> bool {
    let changed = state
        .pregnancy
        .lock()
        .await
        .recompute_week(state.clock.today());
    if changed {
        refresh_development(state).await;
    }
    changed
}

/// Entering the pregnancy view: load, then re-derive against the wall clock.
pub async fn activate_pregnancy_view(state: &AppState) -> Result<bool, CommandError> {
    let refreshed = refresh_pregnancy(state).await;
    check_pregnancy_week(state).await;
    match refreshed {
        // Backend unreachable: carry on with what is cached
        Err(CommandError::Api(_)) => Ok(state.pregnancy.lock().await.is_registered()),
        other => other,
    }
}

pub async fn save_pregnancy(state: &AppState, input: PregnancyInput) -> Result<(), CommandError> {
    if let Err(e) = pregnancy::validate_input(&input) {
        log::info!("Pregnancy form rejected locally: {}", e);
        state.toasts.error(&e.user_message());
        return Err(e.into());
    }

    let _guard = state.begin(Action::SavePregnancy)?;
    match state.api.save_pregnancy_state(&input).await {
        Ok(saved) => {
            state
                .pregnancy
                .lock()
                .await
                .replace(Some(saved), state.clock.today());
            state.toasts.success("Pregnancy saved!");
            refresh_development(state).await;
            Ok(())
        }
        Err(e) => {
            log::error!("Saving pregnancy failed: {}", e);
            state.toasts.error(&e.user_message());
            Err(e.into())
        }
    }
}

/// Shares the progress through the share sheet, or copies it when sharing is unavailable.
pub async fn share_progress(state: &AppState) -> bool {
    let text = match state.pregnancy.lock().await.state() {
        Some(current) => pregnancy::share_text(current),
        None => return false,
    };
    if degrade(state.device.share("My pregnancy progress", &text)) {
        return true;
    }
    match state.device.write_clipboard(&text) {
        Ok(()) => {
            state.toasts.success("Copied to clipboard!");
            true
        }
        Err(e) => {
            log::error!("Clipboard write failed: {}", e);
            state.toasts.error("Copy failed");
            false
        }
    }
}

pub fn start_week_tracking(state: &AppState) -> RecurringTask {
    let state = state.clone();
    let period = state.config.week_check_interval;
    RecurringTask::start("pregnancy-week", period, false, move || {
        let state = state.clone();
        async move {
            check_pregnancy_week(&state).await;
        }
    })
}

// --- Vaccines ---

/// Re-reads the reminders. A failed read keeps the cached list, so the due
/// check still sees it.
pub async fn refresh_reminders(state: &AppState) -> Result<usize, CommandError> {
    let _guard = state.begin(Action::RefreshReminders)?;
    let reminders = state.api.try_fetch_vaccine_reminders().await.map_err(|e| {
        log::warn!("Keeping cached reminders: {}", e);
        e
    })?;
    let count = reminders.len();
    state.vaccines.lock().await.replace(reminders);
    Ok(count)
}

/// Fires one system notification per due reminder. Returns how many were shown.
pub async fn check_due_reminders(state: &AppState) -> usize {
    let notifications: Vec<_> = state
        .vaccines
        .lock()
        .await
        .due()
        .into_iter()
        .map(vaccine::due_notification)
        .collect();
    if notifications.is_empty() {
        return 0;
    }
    log::info!("{} vaccine reminder(s) due", notifications.len());
    notifications
        .iter()
        .filter(|n| notify_if_permitted(state.device.as_ref(), n))
        .count()
}

/// Checks due reminders now and then on every poll interval.
pub fn start_reminder_polling(state: &AppState) -> RecurringTask {
    let state = state.clone();
    let period = state.config.reminder_poll_interval;
    RecurringTask::start("vaccine-reminders", period, true, move || {
        let state = state.clone();
        async move {
            check_due_reminders(&state).await;
        }
    })
}

/// Entering the reminders view: load the list, then start the due check.
pub async fn activate_reminders_view(state: &AppState) -> RecurringTask {
    if let Err(e) = refresh_reminders(state).await {
        log::info!("Reminder polling starts without a fresh list: {}", e);
    }
    start_reminder_polling(state)
}

// TODO: persist through the backend once it exposes a mutation for completed vaccines.
pub async fn mark_reminder_done(state: &AppState, index: usize) -> Result<(), CommandError> {
    let reminder = state.vaccines.lock().await.get(index).cloned();
    let Some(reminder) = reminder else {
        return Err(ApiError::validation("reminder").into());
    };

    if !state.confirm.confirm(&vaccine::mark_done_prompt(&reminder)) {
        log::info!("Mark as done declined for {}", reminder.child_name);
        return Err(CommandError::Cancelled);
    }

    log::info!(
        "Vaccines marked as done: {} for {}",
        reminder.vaccines.join(", "),
        reminder.child_name
    );
    state.toasts.success("Vaccines marked as done!");
    if let Err(e) = refresh_reminders(state).await {
        log::info!("Reminders not re-read after marking done: {}", e);
    }
    Ok(())
}

pub async fn snooze_reminder(state: &AppState, index: usize) -> Result<(), CommandError> {
    let reminder = state.vaccines.lock().await.get(index).cloned();
    let Some(reminder) = reminder else {
        return Err(ApiError::validation("reminder").into());
    };
    log::info!(
        "Reminder snoozed: {} for {}",
        reminder.vaccines.join(", "),
        reminder.child_name
    );
    state
        .toasts
        .success(&format!("Reminder postponed by {} days", vaccine::SNOOZE_DAYS));
    Ok(())
}
