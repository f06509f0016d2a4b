// Line-based terminal front-end. Free text is sent to the assistant, slash
// commands map onto controller operations.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::capabilities::{DeviceCapabilities, Headless, NotificationPermission, SystemNotification};
use crate::commands;
use crate::error::{CapabilityError, CommandError};
use crate::models::{MedicalHistory, PregnancyInput};
use crate::notify::{ConfirmGate, ToastCenter};
use crate::pregnancy;
use crate::render;
use crate::state::AppState;
use crate::vaccine;

#[derive(Clone, Debug, PartialEq)]
pub enum ConsoleCommand {
    Say(String),
    /// `None` lists the quick questions.
    Ask(Option<usize>),
    Transcript,
    History,
    Open(usize),
    Clear,
    Pregnancy,
    Register(PregnancyInput),
    DuePreview(String),
    Share,
    Reminders,
    Done(usize),
    Snooze(usize),
    VaccineDate { birth_date: String, vaccine: String },
    Help,
    Quit,
    Empty,
    Unknown(String),
}

// Entries are numbered from 1 on screen
fn parse_index(raw: Option<&str>) -> Option<usize> {
    raw?.parse::<usize>().ok()?.checked_sub(1)
}

pub fn parse_line(line: &str) -> ConsoleCommand {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleCommand::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ConsoleCommand::Say(line.to_string());
    };

    let mut words = command.split_whitespace();
    let name = words.next().unwrap_or_default();
    let with_index = |make: fn(usize) -> ConsoleCommand, raw: Option<&str>| match parse_index(raw) {
        Some(index) => make(index),
        None => ConsoleCommand::Unknown(line.to_string()),
    };

    match name {
        "ask" => match words.next() {
            None => ConsoleCommand::Ask(None),
            raw => match parse_index(raw).filter(|&i| i < QUICK_QUESTIONS.len()) {
                Some(index) => ConsoleCommand::Ask(Some(index)),
                None => ConsoleCommand::Unknown(line.to_string()),
            },
        },
        "show" => ConsoleCommand::Transcript,
        "history" => ConsoleCommand::History,
        "open" => with_index(ConsoleCommand::Open, words.next()),
        "clear" => ConsoleCommand::Clear,
        "pregnancy" => ConsoleCommand::Pregnancy,
        "register" => {
            let start_date = words.next().unwrap_or_default().to_string();
            let mut medical_history = MedicalHistory::default();
            for flag in words {
                match flag {
                    "diabetes" => medical_history.diabetes = true,
                    "hypertension" => medical_history.hypertension = true,
                    "allergies" => medical_history.allergies = true,
                    other => log::warn!("Unknown medical history flag '{}'", other),
                }
            }
            ConsoleCommand::Register(PregnancyInput { start_date, medical_history })
        }
        "due" => ConsoleCommand::DuePreview(words.next().unwrap_or_default().to_string()),
        "share" => ConsoleCommand::Share,
        "reminders" => ConsoleCommand::Reminders,
        "done" => with_index(ConsoleCommand::Done, words.next()),
        "snooze" => with_index(ConsoleCommand::Snooze, words.next()),
        "vaccine" => {
            let birth_date = words.next().unwrap_or_default().to_string();
            let vaccine = words.collect::<Vec<_>>().join(" ");
            if birth_date.is_empty() || vaccine.is_empty() {
                ConsoleCommand::Unknown(line.to_string())
            } else {
                ConsoleCommand::VaccineDate { birth_date, vaccine }
            }
        }
        "help" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => ConsoleCommand::Unknown(line.to_string()),
    }
}

/// Frequent questions, sent as-is with `/ask N`.
pub const QUICK_QUESTIONS: [&str; 5] = [
    "What should I eat during pregnancy?",
    "Which vaccines does my baby need at 2 months?",
    "My baby has a fever, what should I do?",
    "What are the warning signs during pregnancy?",
    "How do I relieve my baby's colic?",
];

const HELP: &str = "\
Type a question to ask the assistant, or one of:
  /ask [N]                   list quick questions, or send quick question N
  /show                      current conversation
  /history                   recent consultations
  /open N                    replace the conversation with consultation N
  /clear                     clear the conversation
  /pregnancy                 pregnancy progress
  /register YYYY-MM-DD [diabetes] [hypertension] [allergies]
  /due YYYY-MM-DD            due date for a start date
  /share                     share pregnancy progress
  /reminders                 vaccine reminders
  /done N | /snooze N        act on reminder N
  /vaccine YYYY-MM-DD NAME   recommended date of a vaccine
  /quit";

/// Reads the answer to a yes/no prompt from stdin.
pub struct ConsoleConfirm;

impl ConfirmGate for ConsoleConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "o" | "oui"),
            Err(e) => {
                log::error!("Failed to read confirmation: {}", e);
                false
            }
        }
    }
}

/// Terminal stand-ins for device capabilities. Only notifications and the bell exist.
pub struct ConsoleDevice;

/// Console side effects on a terminal, none at all when output is redirected.
pub fn select_device(interactive: bool) -> Arc<dyn DeviceCapabilities> {
    if interactive {
        Arc::new(ConsoleDevice)
    } else {
        log::info!("Output is not a terminal, device capabilities disabled");
        Arc::new(Headless)
    }
}

impl DeviceCapabilities for ConsoleDevice {
    fn notification_permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn show_notification(&self, notification: &SystemNotification) -> Result<(), CapabilityError> {
        println!("🔔 {}: {}", notification.title, notification.body);
        Ok(())
    }

    fn play_alert_sound(&self) -> Result<(), CapabilityError> {
        print!("\x07");
        io::stdout().flush().map_err(|e| CapabilityError::Failed {
            capability: "sound",
            detail: e.to_string(),
        })
    }

    fn vibrate(&self, _pattern_ms: &[u32]) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable("vibration"))
    }

    fn share(&self, _title: &str, _text: &str) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable("share sheet"))
    }

    fn write_clipboard(&self, _text: &str) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable("clipboard"))
    }
}

fn read_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    Ok((read > 0).then(|| line.trim_end().to_string()))
}

fn print_toasts(toasts: &ToastCenter) {
    for toast in toasts.visible() {
        println!("{}", render::render_toast(&toast));
    }
}

async fn print_transcript(state: &AppState) {
    let chat = state.chat.lock().await;
    for item in render::render_transcript(&chat) {
        println!("{}", item);
    }
}

async fn print_history(state: &AppState) {
    let chat = state.chat.lock().await;
    let items = render::render_history(chat.history());
    if items.is_empty() {
        println!("No conversation yet");
    }
    for (i, item) in items.iter().enumerate() {
        println!("{:>2}. {}", i + 1, item);
    }
}

async fn print_pregnancy(state: &AppState) {
    match render::render_pregnancy(&*state.pregnancy.lock().await) {
        Some(view) => println!("{}", view),
        None => println!("No pregnancy registered. Use /register YYYY-MM-DD"),
    }
}

async fn print_reminders(state: &AppState) {
    let views = render::render_reminders(&*state.vaccines.lock().await);
    if views.is_empty() {
        println!("No vaccine reminder for now");
    }
    for (i, view) in views.iter().enumerate() {
        println!("{:>2}. {}", i + 1, view);
    }
}

fn report(result: Result<(), CommandError>) {
    match result {
        Ok(()) | Err(CommandError::Cancelled) => {}
        Err(CommandError::Busy(what)) => println!("Please wait, {}.", what),
        // Toasted already, or a failed read kept the cached view
        Err(CommandError::Api(_)) => {}
    }
}

// Sent in the background so a second submission can be refused while this one waits
fn send_in_background(state: &AppState, text: String) {
    let task_state = state.clone();
    tokio::spawn(async move {
        match commands::send_message(&task_state, &text).await {
            Ok((message, _refresh)) => println!("{}", render::render_message(&message)),
            Err(CommandError::Busy(what)) => println!("Please wait, {}.", what),
            Err(e) => log::debug!("Message not sent: {}", e),
        }
    });
}

/// Runs the interactive loop until EOF or `/quit`.
pub async fn run(state: AppState) -> Result<()> {
    println!("Maman & Bébé - backend at {}", state.config.api_url);
    println!("{}", HELP);

    // Background checks live as long as the session
    let _reminder_polling = commands::activate_reminders_view(&state).await;
    if let Err(e) = commands::activate_pregnancy_view(&state).await {
        log::warn!("Pregnancy view not activated: {}", e);
    }
    let _week_tracking = commands::start_week_tracking(&state);
    if let Err(e) = commands::refresh_history(&state).await {
        log::warn!("History not loaded: {}", e);
    }
    print_transcript(&state).await;

    loop {
        let line = tokio::task::spawn_blocking(read_line)
            .await
            .context("stdin reader stopped")??;
        let Some(line) = line else {
            break;
        };

        match parse_line(&line) {
            ConsoleCommand::Empty => continue,
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Say(text) => send_in_background(&state, text),
            ConsoleCommand::Ask(None) => {
                for (i, question) in QUICK_QUESTIONS.iter().enumerate() {
                    println!("{:>2}. {}", i + 1, question);
                }
            }
            ConsoleCommand::Ask(Some(index)) => {
                println!("> {}", QUICK_QUESTIONS[index]);
                send_in_background(&state, QUICK_QUESTIONS[index].to_string());
            }
            ConsoleCommand::Transcript => print_transcript(&state).await,
            ConsoleCommand::History => {
                if let Err(e) = commands::refresh_history(&state).await {
                    log::debug!("History refresh skipped: {}", e);
                }
                print_history(&state).await;
            }
            ConsoleCommand::Open(index) => {
                if commands::open_consultation(&state, index).await {
                    print_transcript(&state).await;
                } else {
                    println!("No consultation #{}", index + 1);
                }
            }
            ConsoleCommand::Clear => {
                if commands::clear_conversation(&state).await.is_ok() {
                    print_transcript(&state).await;
                }
            }
            ConsoleCommand::Pregnancy => {
                report(commands::activate_pregnancy_view(&state).await.map(|_| ()));
                print_pregnancy(&state).await;
            }
            ConsoleCommand::Register(input) => {
                if commands::save_pregnancy(&state, input).await.is_ok() {
                    print_pregnancy(&state).await;
                }
            }
            ConsoleCommand::DuePreview(raw) => match pregnancy::due_date_preview(&raw) {
                Some(due) => println!("Due date: {}", due.format("%d/%m/%Y")),
                None => println!("Expected a date like 2024-01-31"),
            },
            ConsoleCommand::Share => {
                if !commands::share_progress(&state).await {
                    println!("Nothing to share yet");
                }
            }
            ConsoleCommand::Reminders => {
                report(commands::refresh_reminders(&state).await.map(|_| ()));
                print_reminders(&state).await;
            }
            ConsoleCommand::Done(index) => report(commands::mark_reminder_done(&state, index).await),
            ConsoleCommand::Snooze(index) => report(commands::snooze_reminder(&state, index).await),
            ConsoleCommand::VaccineDate { birth_date, vaccine: name } => {
                match parse_day(&birth_date).and_then(|birth| vaccine::next_vaccine_date(birth, &name)) {
                    Some(date) => println!("{}: {}", name, date.format("%d/%m/%Y")),
                    None => println!("Unknown vaccine or date"),
                }
            }
            ConsoleCommand::Unknown(raw) => println!("Unknown command: {} (try /help)", raw),
        }
        print_toasts(&state.toasts);
    }

    log::info!("Console session ended");
    Ok(())
}

fn parse_day(raw: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
