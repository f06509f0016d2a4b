//! Pure rendering of view-model state. Nothing here performs I/O; the
//! terminal front-end prints these values through their `Display` impls.

use std::fmt;

use crate::chat::ConversationViewModel;
use crate::models::{Category, ConsultationRecord, Message, Sender, Urgency};
use crate::notify::{Toast, ToastKind};
use crate::pregnancy::{self, Milestone, PregnancyViewModel};
use crate::vaccine::{self, ReminderViewModel};

const DATE_FORMAT: &str = "%d/%m/%Y";
const HISTORY_PREVIEW_CHARS: usize = 60;

pub fn category_icon(category: Category) -> &'static str {
    match category {
        Category::Nutrition => "🍎",
        Category::Vaccine => "💉",
        Category::Emergency => "🚨",
        Category::Pregnancy => "🤰",
        Category::BabyCare => "👶",
        Category::Error => "⚠️",
        Category::General => "💬",
    }
}

pub fn urgency_color(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::High => "danger",
        Urgency::Medium => "warning",
        Urgency::Low => "info",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageView {
    pub sender: Sender,
    pub icon: &'static str,
    pub lines: Vec<String>,
    /// Only medium and high urgency carry a badge.
    pub urgency_badge: Option<&'static str>,
    pub time: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TranscriptItem {
    Message(MessageView),
    Typing,
}

pub fn render_message(message: &Message) -> MessageView {
    MessageView {
        sender: message.sender,
        icon: category_icon(message.category),
        lines: format_lines(&message.content),
        urgency_badge: (message.urgency != Urgency::Low).then(|| message.urgency.as_str()),
        time: message.timestamp.format("%H:%M").to_string(),
    }
}

// Bullet lines ("• ...") become list items, everything else is kept as-is
fn format_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| match line.trim_start().strip_prefix('•') {
            Some(item) => format!("  - {}", item.trim()),
            None => line.to_string(),
        })
        .collect()
}

pub fn render_transcript(chat: &ConversationViewModel) -> Vec<TranscriptItem> {
    let mut items: Vec<TranscriptItem> = chat
        .messages()
        .iter()
        .map(|m| TranscriptItem::Message(render_message(m)))
        .collect();
    if chat.is_typing() {
        items.push(TranscriptItem::Typing);
    }
    items
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryItemView {
    pub date: String,
    pub urgency: Urgency,
    pub badge_color: &'static str,
    pub question: String,
}

pub fn render_history(records: &[ConsultationRecord]) -> Vec<HistoryItemView> {
    records
        .iter()
        .map(|record| HistoryItemView {
            date: record
                .date
                .map(|d| d.format("%d/%m %H:%M").to_string())
                .unwrap_or_default(),
            urgency: record.urgency,
            badge_color: urgency_color(record.urgency),
            question: truncate(&record.question, HISTORY_PREVIEW_CHARS),
        })
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut)
}

#[derive(Clone, Debug, PartialEq)]
pub struct PregnancyView {
    pub progress_percent: f32,
    pub progress_label: String,
    pub week_display: String,
    pub start_date: String,
    pub due_date: String,
    pub trimester: u8,
    pub trimester_color: &'static str,
    pub development: Option<String>,
    pub next_milestones: Vec<Milestone>,
}

pub fn render_pregnancy(vm: &PregnancyViewModel) -> Option<PregnancyView> {
    let state = vm.state()?;
    let development = vm.development().filter(|d| !d.development.is_empty()).map(|d| {
        format!(
            "Week {} - {} trimester: {}",
            d.week,
            pregnancy::trimester_label(d.trimester),
            d.development
        )
    });
    Some(PregnancyView {
        progress_percent: pregnancy::progress_percent(state.current_week),
        progress_label: format!("{}/{} weeks", state.current_week, pregnancy::TERM_WEEKS),
        week_display: format!("{} WA", state.current_week),
        start_date: state.start_date.format(DATE_FORMAT).to_string(),
        due_date: state.due_date.format(DATE_FORMAT).to_string(),
        trimester: state.trimester,
        trimester_color: pregnancy::trimester_color(state.trimester),
        development,
        next_milestones: vm.next_milestones(),
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReminderView {
    pub alert_type: &'static str,
    pub badge_type: &'static str,
    pub status_label: &'static str,
    pub heading: String,
    pub vaccines: String,
    pub recommended_date: String,
    /// Mark-done and snooze are offered on due reminders only.
    pub actionable: bool,
}

pub fn render_reminders(vm: &ReminderViewModel) -> Vec<ReminderView> {
    vm.reminders()
        .iter()
        .map(|r| ReminderView {
            alert_type: vaccine::alert_type(r.status),
            badge_type: vaccine::badge_type(r.status),
            status_label: vaccine::status_label(r.status),
            heading: format!("{} - {}", r.child_name, r.milestone),
            vaccines: r.vaccines.join(", "),
            recommended_date: r.recommended_date.format(DATE_FORMAT).to_string(),
            actionable: r.status == crate::models::ReminderStatus::Due,
        })
        .collect()
}

// --- Terminal output ---

impl fmt::Display for MessageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = match self.sender {
            Sender::User => "you",
            Sender::Assistant => "assistant",
        };
        write!(f, "[{}] {} {}", self.time, who, self.icon)?;
        if let Some(badge) = self.urgency_badge {
            write!(f, " ({})", badge)?;
        }
        for line in &self.lines {
            write!(f, "\n    {}", line)?;
        }
        Ok(())
    }
}

impl fmt::Display for TranscriptItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptItem::Message(view) => view.fmt(f),
            TranscriptItem::Typing => write!(f, "        assistant is typing..."),
        }
    }
}

impl fmt::Display for HistoryItemView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.date, self.urgency.as_str(), self.question)
    }
}

impl fmt::Display for PregnancyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({:.0}%) - {}", self.progress_label, self.progress_percent, self.week_display)?;
        writeln!(f, "Started {}, due {}", self.start_date, self.due_date)?;
        write!(f, "Trimester {} [{}]", self.trimester, self.trimester_color)?;
        if let Some(development) = &self.development {
            write!(f, "\n{}", development)?;
        }
        for milestone in &self.next_milestones {
            write!(f, "\n  week {}: {}", milestone.week, milestone.title)?;
        }
        Ok(())
    }
}

impl fmt::Display for ReminderView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} - {} (recommended {}) <{}>",
            self.status_label, self.heading, self.vaccines, self.recommended_date, self.alert_type
        )
    }
}

pub fn render_toast(toast: &Toast) -> String {
    match toast.kind {
        ToastKind::Success => format!("✔ {}", toast.message),
        ToastKind::Error => format!("✖ {}", toast.message),
    }
}
