use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pregnancy;

// Who authored a transcript entry
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    #[serde(alias = "bot")]
    Assistant,
}

/// Urgency tier the backend attaches to an answer. Unknown values are read as `Low`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
}

impl From<String> for Urgency {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Urgency::High,
            "medium" => Urgency::Medium,
            _ => Urgency::Low,
        }
    }
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

/// Topic tag of an answer. Unknown tags fall back to `General`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Category {
    Nutrition,
    Vaccine,
    Emergency,
    Pregnancy,
    BabyCare,
    Error,
    #[default]
    General,
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "nutrition" => Category::Nutrition,
            "vaccine" => Category::Vaccine,
            "emergency" => Category::Emergency,
            "pregnancy" => Category::Pregnancy,
            "baby_care" => Category::BabyCare,
            "error" => Category::Error,
            _ => Category::General,
        }
    }
}

// Represents a single entry of the visible transcript
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender: Sender::User,
            urgency: Urgency::Low,
            category: Category::General,
            timestamp,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        urgency: Urgency,
        category: Category,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender: Sender::Assistant,
            urgency,
            category,
            timestamp,
        }
    }
}

// Successful body of POST /api/chat
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatReply {
    #[serde(alias = "response")]
    pub reply: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub category: Category,
}

// A past question/answer pair, owned by the backend
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConsultationRecord {
    pub question: String,
    pub response: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub category: Category,
    #[serde(
        default,
        alias = "date_consultation",
        deserialize_with = "loose_dates::option_datetime"
    )]
    pub date: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MedicalHistory {
    #[serde(default)]
    pub diabetes: bool,
    #[serde(default)]
    pub hypertension: bool,
    #[serde(default)]
    pub allergies: bool,
}

/// The active pregnancy. `due_date` and `trimester` are always consistent with
/// `start_date` and `current_week`, whatever the server sent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(from = "PregnancyWire")]
pub struct PregnancyState {
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub current_week: u32,
    pub trimester: u8,
    pub medical_history: MedicalHistory,
}

impl PregnancyState {
    /// Builds a state from a start date, deriving every other field against `today`.
    pub fn derive(start_date: NaiveDate, medical_history: MedicalHistory, today: NaiveDate) -> Self {
        let current_week = pregnancy::week_for(start_date, today);
        Self {
            start_date,
            due_date: pregnancy::due_date_for(start_date),
            current_week,
            trimester: pregnancy::trimester_for(current_week),
            medical_history,
        }
    }
}

// Shape the backend actually sends. Any `due_date` it carries is ignored: the
// date is a function of `start_date` and comes in several formats.
#[derive(Deserialize)]
struct PregnancyWire {
    #[serde(deserialize_with = "loose_dates::date")]
    start_date: NaiveDate,
    #[serde(default, alias = "week_current")]
    current_week: Option<i64>,
    #[serde(default)]
    medical_history: MedicalHistory,
}

impl From<PregnancyWire> for PregnancyState {
    fn from(wire: PregnancyWire) -> Self {
        let current_week = wire
            .current_week
            .map(|week| week.clamp(0, pregnancy::MAX_WEEK as i64) as u32)
            .unwrap_or(0);
        Self {
            start_date: wire.start_date,
            due_date: pregnancy::due_date_for(wire.start_date),
            current_week,
            trimester: pregnancy::trimester_for(current_week),
            medical_history: wire.medical_history,
        }
    }
}

// Body of POST /api/pregnancy
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PregnancyInput {
    pub start_date: String,
    #[serde(default)]
    pub medical_history: MedicalHistory,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BabyDevelopment {
    pub week: u32,
    pub trimester: u8,
    pub development: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Due,
    Upcoming,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VaccineReminder {
    #[serde(default = "default_child_name")]
    pub child_name: String,
    pub milestone: String,
    #[serde(default)]
    pub vaccines: Vec<String>,
    #[serde(deserialize_with = "loose_dates::date")]
    pub recommended_date: NaiveDate,
    pub status: ReminderStatus,
}

fn default_child_name() -> String {
    "Baby".to_string()
}

/// Date parsing that accepts what the backend emits in practice: plain
/// `YYYY-MM-DD`, ISO date-times with or without offset, and the RFC 2822
/// form produced by default JSON encoders for datetimes.
pub mod loose_dates {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(dt);
        }
        DateTime::parse_from_rfc2822(raw).ok().map(|dt| dt.naive_utc())
    }

    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        parse_datetime(raw).map(|dt| dt.date())
    }

    pub fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).ok_or_else(|| D::Error::custom(format!("unrecognised date: {}", raw)))
    }

    pub fn option_datetime<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_datetime(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("unrecognised datetime: {}", raw))),
            None => Ok(None),
        }
    }
}
