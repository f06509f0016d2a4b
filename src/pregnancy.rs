use chrono::{Duration, NaiveDate};

use crate::error::ApiError;
use crate::models::{BabyDevelopment, PregnancyInput, PregnancyState};

/// 40 weeks from the start date.
pub const GESTATION_DAYS: i64 = 280;
pub const TERM_WEEKS: u32 = 40;
pub const MAX_WEEK: u32 = 42;

pub fn due_date_for(start_date: NaiveDate) -> NaiveDate {
    start_date + Duration::days(GESTATION_DAYS)
}

/// Completed weeks between `start_date` and `today`, clamped to `[0, MAX_WEEK]`.
pub fn week_for(start_date: NaiveDate, today: NaiveDate) -> u32 {
    let days = (today - start_date).num_days();
    days.div_euclid(7).clamp(0, MAX_WEEK as i64) as u32
}

pub fn trimester_for(week: u32) -> u8 {
    match week {
        0..=13 => 1,
        14..=27 => 2,
        _ => 3,
    }
}

pub fn trimester_color(trimester: u8) -> &'static str {
    match trimester {
        1 => "success",
        2 => "warning",
        3 => "danger",
        _ => "secondary",
    }
}

pub fn trimester_label(trimester: u8) -> &'static str {
    match trimester {
        1 => "first",
        2 => "second",
        3 => "third",
        _ => "",
    }
}

/// Share of the 40-week term elapsed, capped at 100.
pub fn progress_percent(week: u32) -> f32 {
    (week as f32 / TERM_WEEKS as f32 * 100.0).min(100.0)
}

/// Due date shown under the form while the user picks a start date.
pub fn due_date_preview(raw_start_date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw_start_date.trim(), "%Y-%m-%d")
        .ok()
        .map(due_date_for)
}

/// Structural check of the registration form. Only the start date is required.
pub fn validate_input(input: &PregnancyInput) -> Result<NaiveDate, ApiError> {
    ApiError::check_required(&[("start_date", input.start_date.as_str())])?;
    NaiveDate::parse_from_str(input.start_date.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation("start_date"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MilestoneKind {
    Scan,
    Consultation,
    Monitoring,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Milestone {
    pub week: u32,
    pub title: &'static str,
    pub kind: MilestoneKind,
}

pub const MILESTONES: [Milestone; 5] = [
    Milestone { week: 12, title: "Dating scan", kind: MilestoneKind::Scan },
    Milestone { week: 22, title: "Morphology scan", kind: MilestoneKind::Scan },
    Milestone { week: 32, title: "Last scan", kind: MilestoneKind::Scan },
    Milestone { week: 36, title: "Pre-anaesthetic consultation", kind: MilestoneKind::Consultation },
    Milestone { week: 41, title: "Post-term monitoring", kind: MilestoneKind::Monitoring },
];

/// The next three milestones strictly after `week`.
pub fn next_milestones(week: u32) -> Vec<Milestone> {
    MILESTONES.iter().copied().filter(|m| m.week > week).take(3).collect()
}

pub fn share_text(state: &PregnancyState) -> String {
    format!(
        "🤰 My pregnancy: {} weeks - {} trimester. Followed with Maman & Bébé ❤️",
        state.current_week,
        trimester_label(state.trimester)
    )
}

/// Local view of the active pregnancy and the development panel.
#[derive(Debug, Default)]
pub struct PregnancyViewModel {
    state: Option<PregnancyState>,
    development: Option<BabyDevelopment>,
}

impl PregnancyViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&PregnancyState> {
        self.state.as_ref()
    }

    pub fn development(&self) -> Option<&BabyDevelopment> {
        self.development.as_ref()
    }

    pub fn is_registered(&self) -> bool {
        self.state.is_some()
    }

    /// Replaces the cached state with a fresh server copy and re-derives the
    /// week against `today`. Clearing the state also clears the development panel.
    pub fn replace(&mut self, state: Option<PregnancyState>, today: NaiveDate) {
        if state.is_none() {
            self.development = None;
        }
        self.state = state;
        self.recompute_week(today);
    }

    pub fn set_development(&mut self, development: Option<BabyDevelopment>) {
        self.development = development;
    }

    /// Re-derives the current week from the wall clock. Returns true when the
    /// cached week changed and dependents must re-render.
    pub fn recompute_week(&mut self, today: NaiveDate) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        let week = week_for(state.start_date, today);
        if week == state.current_week {
            return false;
        }
        log::info!("Pregnancy week advanced from {} to {}", state.current_week, week);
        state.current_week = week;
        state.trimester = trimester_for(week);
        true
    }

    pub fn next_milestones(&self) -> Vec<Milestone> {
        self.state
            .as_ref()
            .map(|s| next_milestones(s.current_week))
            .unwrap_or_default()
    }
}
