use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::persona::Persona;
use crate::stats::Stats;

/// Named once-per-day care tasks, reset at every calendar-day rollover.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTasks {
    pub greeted: bool,
    pub fed: bool,
    pub played: bool,
    pub tidied: bool,
    pub checked_in: bool,
}

impl DailyTasks {
    pub const TOTAL: usize = 5;

    pub fn all_done(&self) -> bool {
        self.greeted && self.fed && self.played && self.tidied && self.checked_in
    }

    pub fn done_count(&self) -> usize {
        [self.greeted, self.fed, self.played, self.tidied, self.checked_in]
            .iter()
            .filter(|done| **done)
            .count()
    }

    pub fn reset(&mut self) {
        *self = DailyTasks::default();
    }
}

/// Tag summarizing the most recent rollover or significant action.
/// Flavor-text context only; never feeds back into numeric state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTag {
    FirstMeeting,
    Neutral,
    NeglectedHunger,
    NeglectedHappiness,
    NeglectedAffection,
    CaredForWell,
    IncidentOccurred,
    FedWell,
    PlayedWith,
    CleanedSpace,
    GotHeadpats,
    WokeUp,
}

impl std::fmt::Display for MemoryTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MemoryTag::FirstMeeting => "first_meeting",
            MemoryTag::Neutral => "neutral",
            MemoryTag::NeglectedHunger => "neglected_hunger",
            MemoryTag::NeglectedHappiness => "neglected_happiness",
            MemoryTag::NeglectedAffection => "neglected_affection",
            MemoryTag::CaredForWell => "cared_for_well",
            MemoryTag::IncidentOccurred => "incident_occurred",
            MemoryTag::FedWell => "fed_well",
            MemoryTag::PlayedWith => "played_with",
            MemoryTag::CleanedSpace => "cleaned_space",
            MemoryTag::GotHeadpats => "got_headpats",
            MemoryTag::WokeUp => "woke_up",
        };
        write!(f, "{}", name)
    }
}

/// The persisted state of one persona's companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub stats: Stats,
    pub is_napping: bool,
    pub last_update: DateTime<Utc>,
    pub daily_tasks: DailyTasks,
    pub streak_count: u32,
    pub last_rollover_date: Option<NaiveDate>,
    pub last_memory: MemoryTag,
    pub incident_active: bool,
    pub incident_blame: Option<Persona>,
}

impl StatSnapshot {
    /// Default mid-range state for a persona seen for the first time.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        StatSnapshot {
            stats: Stats::default(),
            is_napping: false,
            last_update: now,
            daily_tasks: DailyTasks::default(),
            streak_count: 0,
            last_rollover_date: None,
            last_memory: MemoryTag::Neutral,
            incident_active: false,
            incident_blame: None,
        }
    }
}
