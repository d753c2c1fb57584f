use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persona::Persona;
use crate::snapshot::{MemoryTag, StatSnapshot};
use crate::stats::StatKind;

// Action stat effects
pub const FEED_HUNGER_GAIN: f64 = 30.0;
pub const FEED_HAPPINESS_GAIN: f64 = 5.0;
pub const PLAY_HAPPINESS_GAIN: f64 = 25.0;
pub const PLAY_ENERGY_LOSS: f64 = 15.0;
pub const CLEAN_HAPPINESS_GAIN: f64 = 5.0;
pub const HEADPAT_HAPPINESS_GAIN: f64 = 10.0;
pub const HEADPAT_AFFECTION_GAIN: f64 = 15.0;
pub const DAILY_TASK_AFFECTION_BONUS: f64 = 5.0;

// Relief bonus for cleaning up an active incident
pub const INCIDENT_CLEAN_HAPPINESS_GAIN: f64 = 20.0;
pub const INCIDENT_CLEAN_AFFECTION_GAIN: f64 = 10.0;

/// Discrete mood derived fresh from the current stats on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Sleepy,
    Grumpy,
    Hungry,
    Needy,
    Playful,
    Happy,
    Content,
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mood::Sleepy => "sleepy",
            Mood::Grumpy => "grumpy",
            Mood::Hungry => "hungry",
            Mood::Needy => "needy",
            Mood::Playful => "playful",
            Mood::Happy => "happy",
            Mood::Content => "content",
        };
        write!(f, "{}", name)
    }
}

impl Mood {
    pub fn emoji(self, persona: Persona) -> &'static str {
        match (self, persona) {
            (Mood::Sleepy, _) => "😴",
            (Mood::Hungry, Persona::Mika) => "🥺",
            (Mood::Hungry, Persona::Kana) => "😠",
            (Mood::Grumpy, Persona::Mika) => "😠",
            (Mood::Grumpy, Persona::Kana) => "💢",
            (Mood::Needy, Persona::Mika) => "🥺",
            (Mood::Needy, Persona::Kana) => "😒",
            (Mood::Playful, Persona::Mika) => "🥳",
            (Mood::Playful, Persona::Kana) => "😼",
            (Mood::Happy, Persona::Mika) => "💖",
            (Mood::Happy, Persona::Kana) => "😌",
            (Mood::Content, Persona::Mika) => "😊",
            (Mood::Content, Persona::Kana) => "😑",
        }
    }
}

/// Derives the current mood in strict priority order; first match wins.
/// An unresolved incident always dominates the numeric moods.
pub fn derive_mood(snapshot: &StatSnapshot) -> Mood {
    let stats = &snapshot.stats;
    if snapshot.is_napping {
        Mood::Sleepy
    } else if snapshot.incident_active {
        Mood::Grumpy
    } else if stats.hunger < 25.0 {
        Mood::Hungry
    } else if stats.happiness < 35.0 {
        Mood::Grumpy
    } else if stats.affection < 40.0 && stats.happiness < 50.0 {
        Mood::Needy
    } else if stats.energy < 30.0 {
        Mood::Sleepy
    } else if stats.happiness > 80.0 && stats.energy > 60.0 {
        Mood::Playful
    } else if stats.happiness > 70.0 && stats.affection > 70.0 {
        Mood::Happy
    } else {
        Mood::Content
    }
}

/// User actions exposed by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Feed,
    Play,
    Clean,
    NapToggle,
    Headpat,
    CheckIn,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Feed => "feed",
            Action::Play => "play",
            Action::Clean => "clean",
            Action::NapToggle => "nap",
            Action::Headpat => "headpat",
            Action::CheckIn => "checkin",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "feed" => Ok(Action::Feed),
            "play" => Ok(Action::Play),
            "clean" => Ok(Action::Clean),
            "nap" | "nap_toggle" => Ok(Action::NapToggle),
            "headpat" => Ok(Action::Headpat),
            "checkin" | "check_in" => Ok(Action::CheckIn),
            _ => Err(anyhow!(
                "Unknown action: {} (expected feed, play, clean, nap, headpat or checkin)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Napping,
    IncidentActive,
    NotNeeded,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::Napping => write!(f, "she's napping right now"),
            BlockReason::IncidentActive => write!(f, "there's a mess to clean up first"),
            BlockReason::NotNeeded => write!(f, "no need for that right now"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    IncidentResolved,
    Blocked(BlockReason),
}

impl ActionOutcome {
    pub fn is_applied(self) -> bool {
        !matches!(self, ActionOutcome::Blocked(_))
    }
}

/// Applies one user action to the snapshot, honoring the gating rules.
/// While an incident is active only cleaning works, and cleaning then
/// resolves the incident with a larger relief bonus instead of the
/// ordinary light tidy-up.
pub fn apply_action(snapshot: &mut StatSnapshot, action: Action, now: DateTime<Utc>) -> ActionOutcome {
    if snapshot.incident_active && action != Action::Clean {
        return ActionOutcome::Blocked(BlockReason::IncidentActive);
    }

    match action {
        Action::Feed => {
            if snapshot.is_napping {
                return ActionOutcome::Blocked(BlockReason::Napping);
            }
            if snapshot.stats.hunger > 85.0 {
                return ActionOutcome::Blocked(BlockReason::NotNeeded);
            }
            snapshot.stats.apply_delta(StatKind::Hunger, FEED_HUNGER_GAIN);
            snapshot
                .stats
                .apply_delta(StatKind::Happiness, FEED_HAPPINESS_GAIN);
            mark_fed(snapshot);
            snapshot.last_memory = MemoryTag::FedWell;
            ActionOutcome::Applied
        }
        Action::Play => {
            if snapshot.is_napping {
                return ActionOutcome::Blocked(BlockReason::Napping);
            }
            if snapshot.stats.energy < 20.0 || snapshot.stats.happiness > 90.0 {
                return ActionOutcome::Blocked(BlockReason::NotNeeded);
            }
            snapshot
                .stats
                .apply_delta(StatKind::Happiness, PLAY_HAPPINESS_GAIN);
            snapshot.stats.apply_delta(StatKind::Energy, -PLAY_ENERGY_LOSS);
            mark_played(snapshot);
            snapshot.last_memory = MemoryTag::PlayedWith;
            ActionOutcome::Applied
        }
        Action::Clean => {
            if snapshot.is_napping {
                return ActionOutcome::Blocked(BlockReason::Napping);
            }
            if snapshot.incident_active {
                snapshot.incident_active = false;
                snapshot.incident_blame = None;
                snapshot
                    .stats
                    .apply_delta(StatKind::Happiness, INCIDENT_CLEAN_HAPPINESS_GAIN);
                snapshot
                    .stats
                    .apply_delta(StatKind::Affection, INCIDENT_CLEAN_AFFECTION_GAIN);
                mark_tidied(snapshot);
                snapshot.last_memory = MemoryTag::CleanedSpace;
                return ActionOutcome::IncidentResolved;
            }
            snapshot
                .stats
                .apply_delta(StatKind::Happiness, CLEAN_HAPPINESS_GAIN);
            mark_tidied(snapshot);
            snapshot.last_memory = MemoryTag::CleanedSpace;
            ActionOutcome::Applied
        }
        Action::NapToggle => {
            if snapshot.is_napping {
                snapshot.is_napping = false;
                snapshot.last_memory = MemoryTag::WokeUp;
            } else {
                if snapshot.stats.energy > 90.0 {
                    return ActionOutcome::Blocked(BlockReason::NotNeeded);
                }
                snapshot.is_napping = true;
            }
            // Rates change at the toggle boundary; pending elapsed time must
            // not be billed at the new rates.
            snapshot.last_update = now;
            ActionOutcome::Applied
        }
        Action::Headpat => {
            if snapshot.is_napping {
                return ActionOutcome::Blocked(BlockReason::Napping);
            }
            if snapshot.stats.affection > 95.0 {
                return ActionOutcome::Blocked(BlockReason::NotNeeded);
            }
            snapshot
                .stats
                .apply_delta(StatKind::Happiness, HEADPAT_HAPPINESS_GAIN);
            snapshot
                .stats
                .apply_delta(StatKind::Affection, HEADPAT_AFFECTION_GAIN);
            mark_greeted(snapshot);
            snapshot.last_memory = MemoryTag::GotHeadpats;
            ActionOutcome::Applied
        }
        Action::CheckIn => {
            if snapshot.daily_tasks.checked_in {
                return ActionOutcome::Blocked(BlockReason::NotNeeded);
            }
            snapshot.daily_tasks.checked_in = true;
            snapshot
                .stats
                .apply_delta(StatKind::Affection, DAILY_TASK_AFFECTION_BONUS);
            ActionOutcome::Applied
        }
    }
}

// First use per day marks the task and grants a one-time affection bonus.

fn mark_fed(snapshot: &mut StatSnapshot) {
    if !snapshot.daily_tasks.fed {
        snapshot.daily_tasks.fed = true;
        snapshot
            .stats
            .apply_delta(StatKind::Affection, DAILY_TASK_AFFECTION_BONUS);
    }
}

fn mark_played(snapshot: &mut StatSnapshot) {
    if !snapshot.daily_tasks.played {
        snapshot.daily_tasks.played = true;
        snapshot
            .stats
            .apply_delta(StatKind::Affection, DAILY_TASK_AFFECTION_BONUS);
    }
}

fn mark_tidied(snapshot: &mut StatSnapshot) {
    if !snapshot.daily_tasks.tidied {
        snapshot.daily_tasks.tidied = true;
        snapshot
            .stats
            .apply_delta(StatKind::Affection, DAILY_TASK_AFFECTION_BONUS);
    }
}

fn mark_greeted(snapshot: &mut StatSnapshot) {
    if !snapshot.daily_tasks.greeted {
        snapshot.daily_tasks.greeted = true;
        snapshot
            .stats
            .apply_delta(StatKind::Affection, DAILY_TASK_AFFECTION_BONUS);
    }
}
