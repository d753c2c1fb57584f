use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;

use crate::persona::Persona;
use crate::snapshot::{MemoryTag, StatSnapshot};
use crate::stats::{StatKind, MAX_STAT_VALUE};

/// One simulation interval of wall-clock time.
pub const TICK_DURATION_SECS: f64 = 5.0;

// Per-interval decay rates while awake
pub const HUNGER_DECAY_RATE: f64 = 1.0;
pub const HAPPINESS_DECAY_RATE: f64 = 1.0;
pub const ENERGY_DECAY_RATE: f64 = 0.5;
pub const AFFECTION_DECAY_RATE: f64 = 0.2;

// Per-interval rates while napping
pub const NAP_ENERGY_GAIN_RATE: f64 = 5.0;
pub const NAP_HAPPINESS_LOSS: f64 = 1.0;

pub const INCIDENT_CHANCE: f64 = 0.25;
pub const INCIDENT_HAPPINESS_PENALTY: f64 = -15.0;
pub const STREAK_HAPPINESS_BONUS: f64 = 5.0;
pub const STREAK_AFFECTION_BONUS: f64 = 5.0;

/// Uniform [0, 1) random source, injected so the incident roll at rollover
/// can be pinned in tests.
pub trait Dice {
    fn roll(&mut self) -> f64;
}

pub struct StdDice;

impl Dice for StdDice {
    fn roll(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Dice that always land on the given value.
#[cfg(test)]
pub struct FixedDice(pub f64);

#[cfg(test)]
impl Dice for FixedDice {
    fn roll(&mut self) -> f64 {
        self.0
    }
}

/// Applies elapsed-time decay (or nap regeneration) since the snapshot's
/// last update. Linear extrapolation regardless of gap length; stats clamp
/// at the bounds, so a week offline saturates rather than overflowing.
///
/// Returns false when less than a tenth of an interval has passed, in which
/// case nothing changes. Calling twice with the same `now` is therefore a
/// no-op the second time.
pub fn reconcile_elapsed(snapshot: &mut StatSnapshot, now: DateTime<Utc>) -> bool {
    let elapsed_secs = (now - snapshot.last_update).num_milliseconds() as f64 / 1000.0;
    let intervals = elapsed_secs / TICK_DURATION_SECS;
    if intervals < 0.1 {
        return false;
    }

    if snapshot.is_napping {
        snapshot
            .stats
            .apply_delta(StatKind::Energy, NAP_ENERGY_GAIN_RATE * intervals);
        snapshot
            .stats
            .apply_delta(StatKind::Happiness, -NAP_HAPPINESS_LOSS * intervals);
        snapshot
            .stats
            .apply_delta(StatKind::Hunger, -(HUNGER_DECAY_RATE / 2.0) * intervals);
        if snapshot.stats.energy >= MAX_STAT_VALUE {
            // Fully rested: auto-wake
            snapshot.is_napping = false;
        }
    } else {
        snapshot
            .stats
            .apply_delta(StatKind::Hunger, -HUNGER_DECAY_RATE * intervals);
        snapshot
            .stats
            .apply_delta(StatKind::Happiness, -HAPPINESS_DECAY_RATE * intervals);
        snapshot
            .stats
            .apply_delta(StatKind::Energy, -ENERGY_DECAY_RATE * intervals);
        snapshot
            .stats
            .apply_delta(StatKind::Affection, -AFFECTION_DECAY_RATE * intervals);
    }

    snapshot.last_update = now;
    true
}

/// What a rollover pass did, surfaced so the caller knows whether to persist
/// and whether to refresh flavor text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverOutcome {
    NotDue,
    FirstMeeting,
    Completed {
        incident_injected: bool,
        streak_extended: bool,
    },
}

/// Runs the once-per-calendar-day rollover if `today` differs from the last
/// processed date. Multi-day gaps are treated as a single day boundary: one
/// memory evaluation, one incident roll, at most one streak reset.
pub fn daily_rollover_if_due(
    snapshot: &mut StatSnapshot,
    today: NaiveDate,
    persona: Persona,
    dice: &mut dyn Dice,
) -> RolloverOutcome {
    let last = match snapshot.last_rollover_date {
        None => {
            // First run ever: just record the date, no further logic.
            snapshot.last_rollover_date = Some(today);
            snapshot.last_memory = MemoryTag::FirstMeeting;
            snapshot.incident_active = false;
            snapshot.incident_blame = None;
            return RolloverOutcome::FirstMeeting;
        }
        Some(date) => date,
    };
    if last == today {
        return RolloverOutcome::NotDue;
    }

    // Evaluate yesterday's ending state, worst neglect first
    let mut memory = if snapshot.stats.hunger < 30.0 {
        MemoryTag::NeglectedHunger
    } else if snapshot.stats.happiness < 40.0 {
        MemoryTag::NeglectedHappiness
    } else if snapshot.stats.affection < 50.0 {
        MemoryTag::NeglectedAffection
    } else if snapshot.daily_tasks.all_done() {
        MemoryTag::CaredForWell
    } else {
        MemoryTag::Neutral
    };

    let mut incident_injected = false;
    if !snapshot.incident_active && dice.roll() < INCIDENT_CHANCE {
        snapshot.incident_active = true;
        snapshot.incident_blame = Some(persona.other());
        snapshot
            .stats
            .apply_delta(StatKind::Happiness, INCIDENT_HAPPINESS_PENALTY);
        memory = MemoryTag::IncidentOccurred;
        incident_injected = true;
    }

    let streak_extended = snapshot.daily_tasks.all_done();
    if streak_extended {
        snapshot.streak_count += 1;
        snapshot
            .stats
            .apply_delta(StatKind::Happiness, STREAK_HAPPINESS_BONUS);
        snapshot
            .stats
            .apply_delta(StatKind::Affection, STREAK_AFFECTION_BONUS);
    } else {
        snapshot.streak_count = 0;
    }

    snapshot.daily_tasks.reset();
    snapshot.last_rollover_date = Some(today);
    snapshot.last_memory = memory;

    RolloverOutcome::Completed {
        incident_injected,
        streak_extended,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_snapshot() -> StatSnapshot {
        StatSnapshot::fresh(Utc::now())
    }

    #[test]
    fn test_offline_decay_is_deterministic() {
        let start = Utc::now();
        let mut snapshot = base_snapshot();
        snapshot.last_update = start;
        snapshot.stats.hunger = 80.0;

        // 50 seconds = 10 intervals of 5s at 1.0 hunger per interval
        let changed = reconcile_elapsed(&mut snapshot, start + Duration::seconds(50));
        assert!(changed);
        assert_eq!(snapshot.stats.hunger, 70.0);
    }

    #[test]
    fn test_reconcile_is_idempotent_for_same_now() {
        let start = Utc::now();
        let now = start + Duration::seconds(30);
        let mut snapshot = base_snapshot();
        snapshot.last_update = start;

        assert!(reconcile_elapsed(&mut snapshot, now));
        let after_first = snapshot.clone();
        assert!(!reconcile_elapsed(&mut snapshot, now));
        assert_eq!(snapshot, after_first);
    }

    #[test]
    fn test_sub_interval_elapsed_is_a_noop() {
        let start = Utc::now();
        let mut snapshot = base_snapshot();
        snapshot.last_update = start;
        let before = snapshot.clone();

        // 0.4s is below the 0.1-interval threshold
        assert!(!reconcile_elapsed(&mut snapshot, start + Duration::milliseconds(400)));
        assert_eq!(snapshot, before);
    }

    #[test]
    fn test_nap_regenerates_and_auto_wakes() {
        let start = Utc::now();
        let mut snapshot = base_snapshot();
        snapshot.last_update = start;
        snapshot.is_napping = true;
        snapshot.stats.energy = 97.0;

        // 3 intervals at +5 energy per interval: 97 + 15 clamps to 100
        reconcile_elapsed(&mut snapshot, start + Duration::seconds(15));
        assert_eq!(snapshot.stats.energy, 100.0);
        assert!(!snapshot.is_napping);
    }

    #[test]
    fn test_nap_halves_hunger_decay() {
        let start = Utc::now();
        let mut snapshot = base_snapshot();
        snapshot.last_update = start;
        snapshot.is_napping = true;
        snapshot.stats.hunger = 80.0;
        snapshot.stats.energy = 10.0;

        reconcile_elapsed(&mut snapshot, start + Duration::seconds(50));
        assert_eq!(snapshot.stats.hunger, 75.0);
    }

    #[test]
    fn test_long_absence_saturates_at_bounds() {
        let start = Utc::now();
        let mut snapshot = base_snapshot();
        snapshot.last_update = start;

        reconcile_elapsed(&mut snapshot, start + Duration::days(7));
        assert_eq!(snapshot.stats.hunger, 0.0);
        assert_eq!(snapshot.stats.happiness, 0.0);
        assert_eq!(snapshot.stats.energy, 0.0);
        assert_eq!(snapshot.stats.affection, 0.0);
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_first_run_only_records_the_date() {
        let mut snapshot = base_snapshot();
        let mut dice = FixedDice(0.0); // would inject an incident if rolled

        let outcome = daily_rollover_if_due(&mut snapshot, day("2026-08-30"), Persona::Mika, &mut dice);
        assert_eq!(outcome, RolloverOutcome::FirstMeeting);
        assert_eq!(snapshot.last_memory, MemoryTag::FirstMeeting);
        assert!(!snapshot.incident_active);
        assert_eq!(snapshot.last_rollover_date, Some(day("2026-08-30")));
    }

    #[test]
    fn test_rollover_runs_at_most_once_per_day() {
        let mut snapshot = base_snapshot();
        snapshot.last_rollover_date = Some(day("2026-08-29"));
        let mut dice = FixedDice(0.9);

        let first = daily_rollover_if_due(&mut snapshot, day("2026-08-30"), Persona::Mika, &mut dice);
        assert!(matches!(first, RolloverOutcome::Completed { .. }));

        let before = snapshot.clone();
        let second = daily_rollover_if_due(&mut snapshot, day("2026-08-30"), Persona::Mika, &mut dice);
        assert_eq!(second, RolloverOutcome::NotDue);
        assert_eq!(snapshot, before);
    }

    #[test]
    fn test_streak_increments_when_all_tasks_done() {
        let mut snapshot = base_snapshot();
        snapshot.last_rollover_date = Some(day("2026-08-29"));
        snapshot.streak_count = 11;
        snapshot.daily_tasks.greeted = true;
        snapshot.daily_tasks.fed = true;
        snapshot.daily_tasks.played = true;
        snapshot.daily_tasks.tidied = true;
        snapshot.daily_tasks.checked_in = true;
        let happiness_before = snapshot.stats.happiness;

        let outcome =
            daily_rollover_if_due(&mut snapshot, day("2026-08-30"), Persona::Mika, &mut FixedDice(0.9));
        assert_eq!(
            outcome,
            RolloverOutcome::Completed {
                incident_injected: false,
                streak_extended: true
            }
        );
        assert_eq!(snapshot.streak_count, 12);
        assert_eq!(snapshot.stats.happiness, (happiness_before + 5.0).min(100.0));
        assert_eq!(snapshot.daily_tasks.done_count(), 0);
    }

    #[test]
    fn test_streak_resets_when_any_task_missed() {
        let mut snapshot = base_snapshot();
        snapshot.last_rollover_date = Some(day("2026-08-29"));
        snapshot.streak_count = 11;
        snapshot.daily_tasks.greeted = true;
        snapshot.daily_tasks.fed = true;

        daily_rollover_if_due(&mut snapshot, day("2026-08-30"), Persona::Mika, &mut FixedDice(0.9));
        assert_eq!(snapshot.streak_count, 0);
    }

    #[test]
    fn test_incident_injection_and_blame() {
        let mut snapshot = base_snapshot();
        snapshot.last_rollover_date = Some(day("2026-08-29"));
        let happiness_before = snapshot.stats.happiness;

        let outcome =
            daily_rollover_if_due(&mut snapshot, day("2026-08-30"), Persona::Mika, &mut FixedDice(0.1));
        assert_eq!(
            outcome,
            RolloverOutcome::Completed {
                incident_injected: true,
                streak_extended: false
            }
        );
        assert!(snapshot.incident_active);
        assert_eq!(snapshot.incident_blame, Some(Persona::Kana));
        assert_eq!(snapshot.last_memory, MemoryTag::IncidentOccurred);
        assert_eq!(snapshot.stats.happiness, happiness_before - 15.0);
    }

    #[test]
    fn test_no_incident_when_dice_miss() {
        let mut snapshot = base_snapshot();
        snapshot.last_rollover_date = Some(day("2026-08-29"));

        daily_rollover_if_due(&mut snapshot, day("2026-08-30"), Persona::Kana, &mut FixedDice(0.25));
        assert!(!snapshot.incident_active);
        assert_eq!(snapshot.incident_blame, None);
    }

    #[test]
    fn test_active_incident_is_not_rerolled() {
        let mut snapshot = base_snapshot();
        snapshot.last_rollover_date = Some(day("2026-08-29"));
        snapshot.incident_active = true;
        snapshot.incident_blame = Some(Persona::Kana);
        let happiness_before = snapshot.stats.happiness;

        let outcome =
            daily_rollover_if_due(&mut snapshot, day("2026-08-30"), Persona::Mika, &mut FixedDice(0.0));
        assert_eq!(
            outcome,
            RolloverOutcome::Completed {
                incident_injected: false,
                streak_extended: false
            }
        );
        // No second penalty while the first mess is still waiting
        assert_eq!(snapshot.stats.happiness, happiness_before);
    }

    #[test]
    fn test_multi_day_gap_is_a_single_rollover() {
        let mut snapshot = base_snapshot();
        snapshot.last_rollover_date = Some(day("2026-08-20"));
        snapshot.streak_count = 4;

        daily_rollover_if_due(&mut snapshot, day("2026-08-30"), Persona::Mika, &mut FixedDice(0.9));
        assert_eq!(snapshot.streak_count, 0);
        assert_eq!(snapshot.last_rollover_date, Some(day("2026-08-30")));
    }

    #[test]
    fn test_neglect_memory_priority() {
        let mut snapshot = base_snapshot();
        snapshot.last_rollover_date = Some(day("2026-08-29"));
        snapshot.stats.hunger = 20.0;
        snapshot.stats.happiness = 30.0;

        daily_rollover_if_due(&mut snapshot, day("2026-08-30"), Persona::Mika, &mut FixedDice(0.9));
        // Hunger neglect outranks happiness neglect
        assert_eq!(snapshot.last_memory, MemoryTag::NeglectedHunger);
    }
}
