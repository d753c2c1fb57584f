use chrono::{DateTime, Utc};
use colored::*;

use crate::flavor::{build_refresh_request, FlavorTextCache};
use crate::mood::{apply_action, derive_mood, Action, ActionOutcome, Mood};
use crate::persona::Persona;
use crate::provider::{CompletionError, CompletionRequest};
use crate::reconcile::{daily_rollover_if_due, reconcile_elapsed, Dice, RolloverOutcome};
use crate::snapshot::{DailyTasks, StatSnapshot};
use crate::store::{load_snapshot, save_snapshot, KvStore, StorageKey};

/// State surfaced to the UI shell on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub hunger: f64,
    pub happiness: f64,
    pub energy: f64,
    pub affection: f64,
    pub mood: Mood,
    pub is_napping: bool,
    pub incident_active: bool,
    pub display_line: String,
    pub tasks_done: usize,
    pub tasks_total: usize,
    pub streak_count: u32,
}

/// A claimed flavor-text fetch, tagged with the session generation so a
/// response that lands after teardown can be recognized and discarded.
#[derive(Debug, Clone)]
pub struct PendingFetch {
    pub generation: u64,
    pub request: CompletionRequest,
}

/// One persona's companion simulation: owns the snapshot, the flavor
/// cache, and the persistence key. All mutation happens through this
/// handle; nothing is shared module-level state.
pub struct GotchiSession {
    persona: Persona,
    user_name: String,
    snapshot: StatSnapshot,
    flavor: FlavorTextCache,
    store: Box<dyn KvStore>,
    key: StorageKey,
    dice: Box<dyn Dice>,
    last_mood: Mood,
    want_refresh: bool,
    generation: u64,
    active: bool,
}

impl GotchiSession {
    /// Loads (or creates) the persisted snapshot, applies decay for the
    /// offline gap, and runs at most one daily rollover pass.
    pub fn initialize(
        persona: Persona,
        user_name: String,
        namespace: &str,
        store: Box<dyn KvStore>,
        dice: Box<dyn Dice>,
        now: DateTime<Utc>,
    ) -> Self {
        let key = StorageKey::new(namespace, persona);
        let snapshot = load_snapshot(store.as_ref(), &key).unwrap_or_else(|| {
            println!("{} {}", "First meeting with".cyan(), persona);
            StatSnapshot::fresh(now)
        });

        let mut session = GotchiSession {
            persona,
            user_name,
            snapshot,
            flavor: FlavorTextCache::new(),
            store,
            key,
            dice,
            last_mood: Mood::Content,
            want_refresh: true,
            generation: 0,
            active: true,
        };

        reconcile_elapsed(&mut session.snapshot, now);
        daily_rollover_if_due(
            &mut session.snapshot,
            now.date_naive(),
            persona,
            session.dice.as_mut(),
        );
        session.last_mood = derive_mood(&session.snapshot);
        session.persist();
        session
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn snapshot(&self) -> &StatSnapshot {
        &self.snapshot
    }

    /// Periodic stat tick: decay, possible rollover if midnight passed
    /// while the session was open, mood re-derivation.
    pub fn tick(&mut self, now: DateTime<Utc>) -> RenderState {
        reconcile_elapsed(&mut self.snapshot, now);
        let outcome = daily_rollover_if_due(
            &mut self.snapshot,
            now.date_naive(),
            self.persona,
            self.dice.as_mut(),
        );
        match outcome {
            RolloverOutcome::NotDue => {}
            RolloverOutcome::FirstMeeting => self.persist(),
            RolloverOutcome::Completed {
                incident_injected, ..
            } => {
                if incident_injected {
                    self.want_refresh = true;
                }
                self.persist();
            }
        }
        self.refresh_mood();
        self.view()
    }

    /// Applies one user action. Blocked actions change nothing and are
    /// reported as such; applied actions are persisted immediately.
    pub fn perform_action(&mut self, action: Action, now: DateTime<Utc>) -> ActionOutcome {
        reconcile_elapsed(&mut self.snapshot, now);
        let outcome = apply_action(&mut self.snapshot, action, now);
        if outcome.is_applied() {
            self.want_refresh = true;
            self.persist();
        }
        self.refresh_mood();
        outcome
    }

    /// Render state without consuming a flavor line.
    pub fn view(&self) -> RenderState {
        self.build_state(String::new())
    }

    /// Render state including a display line drawn from the cache (or a
    /// static fallback).
    pub fn render(&mut self) -> RenderState {
        let line = self.next_line();
        self.build_state(line)
    }

    /// One display line with `{user}` substitution; never empty.
    pub fn next_line(&mut self) -> String {
        let mood = derive_mood(&self.snapshot);
        self.flavor.next_line(
            self.persona,
            mood,
            self.snapshot.incident_active,
            &self.user_name,
        )
    }

    /// Claims a flavor refresh if one is wanted and none is in flight.
    /// Concurrent trigger conditions collapse into a single outstanding
    /// request.
    pub fn flavor_request(&mut self) -> Option<PendingFetch> {
        if !self.active {
            return None;
        }
        if !self.want_refresh && !self.flavor.below_low_water() {
            return None;
        }
        if !self.flavor.begin_fetch() {
            return None;
        }
        self.want_refresh = false;
        let mood = derive_mood(&self.snapshot);
        Some(PendingFetch {
            generation: self.generation,
            request: build_refresh_request(self.persona, &self.user_name, &self.snapshot, mood),
        })
    }

    /// Applies the outcome of a fetch claimed via `flavor_request`.
    /// Responses from a superseded session generation are discarded.
    pub fn apply_flavor(&mut self, generation: u64, result: Result<String, CompletionError>) {
        if generation != self.generation {
            return;
        }
        match result {
            Ok(text) => {
                let count = self.flavor.complete_fetch(&text);
                if count == 0 {
                    eprintln!("{}", "Service returned no usable lines".yellow());
                }
            }
            Err(e) => {
                eprintln!("{} {}", "Flavor text degraded to fallback:".yellow(), e);
                self.flavor.fail_fetch();
            }
        }
    }

    /// Final persistence write; invalidates any in-flight fetch.
    pub fn teardown(&mut self, now: DateTime<Utc>) {
        if !self.active {
            return;
        }
        reconcile_elapsed(&mut self.snapshot, now);
        self.persist();
        self.generation += 1;
        self.flavor.clear();
        self.active = false;
    }

    fn persist(&self) {
        save_snapshot(self.store.as_ref(), &self.key, &self.snapshot);
    }

    fn refresh_mood(&mut self) {
        let mood = derive_mood(&self.snapshot);
        if mood != self.last_mood {
            if !matches!(mood, Mood::Content | Mood::Happy) {
                self.want_refresh = true;
            }
            self.last_mood = mood;
        }
    }

    fn build_state(&self, display_line: String) -> RenderState {
        RenderState {
            hunger: self.snapshot.stats.hunger,
            happiness: self.snapshot.stats.happiness,
            energy: self.snapshot.stats.energy,
            affection: self.snapshot.stats.affection,
            mood: derive_mood(&self.snapshot),
            is_napping: self.snapshot.is_napping,
            incident_active: self.snapshot.incident_active,
            display_line,
            tasks_done: self.snapshot.daily_tasks.done_count(),
            tasks_total: DailyTasks::TOTAL,
            streak_count: self.snapshot.streak_count,
        }
    }
}
