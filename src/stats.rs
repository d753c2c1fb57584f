use serde::{Deserialize, Serialize};

pub const MIN_STAT_VALUE: f64 = 0.0;
pub const MAX_STAT_VALUE: f64 = 100.0;

/// The four bounded companion stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Hunger,
    Happiness,
    Energy,
    Affection,
}

impl std::fmt::Display for StatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatKind::Hunger => write!(f, "hunger"),
            StatKind::Happiness => write!(f, "happiness"),
            StatKind::Energy => write!(f, "energy"),
            StatKind::Affection => write!(f, "affection"),
        }
    }
}

/// Stat ledger: holds the four values and applies clamped deltas.
/// Every value stays within [0, 100] after any sequence of mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub hunger: f64,
    pub happiness: f64,
    pub energy: f64,
    pub affection: f64,
}

impl Default for Stats {
    fn default() -> Self {
        // Mid-range starting values for a first meeting
        Stats {
            hunger: 80.0,
            happiness: 80.0,
            energy: 90.0,
            affection: 70.0,
        }
    }
}

impl Stats {
    /// Adds `amount` (positive or negative) to the named stat and clamps
    /// the result. Out-of-range results are silently clamped, never rejected.
    pub fn apply_delta(&mut self, kind: StatKind, amount: f64) {
        let slot = self.slot_mut(kind);
        *slot = clamp(*slot + amount);
    }

    pub fn read(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::Hunger => self.hunger,
            StatKind::Happiness => self.happiness,
            StatKind::Energy => self.energy,
            StatKind::Affection => self.affection,
        }
    }

    fn slot_mut(&mut self, kind: StatKind) -> &mut f64 {
        match kind {
            StatKind::Hunger => &mut self.hunger,
            StatKind::Happiness => &mut self.happiness,
            StatKind::Energy => &mut self.energy,
            StatKind::Affection => &mut self.affection,
        }
    }

    /// Re-clamps every stat. Used after deserializing a snapshot so a
    /// hand-edited or stale file cannot smuggle out-of-range values in.
    pub fn clamp_all(&mut self) {
        self.hunger = clamp(self.hunger);
        self.happiness = clamp(self.happiness);
        self.energy = clamp(self.energy);
        self.affection = clamp(self.affection);
    }
}

fn clamp(value: f64) -> f64 {
    value.max(MIN_STAT_VALUE).min(MAX_STAT_VALUE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [StatKind; 4] = [
        StatKind::Hunger,
        StatKind::Happiness,
        StatKind::Energy,
        StatKind::Affection,
    ];

    #[test]
    fn test_deltas_stay_clamped() {
        let mut stats = Stats::default();
        let deltas = [250.0, -40.0, -500.0, 3.5, 99.9, -0.1, 1000.0, -1000.0];

        for kind in ALL_KINDS {
            for delta in deltas {
                stats.apply_delta(kind, delta);
                let value = stats.read(kind);
                assert!(
                    (MIN_STAT_VALUE..=MAX_STAT_VALUE).contains(&value),
                    "{} out of range after delta {}: {}",
                    kind,
                    delta,
                    value
                );
            }
        }
    }

    #[test]
    fn test_delta_applies_exactly_within_range() {
        let mut stats = Stats::default();
        stats.apply_delta(StatKind::Hunger, -30.0);
        assert_eq!(stats.hunger, 50.0);
        stats.apply_delta(StatKind::Hunger, 10.0);
        assert_eq!(stats.hunger, 60.0);
    }

    #[test]
    fn test_saturation_at_bounds() {
        let mut stats = Stats::default();
        stats.apply_delta(StatKind::Affection, 999.0);
        assert_eq!(stats.affection, MAX_STAT_VALUE);
        stats.apply_delta(StatKind::Affection, -999.0);
        assert_eq!(stats.affection, MIN_STAT_VALUE);
    }

    #[test]
    fn test_clamp_all_repairs_out_of_range_values() {
        let mut stats = Stats {
            hunger: -12.0,
            happiness: 140.0,
            energy: 50.0,
            affection: 100.0,
        };
        stats.clamp_all();
        assert_eq!(stats.hunger, 0.0);
        assert_eq!(stats.happiness, 100.0);
        assert_eq!(stats.energy, 50.0);
        assert_eq!(stats.affection, 100.0);
    }
}
