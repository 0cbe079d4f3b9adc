use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub(crate) enum LifecycleState {
    Egg,
    Hatching,
    Idle,
    // Sleeping, Sick, Hungry, Dirty, Bored and Dead are reserved; nothing
    // transitions into them yet.
}

impl LifecycleState {
    pub(crate) fn label(self) -> &'static str {
        match self {
            LifecycleState::Egg => "Egg",
            LifecycleState::Hatching => "Hatching",
            LifecycleState::Idle => "Idle",
        }
    }
}

/// How heat decay relates to the tick rate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum DecayMode {
    /// `heat / divisor` once per update call, whatever the spacing.
    PerTick,
    /// Same rate at `nominal_tick_ms` spacing, scaled by the actual elapsed time.
    PerElapsed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Rules {
    pub(crate) hatch_ms_at_full_heat: f64, // 1 hour of heat 1.0 hatches
    pub(crate) heat_decay_divisor: f64,
    pub(crate) heat_boost: f64,
    pub(crate) hatching_window_ticks: u64,
    pub(crate) decay_mode: DecayMode,
    pub(crate) nominal_tick_ms: u64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            hatch_ms_at_full_heat: 3_600_000.0,
            heat_decay_divisor: 12_000.0,
            heat_boost: 0.01,
            hatching_window_ticks: 60,
            decay_mode: DecayMode::PerTick,
            nominal_tick_ms: 100,
        }
    }
}

/// The single pet. Mutated only through `update` and `apply_heat_boost`.
#[derive(Clone, Debug)]
pub(crate) struct Creature {
    pub(crate) lifecycle_state: LifecycleState,
    pub(crate) hatch_progress: f64,
    pub(crate) heat: f64,
    pub(crate) hatch_transition_tick: Option<u64>,
    pub(crate) tick_count: u64,
    pub(crate) elapsed_ms_total: u64,
    pub(crate) elapsed_ms_since_last: u64,
}

impl Creature {
    pub(crate) fn new() -> Self {
        Self {
            lifecycle_state: LifecycleState::Egg,
            hatch_progress: 0.0,
            heat: 0.0,
            hatch_transition_tick: None,
            tick_count: 0,
            elapsed_ms_total: 0,
            elapsed_ms_since_last: 0,
        }
    }

    pub(crate) fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            lifecycle_state: self.lifecycle_state,
            hatch_progress: self.hatch_progress,
            heat: self.heat,
            tick_count: self.tick_count,
        }
    }
}

impl Default for Creature {
    fn default() -> Self {
        Self::new()
    }
}

/// What a renderer needs to know after a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StateSnapshot {
    pub(crate) lifecycle_state: LifecycleState,
    pub(crate) hatch_progress: f64,
    pub(crate) heat: f64,
    pub(crate) tick_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creature_is_a_cold_egg() {
        let c = Creature::new();
        assert_eq!(c.lifecycle_state, LifecycleState::Egg);
        assert_eq!(c.hatch_progress, 0.0);
        assert_eq!(c.heat, 0.0);
        assert_eq!(c.hatch_transition_tick, None);
        assert_eq!(c.tick_count, 0);
    }

    #[test]
    fn rules_fill_missing_fields_from_defaults() {
        let r: Rules = serde_json::from_str(r#"{ "decay_mode": "per-elapsed" }"#).unwrap();
        assert_eq!(r.decay_mode, DecayMode::PerElapsed);
        assert_eq!(r.hatching_window_ticks, 60);
        assert_eq!(r.heat_decay_divisor, 12_000.0);
    }
}
