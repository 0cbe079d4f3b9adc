use crate::model::{Creature, DecayMode, LifecycleState, Rules, StateSnapshot};

impl Creature {
    /// Advance the simulation by one tick. `elapsed_ms` is the wall-clock time
    /// since the previous tick; negative values count as zero.
    pub(crate) fn update(&mut self, elapsed_ms: i64, rules: &Rules) -> StateSnapshot {
        let elapsed = elapsed_ms.max(0) as u64;
        self.elapsed_ms_since_last = elapsed;
        self.elapsed_ms_total = self.elapsed_ms_total.saturating_add(elapsed);

        self.tick_count += 1;

        if self.lifecycle_state == LifecycleState::Egg {
            // progress uses the heat from before this tick's decay
            self.hatch_progress += elapsed as f64 * self.heat / rules.hatch_ms_at_full_heat;

            let decay = match rules.decay_mode {
                DecayMode::PerTick => self.heat / rules.heat_decay_divisor,
                DecayMode::PerElapsed => {
                    let ticks = elapsed as f64 / rules.nominal_tick_ms.max(1) as f64;
                    self.heat * ticks / rules.heat_decay_divisor
                }
            };
            self.heat = (self.heat - decay).clamp(0.0, 1.0);

            if self.hatch_progress >= 1.0 {
                self.lifecycle_state = LifecycleState::Hatching;
                self.hatch_transition_tick = Some(self.tick_count);
                log::info!(
                    "egg hatching at tick {} after {} ms",
                    self.tick_count,
                    self.elapsed_ms_total
                );
            }
        }

        if self.lifecycle_state == LifecycleState::Hatching {
            let started = match self.hatch_transition_tick {
                Some(t) => t,
                None => unreachable!("hatching without a transition tick"),
            };
            if self.tick_count >= started.saturating_add(rules.hatching_window_ticks) {
                self.lifecycle_state = LifecycleState::Idle;
                log::info!("creature idle at tick {}", self.tick_count);
            }
        }

        self.snapshot()
    }

    /// Warm the egg. Returns false (and changes nothing) once it has hatched.
    pub(crate) fn apply_heat_boost(&mut self, rules: &Rules) -> bool {
        if self.lifecycle_state != LifecycleState::Egg {
            return false;
        }
        self.heat = (self.heat + rules.heat_boost).clamp(0.0, 1.0);
        log::trace!("heat boost -> {:.3}", self.heat);
        true
    }
}

/// Turns monotonic time-source reads into per-tick deltas.
#[derive(Clone, Debug, Default)]
pub(crate) struct ElapsedClock {
    last_ms: Option<i64>,
}

impl ElapsedClock {
    pub(crate) fn new() -> Self {
        Self { last_ms: None }
    }

    /// Milliseconds since the previous call. The first call only records the
    /// baseline and returns 0; a clock that steps backwards also yields 0.
    pub(crate) fn advance(&mut self, now_ms: i64) -> i64 {
        let delta = match self.last_ms {
            Some(last) => now_ms.saturating_sub(last).max(0),
            None => 0,
        };
        self.last_ms = Some(match self.last_ms {
            Some(last) => last.max(now_ms),
            None => now_ms,
        });
        delta
    }
}
