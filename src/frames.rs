use crate::model::{LifecycleState, StateSnapshot};
use serde::{Deserialize, Serialize};

/// Index into the per-state sprite table.
pub(crate) type FrameIndex = usize;

pub(crate) const HATCH_CRACK_START: FrameIndex = 0;
pub(crate) const HATCH_CRACKED_SHELL: FrameIndex = 1;
pub(crate) const HATCH_FIRST_IDLE: FrameIndex = 2;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub(crate) enum EggCadence {
    /// Advance every `round(base / heat)` renders; a cold egg holds still.
    HeatScaled { base: f64 },
    Fixed { period: u64 },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct FrameCadence {
    pub(crate) egg: EggCadence,
    pub(crate) hatch_bucket_width: u64,
    /// Idle loop advances once every this many renders.
    pub(crate) idle_period: u64,
}

impl Default for FrameCadence {
    fn default() -> Self {
        Self {
            egg: EggCadence::HeatScaled { base: 5.0 },
            hatch_bucket_width: 16,
            idle_period: 5,
        }
    }
}

fn two_frame_loop(counter: u64, period: u64) -> FrameIndex {
    ((counter / period.max(1)) % 2) as FrameIndex
}

fn egg_period(cadence: EggCadence, heat: f64) -> Option<u64> {
    match cadence {
        EggCadence::Fixed { period } => Some(period.max(1)),
        EggCadence::HeatScaled { base } => {
            if heat <= 0.0 {
                return None;
            }
            let period = (base / heat).round();
            if !period.is_finite() || period >= u64::MAX as f64 {
                return None;
            }
            Some((period as u64).max(1))
        }
    }
}

/// Pure frame choice for one render. `counter` counts renders since the
/// creature entered its current state.
pub(crate) fn select_frame(
    cadence: &FrameCadence,
    snapshot: &StateSnapshot,
    counter: u64,
) -> FrameIndex {
    match snapshot.lifecycle_state {
        LifecycleState::Egg => match egg_period(cadence.egg, snapshot.heat) {
            Some(period) => two_frame_loop(counter, period),
            None => 0,
        },
        LifecycleState::Hatching => match counter / cadence.hatch_bucket_width.max(1) {
            0 => HATCH_CRACK_START,
            1 => HATCH_CRACKED_SHELL,
            _ => HATCH_FIRST_IDLE,
        },
        LifecycleState::Idle => two_frame_loop(counter, cadence.idle_period),
    }
}

/// Owns the render counter; restarts it whenever the lifecycle state changes.
pub(crate) struct FrameSelector {
    cadence: FrameCadence,
    state: Option<LifecycleState>,
    counter: u64,
}

impl FrameSelector {
    pub(crate) fn new(cadence: FrameCadence) -> Self {
        Self {
            cadence,
            state: None,
            counter: 0,
        }
    }

    pub(crate) fn next_frame(&mut self, snapshot: &StateSnapshot) -> FrameIndex {
        if self.state != Some(snapshot.lifecycle_state) {
            self.state = Some(snapshot.lifecycle_state);
            self.counter = 0;
        }
        let frame = select_frame(&self.cadence, snapshot, self.counter);
        self.counter = self.counter.wrapping_add(1);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(state: LifecycleState, heat: f64) -> StateSnapshot {
        StateSnapshot {
            lifecycle_state: state,
            hatch_progress: 0.0,
            heat,
            tick_count: 0,
        }
    }

    #[test]
    fn hatching_buckets_of_sixteen() {
        let cadence = FrameCadence::default();
        let s = snap(LifecycleState::Hatching, 0.0);
        let frames: Vec<_> = (0..64).map(|n| select_frame(&cadence, &s, n)).collect();

        assert!(frames[..16].iter().all(|&f| f == HATCH_CRACK_START));
        assert!(frames[16..32].iter().all(|&f| f == HATCH_CRACKED_SHELL));
        assert!(frames[32..].iter().all(|&f| f == HATCH_FIRST_IDLE));
    }

    #[test]
    fn hatching_buckets_of_four() {
        let cadence = FrameCadence {
            hatch_bucket_width: 4,
            ..FrameCadence::default()
        };
        let s = snap(LifecycleState::Hatching, 0.0);
        let frames: Vec<_> = (0..12).map(|n| select_frame(&cadence, &s, n)).collect();
        assert_eq!(frames, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn cold_egg_holds_first_frame() {
        let cadence = FrameCadence::default();
        let s = snap(LifecycleState::Egg, 0.0);
        for n in [0, 1, 5, 1_000, u64::MAX] {
            assert_eq!(select_frame(&cadence, &s, n), 0);
        }
    }

    #[test]
    fn tiny_heat_does_not_overflow_period() {
        let cadence = FrameCadence::default();
        let s = snap(LifecycleState::Egg, f64::MIN_POSITIVE);
        assert_eq!(select_frame(&cadence, &s, u64::MAX), 0);
    }

    #[test]
    fn warm_egg_cycles_every_five_renders() {
        let cadence = FrameCadence::default();
        let s = snap(LifecycleState::Egg, 1.0);
        let frames: Vec<_> = (0..12).map(|n| select_frame(&cadence, &s, n)).collect();
        assert_eq!(frames, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn half_heat_egg_cycles_slower() {
        let cadence = FrameCadence::default();
        let s = snap(LifecycleState::Egg, 0.5);
        assert_eq!(select_frame(&cadence, &s, 9), 0);
        assert_eq!(select_frame(&cadence, &s, 10), 1);
    }

    #[test]
    fn fixed_egg_cadence_ignores_heat() {
        let cadence = FrameCadence {
            egg: EggCadence::Fixed { period: 2 },
            ..FrameCadence::default()
        };
        let s = snap(LifecycleState::Egg, 0.0);
        let frames: Vec<_> = (0..6).map(|n| select_frame(&cadence, &s, n)).collect();
        assert_eq!(frames, vec![0, 0, 1, 1, 0, 0]);
    }

    #[test]
    fn idle_loop_period_five() {
        let cadence = FrameCadence::default();
        let s = snap(LifecycleState::Idle, 0.0);
        let frames: Vec<_> = (0..20).map(|n| select_frame(&cadence, &s, n)).collect();
        assert_eq!(&frames[..10], &[0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
        assert_eq!(frames[10..], frames[..10]);
    }

    #[test]
    fn selector_restarts_counter_on_state_change() {
        let mut sel = FrameSelector::new(FrameCadence::default());
        let idle = snap(LifecycleState::Idle, 0.0);
        for _ in 0..7 {
            sel.next_frame(&idle);
        }
        let hatching = snap(LifecycleState::Hatching, 0.0);
        assert_eq!(sel.next_frame(&hatching), HATCH_CRACK_START);
        for _ in 1..16 {
            assert_eq!(sel.next_frame(&hatching), HATCH_CRACK_START);
        }
        assert_eq!(sel.next_frame(&hatching), HATCH_CRACKED_SHELL);
    }

    #[test]
    fn cadence_deserializes_tagged_egg_mode() {
        let c: FrameCadence =
            serde_json::from_str(r#"{ "egg": { "kind": "fixed", "period": 3 } }"#).unwrap();
        assert_eq!(c.egg, EggCadence::Fixed { period: 3 });
        assert_eq!(c.hatch_bucket_width, 16);
    }
}
