use crate::clock::{ms_until_next_minute, ClockDisplay};
use crate::config::Settings;
use crate::frames::{FrameIndex, FrameSelector};
use crate::model::{Creature, LifecycleState, Rules, StateSnapshot};
use crate::schedule::{Scheduler, Ticker, TimerHandle, TimerKind};
use crate::sim::ElapsedClock;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// What the renderer should currently show.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Shown {
    pub(crate) state: LifecycleState,
    pub(crate) frame: FrameIndex,
}

/// Everything alive while the pet is on screen. Input and timers are
/// delivered here one at a time by the host loop.
pub(crate) struct Session {
    rules: Rules,
    creature: Creature,
    elapsed: ElapsedClock,
    frames: FrameSelector,
    sim: Ticker,
    render: Ticker,
    minute: Ticker,
    clock: ClockDisplay,
    shown: Shown,
}

impl Session {
    pub(crate) fn new(settings: &Settings) -> Self {
        Self {
            rules: settings.rules.clone(),
            creature: Creature::new(),
            elapsed: ElapsedClock::new(),
            frames: FrameSelector::new(settings.cadence.clone()),
            sim: Ticker::new(TimerKind::SimTick, settings.tick_ms),
            render: Ticker::new(TimerKind::Render, settings.render_ms),
            minute: Ticker::new(TimerKind::ClockMinute, 60_000),
            clock: ClockDisplay::new(settings.clock_style),
            shown: Shown {
                state: LifecycleState::Egg,
                frame: 0,
            },
        }
    }

    pub(crate) fn start<Tz>(&mut self, sched: &mut impl Scheduler, wall: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.clock.refresh(wall);
        self.sim.start(sched);
        self.render.start(sched);
        self.minute.start_in(sched, ms_until_next_minute(wall));
        log::info!("session started, clock {}", self.clock.text());
    }

    /// Cancels every outstanding timer.
    pub(crate) fn stop(&mut self, sched: &mut impl Scheduler) {
        self.sim.stop(sched);
        self.render.stop(sched);
        self.minute.stop(sched);
        log::info!(
            "session stopped at tick {} ({:?})",
            self.creature.tick_count,
            self.creature.lifecycle_state
        );
    }

    pub(crate) fn is_running(&self) -> bool {
        self.sim.is_running() || self.render.is_running() || self.minute.is_running()
    }

    /// Routes one fired timer. Returns true when the display needs a redraw.
    pub(crate) fn on_timer<Tz>(
        &mut self,
        handle: TimerHandle,
        now_ms: i64,
        wall: &DateTime<Tz>,
        sched: &mut impl Scheduler,
    ) -> bool
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if self.sim.claim(handle) {
            self.tick(now_ms);
            self.sim.rearm(sched);
            false
        } else if self.render.claim(handle) {
            self.render_frame();
            self.render.rearm(sched);
            true
        } else if self.minute.claim(handle) {
            let changed = self.clock.refresh(wall);
            self.minute.start_in(sched, ms_until_next_minute(wall));
            changed
        } else {
            log::debug!("dropping stale timer {handle:?}");
            false
        }
    }

    fn tick(&mut self, now_ms: i64) -> StateSnapshot {
        let dt = self.elapsed.advance(now_ms);
        let snap = self.creature.update(dt, &self.rules);
        log::trace!(
            "tick {} (+{} ms)",
            snap.tick_count,
            self.creature.elapsed_ms_since_last
        );
        snap
    }

    fn render_frame(&mut self) -> Shown {
        let snap = self.creature.snapshot();
        self.shown = Shown {
            state: snap.lifecycle_state,
            frame: self.frames.next_frame(&snap),
        };
        self.shown
    }

    pub(crate) fn boost(&mut self) -> bool {
        self.creature.apply_heat_boost(&self.rules)
    }

    pub(crate) fn snapshot(&self) -> StateSnapshot {
        self.creature.snapshot()
    }

    pub(crate) fn shown(&self) -> Shown {
        self.shown
    }

    pub(crate) fn clock_text(&self) -> &str {
        self.clock.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{ManualClock, TimeSource, TimerQueue};
    use chrono::Utc;

    fn wall(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    /// Runs every timer due up to `until`, jumping the clock between deadlines.
    fn run_until(session: &mut Session, q: &mut TimerQueue, clock: &ManualClock, until: i64) {
        while let Some(due) = q.next_deadline() {
            if due > until {
                break;
            }
            clock.advance((due - clock.now_ms()).max(0));
            while let Some((h, _)) = q.pop_due(clock.now_ms()) {
                let now = clock.now_ms();
                session.on_timer(h, now, &wall(now), &mut *q);
            }
        }
        clock.advance((until - clock.now_ms()).max(0));
    }

    #[test]
    fn first_tick_uses_zero_elapsed() {
        let settings = Settings::default();
        let clock = ManualClock::starting_at(1_700_000_000_000);
        let mut q = TimerQueue::new(clock.now_ms());
        let mut s = Session::new(&settings);
        for _ in 0..100 {
            s.boost();
        }
        s.start(&mut q, &wall(clock.now_ms()));

        run_until(&mut s, &mut q, &clock, 1_700_000_000_100);
        assert_eq!(s.snapshot().tick_count, 1);
        assert_eq!(s.snapshot().hatch_progress, 0.0);
        assert_eq!(s.creature.elapsed_ms_since_last, 0);

        run_until(&mut s, &mut q, &clock, 1_700_000_000_200);
        assert_eq!(s.snapshot().tick_count, 2);
        assert!(s.snapshot().hatch_progress > 0.0);
        assert_eq!(s.creature.elapsed_ms_since_last, 100);
    }

    #[test]
    fn stop_cancels_everything() {
        let settings = Settings::default();
        let clock = ManualClock::starting_at(5_000);
        let mut q = TimerQueue::new(clock.now_ms());
        let mut s = Session::new(&settings);
        s.start(&mut q, &wall(clock.now_ms()));
        assert_eq!(q.len(), 3);
        assert!(s.is_running());

        s.stop(&mut q);
        assert!(!s.is_running());
        assert_eq!(q.len(), 0);
        assert_eq!(q.pop_due(i64::MAX), None);
    }

    #[test]
    fn render_and_tick_rates_are_independent() {
        let settings = Settings {
            tick_ms: 100,
            render_ms: 250,
            ..Default::default()
        };
        let clock = ManualClock::starting_at(0);
        let mut q = TimerQueue::new(0);
        let mut s = Session::new(&settings);
        s.start(&mut q, &wall(0));

        let mut redraws = 0;
        while let Some(due) = q.next_deadline() {
            if due > 1_000 {
                break;
            }
            clock.advance(due - clock.now_ms());
            while let Some((h, _)) = q.pop_due(due) {
                if s.on_timer(h, due, &wall(due), &mut q) {
                    redraws += 1;
                }
            }
        }
        assert_eq!(s.snapshot().tick_count, 10);
        assert_eq!(redraws, 4);
    }

    #[test]
    fn boosted_egg_hatches_then_idles() {
        let mut settings = Settings::default();
        // one hour of full heat in ~10 ticks
        settings.rules.hatch_ms_at_full_heat = 1_000.0;
        let clock = ManualClock::starting_at(10_000);
        let mut q = TimerQueue::new(clock.now_ms());
        let mut s = Session::new(&settings);
        s.start(&mut q, &wall(clock.now_ms()));

        let mut t = clock.now_ms();
        while s.snapshot().lifecycle_state == LifecycleState::Egg {
            while s.boost() && s.snapshot().heat < 1.0 {}
            t += 100;
            run_until(&mut s, &mut q, &clock, t);
            assert!(t < 20_000, "egg never hatched");
        }
        assert_eq!(s.shown().state, LifecycleState::Hatching);

        t += 60 * 100;
        run_until(&mut s, &mut q, &clock, t);
        assert_eq!(s.snapshot().lifecycle_state, LifecycleState::Idle);
        assert_eq!(s.shown().state, LifecycleState::Idle);
        assert!(!s.boost());
    }

    #[test]
    fn minute_timer_refreshes_clock() {
        let settings = Settings::default();
        // half a minute past a minute boundary
        let start = 1_700_000_000_000 - (1_700_000_000_000 % 60_000) + 30_000;
        let clock = ManualClock::starting_at(start);
        let mut q = TimerQueue::new(start);
        let mut s = Session::new(&settings);
        s.start(&mut q, &wall(start));
        let before = s.clock_text().to_string();

        run_until(&mut s, &mut q, &clock, start + 30_000);
        assert_ne!(s.clock_text(), before);
        let expected = crate::clock::format_clock(&wall(start + 30_000), settings.clock_style);
        assert_eq!(s.clock_text(), expected);
    }
}
