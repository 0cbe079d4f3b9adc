use std::cell::Cell;
use std::time::Instant;

/// Monotonic millisecond clock. Values are only meaningful as differences.
pub(crate) trait TimeSource {
    fn now_ms(&self) -> i64;
}

/// Real time: `Instant` elapsed since startup, offset by the wall clock at
/// startup so readings never begin at zero.
pub(crate) struct MonotonicClock {
    origin: Instant,
    origin_ms: i64,
}

impl MonotonicClock {
    pub(crate) fn new() -> Self {
        Self {
            origin: Instant::now(),
            origin_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl TimeSource for MonotonicClock {
    fn now_ms(&self) -> i64 {
        let elapsed = self.origin.elapsed().as_millis().min(i64::MAX as u128) as i64;
        self.origin_ms.saturating_add(elapsed)
    }
}

/// Hand-driven clock for headless runs and tests.
pub(crate) struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub(crate) fn starting_at(ms: i64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub(crate) fn advance(&self, ms: i64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TimerKind {
    SimTick,
    Render,
    ClockMinute,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TimerHandle(u64);

pub(crate) trait Scheduler {
    fn schedule_once(&mut self, delay_ms: u64, kind: TimerKind) -> TimerHandle;
    /// Returns false if the handle already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    handle: TimerHandle,
    due_ms: i64,
    kind: TimerKind,
}

/// One-shot timers for a cooperative loop. The host asks for the next
/// deadline, waits until then, and drains whatever is due.
pub(crate) struct TimerQueue {
    now_ms: i64,
    next_id: u64,
    pending: Vec<Pending>,
}

impl TimerQueue {
    pub(crate) fn new(now_ms: i64) -> Self {
        Self {
            now_ms,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    pub(crate) fn next_deadline(&self) -> Option<i64> {
        self.pending.iter().map(|p| p.due_ms).min()
    }

    /// Pops the earliest timer due at `now_ms`, oldest first on ties.
    pub(crate) fn pop_due(&mut self, now_ms: i64) -> Option<(TimerHandle, TimerKind)> {
        self.now_ms = self.now_ms.max(now_ms);
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_ms <= self.now_ms)
            .min_by_key(|(_, p)| (p.due_ms, p.handle))
            .map(|(i, _)| i)?;
        let p = self.pending.swap_remove(idx);
        Some((p.handle, p.kind))
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

impl Scheduler for TimerQueue {
    fn schedule_once(&mut self, delay_ms: u64, kind: TimerKind) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let delay = delay_ms.min(i64::MAX as u64) as i64;
        self.pending.push(Pending {
            handle,
            due_ms: self.now_ms.saturating_add(delay),
            kind,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.pending.iter().position(|p| p.handle == handle) {
            Some(i) => {
                self.pending.swap_remove(i);
                true
            }
            None => false,
        }
    }
}

/// A repeating timer built from one-shots: owns its running state and the
/// single outstanding handle, so stopping it cannot leave a stray fire behind.
pub(crate) struct Ticker {
    kind: TimerKind,
    interval_ms: u64,
    handle: Option<TimerHandle>,
}

impl Ticker {
    pub(crate) fn new(kind: TimerKind, interval_ms: u64) -> Self {
        Self {
            kind,
            interval_ms,
            handle: None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub(crate) fn start(&mut self, sched: &mut impl Scheduler) {
        self.start_in(sched, self.interval_ms);
    }

    pub(crate) fn start_in(&mut self, sched: &mut impl Scheduler, delay_ms: u64) {
        if self.handle.is_none() {
            self.handle = Some(sched.schedule_once(delay_ms, self.kind));
        }
    }

    pub(crate) fn stop(&mut self, sched: &mut impl Scheduler) {
        if let Some(h) = self.handle.take() {
            sched.cancel(h);
        }
    }

    /// True if `handle` is this ticker's live timer. The ticker is then idle
    /// until re-armed.
    pub(crate) fn claim(&mut self, handle: TimerHandle) -> bool {
        if self.handle == Some(handle) {
            self.handle = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn rearm(&mut self, sched: &mut impl Scheduler) {
        self.start(sched);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_fires_in_deadline_order() {
        let mut q = TimerQueue::new(1_000);
        let late = q.schedule_once(300, TimerKind::Render);
        let early = q.schedule_once(100, TimerKind::SimTick);
        assert_eq!(q.next_deadline(), Some(1_100));

        assert_eq!(q.pop_due(1_050), None);
        assert_eq!(q.pop_due(1_400), Some((early, TimerKind::SimTick)));
        assert_eq!(q.pop_due(1_400), Some((late, TimerKind::Render)));
        assert_eq!(q.pop_due(1_400), None);
    }

    #[test]
    fn ties_fire_oldest_first() {
        let mut q = TimerQueue::new(0);
        let a = q.schedule_once(100, TimerKind::SimTick);
        let b = q.schedule_once(100, TimerKind::Render);
        assert_eq!(q.pop_due(100).map(|x| x.0), Some(a));
        assert_eq!(q.pop_due(100).map(|x| x.0), Some(b));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new(0);
        let h = q.schedule_once(10, TimerKind::SimTick);
        assert!(q.cancel(h));
        assert!(!q.cancel(h));
        assert_eq!(q.pop_due(1_000), None);
    }

    #[test]
    fn ticker_rearms_and_stops_cleanly() {
        let mut q = TimerQueue::new(0);
        let mut t = Ticker::new(TimerKind::SimTick, 100);
        t.start(&mut q);
        t.start(&mut q);
        assert_eq!(q.len(), 1);

        let (h, kind) = q.pop_due(100).unwrap();
        assert_eq!(kind, TimerKind::SimTick);
        assert!(t.claim(h));
        assert!(!t.is_running());
        t.rearm(&mut q);
        assert_eq!(q.next_deadline(), Some(200));

        t.stop(&mut q);
        assert!(!t.is_running());
        assert_eq!(q.len(), 0);
        assert_eq!(q.pop_due(10_000), None);
    }

    #[test]
    fn ticker_rejects_foreign_handles() {
        let mut q = TimerQueue::new(0);
        let mut sim = Ticker::new(TimerKind::SimTick, 100);
        let mut render = Ticker::new(TimerKind::Render, 100);
        sim.start(&mut q);
        render.start(&mut q);
        let (h, _) = q.pop_due(100).unwrap();
        assert!(sim.claim(h));
        assert!(!render.claim(h));
        assert!(render.is_running());
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::starting_at(42_000);
        assert_eq!(clock.now_ms(), 42_000);
        clock.advance(250);
        assert_eq!(clock.now_ms(), 42_250);
        clock.advance(-250);
        assert_eq!(clock.now_ms(), 42_000);
    }

    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
        assert!(a > 0);
    }
}
