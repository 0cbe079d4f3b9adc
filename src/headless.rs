use crate::config::Settings;
use crate::model::{LifecycleState, StateSnapshot};
use crate::schedule::{ManualClock, TimeSource, TimerKind, TimerQueue};
use crate::session::Session;
use chrono::{DateTime, TimeZone, Utc};

#[derive(Clone, Debug)]
pub(crate) struct Report {
    pub(crate) renders: u64,
    pub(crate) hatched_after_ms: Option<i64>,
    pub(crate) idle_after_ms: Option<i64>,
    pub(crate) last: StateSnapshot,
}

fn wall(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

/// Tops the egg up to `target` before a tick, the way a player holding the
/// boost key would.
fn warm(session: &mut Session, target: f64, step: f64) {
    if step <= 0.0 {
        return;
    }
    while session.snapshot().heat + step <= target + 1e-9 {
        if !session.boost() {
            break;
        }
    }
}

/// Drives a session on a virtual clock, jumping straight from one timer
/// deadline to the next.
pub(crate) fn simulate(
    settings: &Settings,
    start_ms: i64,
    duration_ms: u64,
    target_heat: f64,
) -> Report {
    let clock = ManualClock::starting_at(start_ms);
    let mut queue = TimerQueue::new(start_ms);
    let mut session = Session::new(settings);
    session.start(&mut queue, &wall(start_ms));

    let end = start_ms.saturating_add(duration_ms.min(i64::MAX as u64) as i64);
    let mut report = Report {
        renders: 0,
        hatched_after_ms: None,
        idle_after_ms: None,
        last: session.snapshot(),
    };
    let mut state = report.last.lifecycle_state;

    while let Some(due) = queue.next_deadline() {
        if due > end {
            break;
        }
        clock.advance(due - clock.now_ms());
        let now = clock.now_ms();
        while let Some((handle, kind)) = queue.pop_due(now) {
            if kind == TimerKind::SimTick {
                warm(&mut session, target_heat, settings.rules.heat_boost);
            }
            let redraw = session.on_timer(handle, now, &wall(now), &mut queue);
            if redraw && kind == TimerKind::Render {
                report.renders += 1;
            }

            let snap = session.snapshot();
            if snap.lifecycle_state != state {
                state = snap.lifecycle_state;
                let after = now - start_ms;
                match state {
                    LifecycleState::Hatching => report.hatched_after_ms = Some(after),
                    LifecycleState::Idle => report.idle_after_ms = Some(after),
                    LifecycleState::Egg => unreachable!("lifecycle went back to egg"),
                }
            }
        }
    }

    session.stop(&mut queue);
    debug_assert_eq!(queue.len(), 0);
    report.last = session.snapshot();
    report
}

pub(crate) fn run(settings: &Settings, duration_ms: u64, target_heat: f64) -> anyhow::Result<()> {
    let start = Utc::now().timestamp_millis();
    log::info!("headless run: {duration_ms} ms at heat {target_heat:.2}");
    let r = simulate(settings, start, duration_ms, target_heat);

    let fmt_ms = |ms: Option<i64>| match ms {
        Some(ms) => format!("{:.1} min", ms as f64 / 60_000.0),
        None => "-".to_string(),
    };
    println!(
        "state={} ticks={} renders={} heat={:.3} hatch={:.3}",
        r.last.lifecycle_state.label(),
        r.last.tick_count,
        r.renders,
        r.last.heat,
        r.last.hatch_progress
    );
    println!(
        "hatched after {} | idle after {}",
        fmt_ms(r.hatched_after_ms),
        fmt_ms(r.idle_after_ms)
    );
    Ok(())
}
