use crate::config::Settings;
use crate::input::{collect_input, map_event_to_action, Action};
use crate::render::{draw_scene, SceneView, SpriteSheet, Terminal};
use crate::schedule::{MonotonicClock, TimeSource, TimerQueue};
use crate::session::Session;
use anyhow::Result;
use chrono::Local;
use std::time::Duration;

/// Longest the loop sleeps when nothing is scheduled.
const IDLE_WAIT_MS: u64 = 250;

pub(crate) struct App {
    settings: Settings,
    sheet: SpriteSheet,
    time: MonotonicClock,
    queue: TimerQueue,
    session: Session,
    term: Terminal,
    should_quit: bool,
}

impl App {
    fn init(settings: Settings) -> Result<Self> {
        let sheet = match &settings.sprites_path {
            Some(path) => SpriteSheet::load(path)?,
            None => SpriteSheet::default(),
        };

        let time = MonotonicClock::new();
        let mut queue = TimerQueue::new(time.now_ms());
        let mut session = Session::new(&settings);
        session.start(&mut queue, &Local::now());

        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            sheet,
            time,
            queue,
            session,
            term,
            should_quit: false,
        })
    }

    fn run(&mut self) -> Result<()> {
        let result = self.event_loop();

        self.session.stop(&mut self.queue);
        debug_assert!(!self.session.is_running());
        self.term.end()?;
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        while !self.should_quit {
            if self.term.resize_if_needed()? {
                self.term.mark_dirty();
            }

            // input, waiting no longer than the next timer
            let now = self.time.now_ms();
            let wait = match self.queue.next_deadline() {
                Some(due) => due.saturating_sub(now).max(0) as u64,
                None => IDLE_WAIT_MS,
            };
            for ev in collect_input(Duration::from_millis(wait))? {
                match map_event_to_action(&ev) {
                    Some(Action::Quit) => {
                        log::info!("quit requested");
                        self.should_quit = true;
                        break;
                    }
                    Some(Action::Boost) => {
                        if self.session.boost() {
                            self.term.mark_dirty();
                        }
                    }
                    None => {}
                }
            }
            if self.should_quit {
                break;
            }

            // timers
            let now = self.time.now_ms();
            while let Some((handle, _)) = self.queue.pop_due(now) {
                if self
                    .session
                    .on_timer(handle, now, &Local::now(), &mut self.queue)
                {
                    self.term.mark_dirty();
                }
            }

            if self.term.is_dirty() {
                self.draw()?;
            }
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let shown = self.session.shown();
        let view = SceneView {
            clock: self.session.clock_text(),
            snapshot: self.session.snapshot(),
            state: shown.state,
            frame: shown.frame,
            enable_color: self.settings.enable_color,
        };
        draw_scene(&mut self.term.cur, &self.sheet, &view);
        self.term.present()
    }
}

pub(crate) fn run(settings: Settings) -> Result<()> {
    let mut app = App::init(settings)?;
    app.run()
}
