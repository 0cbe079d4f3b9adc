use crate::frames::FrameIndex;
use crate::model::{LifecycleState, StateSnapshot};
use anyhow::{ensure, Context, Result};
use crossterm::{
    cursor, execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell {
                bg,
                ..Cell::default()
            };
        }
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    dirty: bool,
    // paint every cell on the next present, not just the diff
    full_redraw: bool,
}

fn needs_paint(prev: &Cell, cur: &Cell, full_redraw: bool) -> bool {
    full_redraw || prev != cur
}

impl Terminal {
    pub(crate) fn begin() -> Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            dirty: true,
            full_redraw: true,
        })
    }

    pub(crate) fn end(&mut self) -> Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> Result<bool> {
        let (c, r) = terminal::size()?;
        Ok(self.apply_size(c, r))
    }

    fn apply_size(&mut self, cols: u16, rows: u16) -> bool {
        if cols == self.cols && rows == self.rows {
            return false;
        }
        self.cols = cols;
        self.rows = rows;
        self.prev = CellBuffer::new(cols, rows);
        self.cur = CellBuffer::new(cols, rows);
        self.dirty = true;
        // the screen reflowed, so what is on it no longer matches `prev`
        self.full_redraw = true;
        true
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the cells that changed since the last present.
    pub(crate) fn present(&mut self) -> Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = false;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if !needs_paint(&self.prev.cells[i], &c, self.full_redraw) {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                if c.bold != last_bold {
                    let attr = if c.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = c.bold;
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            ResetColor,
            EndSynchronizedUpdate
        )?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.dirty = false;
        self.full_redraw = false;
        Ok(())
    }
}

/* -----------------------------
   Sprite tables
------------------------------ */

/// One frame of ASCII art, top line first.
pub(crate) type Sprite = Vec<String>;

/// Per-state frame tables. Which art goes with which frame index is
/// configuration; the simulation only hands out indices.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SpriteSheet {
    pub(crate) egg: Vec<Sprite>,
    pub(crate) hatching: Vec<Sprite>,
    pub(crate) idle: Vec<Sprite>,
}

fn art(lines: &[&str]) -> Sprite {
    lines.iter().map(|l| l.to_string()).collect()
}

impl Default for SpriteSheet {
    fn default() -> Self {
        let egg_a = art(&[
            "   ____   ",
            "  /    \\  ",
            " /  ..  \\ ",
            "|   ..   |",
            " \\      / ",
            "  \\____/  ",
        ]);
        let egg_b = art(&[
            "   ____   ",
            "  /    \\  ",
            " / ..   \\ ",
            "|  ..    |",
            " \\      / ",
            "  \\____/  ",
        ]);
        let crack_start = art(&[
            "   ____   ",
            "  /  / \\  ",
            " /  /\\  \\ ",
            "|      . |",
            " \\      / ",
            "  \\____/  ",
        ]);
        let cracked_shell = art(&[
            "  /\\  /\\  ",
            " /  \\/  \\ ",
            " | o  o | ",
            "|\\/\\/\\/\\/|",
            " \\      / ",
            "  \\____/  ",
        ]);
        let idle_a = art(&[
            "          ",
            "  (\\__/)  ",
            "  ( o.o)  ",
            "  (> ~ <) ",
            "  /|   |\\ ",
            "   ^   ^  ",
        ]);
        let idle_b = art(&[
            "  (\\__/)  ",
            "  ( -.-)  ",
            "  (> ~ <) ",
            "  /|   |\\ ",
            "   ^   ^  ",
            "          ",
        ]);
        Self {
            egg: vec![egg_a, egg_b],
            hatching: vec![crack_start, cracked_shell, idle_a.clone()],
            idle: vec![idle_a, idle_b],
        }
    }
}

impl SpriteSheet {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading sprite sheet {}", path.display()))?;
        let sheet: SpriteSheet = serde_json::from_str(&s)
            .with_context(|| format!("parsing sprite sheet {}", path.display()))?;
        ensure!(
            !sheet.egg.is_empty() && !sheet.hatching.is_empty() && !sheet.idle.is_empty(),
            "sprite sheet needs at least one frame per state"
        );
        Ok(sheet)
    }

    fn table(&self, state: LifecycleState) -> &[Sprite] {
        match state {
            LifecycleState::Egg => &self.egg,
            LifecycleState::Hatching => &self.hatching,
            LifecycleState::Idle => &self.idle,
        }
    }

    /// Out-of-range indices wrap around the table.
    pub(crate) fn sprite(&self, state: LifecycleState, frame: FrameIndex) -> Option<&Sprite> {
        let table = self.table(state);
        if table.is_empty() {
            return None;
        }
        table.get(frame % table.len())
    }
}

/* -----------------------------
   Scene
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                ch,
                fg,
                bg,
                bold: false,
            },
        );
    }
}

fn bar(value01: f64, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f64 + 0.5) as usize;
    let mut s = String::new();
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

fn sprite_color(state: LifecycleState, enable_color: bool) -> Color {
    if !enable_color {
        return Color::White;
    }
    match state {
        LifecycleState::Egg => Color::Rgb {
            r: 240,
            g: 220,
            b: 170,
        },
        LifecycleState::Hatching => Color::Rgb {
            r: 255,
            g: 190,
            b: 120,
        },
        LifecycleState::Idle => Color::Rgb {
            r: 150,
            g: 230,
            b: 200,
        },
    }
}

pub(crate) struct SceneView<'a> {
    pub(crate) clock: &'a str,
    pub(crate) snapshot: StateSnapshot,
    pub(crate) state: LifecycleState,
    pub(crate) frame: FrameIndex,
    pub(crate) enable_color: bool,
}

pub(crate) fn draw_scene(buf: &mut CellBuffer, sheet: &SpriteSheet, view: &SceneView<'_>) {
    let bg = Color::Black;
    let fg = Color::White;
    buf.clear(bg);

    let clock_x = (buf.w / 2).saturating_sub(view.clock.chars().count() as u16 / 2);
    for (i, ch) in view.clock.chars().enumerate() {
        buf.set(
            clock_x.saturating_add(i as u16),
            1,
            Cell {
                ch,
                fg,
                bg,
                bold: true,
            },
        );
    }

    if let Some(sprite) = sheet.sprite(view.state, view.frame) {
        let sw = sprite.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
        let sh = sprite.len() as u16;
        let x0 = (buf.w / 2).saturating_sub(sw / 2);
        let y0 = (buf.h / 2).saturating_sub(sh / 2).max(3);
        let col = sprite_color(view.state, view.enable_color);
        for (dy, line) in sprite.iter().enumerate() {
            draw_text(buf, x0, y0 + dy as u16, line, col, bg);
        }
    }

    let snap = &view.snapshot;
    let status_y = buf.h.saturating_sub(4);
    draw_text(
        buf,
        1,
        status_y,
        &format!("{:<9} tick {}", snap.lifecycle_state.label(), snap.tick_count),
        fg,
        bg,
    );
    if snap.lifecycle_state == LifecycleState::Egg {
        let heat = format!("Heat : {} {:>5.1}%", bar(snap.heat, 14), snap.heat * 100.0);
        let hatch = format!(
            "Hatch: {} {:>5.1}%",
            bar(snap.hatch_progress, 14),
            snap.hatch_progress.min(1.0) * 100.0
        );
        draw_text(buf, 1, status_y + 1, &heat, fg, bg);
        draw_text(buf, 1, status_y + 2, &hatch, fg, bg);
    }

    let help = match snap.lifecycle_state {
        LifecycleState::Egg => "Keys: space/w warm the egg | q quit",
        _ => "Keys: q quit",
    };
    draw_text(buf, 1, buf.h.saturating_sub(1), help, fg, bg);
}
