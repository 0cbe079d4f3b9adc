use crate::clock::ClockStyle;
use crate::config::Settings;
use crate::model::DecayMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "hatchling")]
#[command(about = "Keep an egg warm until it hatches")]
pub(crate) struct Cli {
    /// Simulation tick interval (milliseconds)
    #[arg(long)]
    pub(crate) tick_ms: Option<u64>,

    /// Animation frame interval (milliseconds)
    #[arg(long)]
    pub(crate) render_ms: Option<u64>,

    /// Clock format
    #[arg(long, value_enum)]
    pub(crate) clock: Option<ClockArg>,

    /// Whether heat decays per tick or per elapsed millisecond
    #[arg(long, value_enum)]
    pub(crate) decay: Option<DecayArg>,

    /// JSON sprite sheet replacing the built-in art
    #[arg(long)]
    pub(crate) sprites: Option<PathBuf>,

    /// Monochrome output
    #[arg(long, default_value_t = false)]
    pub(crate) no_color: bool,

    /// Simulate this many milliseconds without a terminal and print a summary
    #[arg(long, value_name = "MS")]
    pub(crate) headless: Option<u64>,

    /// Heat the egg is kept at during a headless run
    #[arg(long, default_value_t = 1.0)]
    pub(crate) heat: f64,

    /// Write the effective settings back to the settings file
    #[arg(long, default_value_t = false)]
    pub(crate) save_settings: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ClockArg {
    #[value(name = "24h")]
    TwentyFour,
    #[value(name = "12h")]
    Twelve,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum DecayArg {
    PerTick,
    PerElapsed,
}

impl Cli {
    /// Command-line flags win over the settings file.
    pub(crate) fn apply(&self, settings: &mut Settings) {
        if let Some(ms) = self.tick_ms {
            settings.tick_ms = ms;
        }
        if let Some(ms) = self.render_ms {
            settings.render_ms = ms;
        }
        if let Some(c) = self.clock {
            settings.clock_style = match c {
                ClockArg::TwentyFour => ClockStyle::TwentyFour,
                ClockArg::Twelve => ClockStyle::Twelve,
            };
        }
        if let Some(d) = self.decay {
            settings.rules.decay_mode = match d {
                DecayArg::PerTick => DecayMode::PerTick,
                DecayArg::PerElapsed => DecayMode::PerElapsed,
            };
        }
        if let Some(p) = &self.sprites {
            settings.sprites_path = Some(p.clone());
        }
        if self.no_color {
            settings.enable_color = false;
        }
    }
}
