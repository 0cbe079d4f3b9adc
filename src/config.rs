use crate::clock::ClockStyle;
use crate::frames::{EggCadence, FrameCadence};
use crate::model::Rules;
use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) tick_ms: u64,
    pub(crate) render_ms: u64,
    pub(crate) clock_style: ClockStyle,
    pub(crate) enable_color: bool,
    pub(crate) sprites_path: Option<PathBuf>,
    pub(crate) rules: Rules,
    pub(crate) cadence: FrameCadence,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            render_ms: 100,
            clock_style: ClockStyle::TwentyFour,
            enable_color: true,
            sprites_path: None,
            rules: Rules::default(),
            cadence: FrameCadence::default(),
        }
    }
}

impl Settings {
    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(self.tick_ms > 0, "tick interval must be positive");
        ensure!(self.render_ms > 0, "render interval must be positive");

        let r = &self.rules;
        ensure!(
            r.hatch_ms_at_full_heat > 0.0,
            "hatch time at full heat must be positive"
        );
        ensure!(
            r.heat_decay_divisor >= 1.0,
            "heat decay divisor must be at least 1"
        );
        ensure!(
            (0.0..=1.0).contains(&r.heat_boost),
            "heat boost must be within [0, 1]"
        );
        ensure!(r.nominal_tick_ms > 0, "nominal tick must be positive");

        let c = &self.cadence;
        ensure!(c.hatch_bucket_width > 0, "hatch bucket width must be positive");
        ensure!(c.idle_period > 0, "idle period must be positive");
        match c.egg {
            EggCadence::HeatScaled { base } => {
                ensure!(
                    base.is_finite() && base > 0.0,
                    "egg cadence base must be positive"
                );
            }
            EggCadence::Fixed { period } => {
                ensure!(period > 0, "egg period must be positive");
            }
        }
        Ok(())
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "hatchling", "Hatchling")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create data directory {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("hatchling.log"),
    })
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return Settings::default(),
    };
    match serde_json::from_str::<Settings>(&s) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("ignoring unreadable settings {}: {e}", path.display());
            Settings::default()
        }
    }
}

/// Loads settings, leaving an editable copy of the defaults behind when no
/// settings file exists yet. An existing file is never rewritten here.
pub(crate) fn load_or_init_settings(path: &Path) -> Result<Settings> {
    if path.exists() {
        return Ok(load_settings(path));
    }
    let settings = Settings::default();
    save_settings_atomic(path, &settings)?;
    log::info!("wrote default settings to {}", path.display());
    Ok(settings)
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename over an existing file fails on some platforms
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)?;
    Ok(())
}
