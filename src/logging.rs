use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use std::fs::OpenOptions;
use std::path::Path;

fn builder() -> Builder {
    let mut b = Builder::from_env(Env::default().default_filter_or("info"));
    b.format_timestamp_millis();
    b
}

/// The terminal is in raw mode while the pet is shown, so log lines go to a
/// file instead of stderr.
pub(crate) fn init_file(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    builder().target(Target::Pipe(Box::new(file))).try_init()?;
    Ok(())
}

pub(crate) fn init_stderr() -> Result<()> {
    builder().target(Target::Stderr).try_init()?;
    Ok(())
}
