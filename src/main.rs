mod app;
mod cli;
mod clock;
mod config;
mod frames;
mod headless;
mod input;
mod logging;
mod model;
mod render;
mod schedule;
mod session;
mod sim;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let paths = config::project_paths()?;

    if cli.headless.is_some() {
        logging::init_stderr()?;
    } else {
        logging::init_file(&paths.log_path)?;
    }
    log::info!("hatchling starting");

    let mut settings = config::load_or_init_settings(&paths.settings_path)?;
    cli.apply(&mut settings);
    settings.validate()?;
    // flags are one-off overrides unless asked to stick
    if cli.save_settings {
        config::save_settings_atomic(&paths.settings_path, &settings)?;
    }

    match cli.headless {
        Some(ms) => headless::run(&settings, ms, cli.heat),
        None => app::run(settings),
    }
}
