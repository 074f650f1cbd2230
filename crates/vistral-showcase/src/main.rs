#![forbid(unsafe_code)]

//! Vistral showcase binary entry point.

use std::time::Duration;

use vistral_runtime::{Program, ProgramConfig};
use vistral_showcase::app::{AppModel, ScreenId};
use vistral_showcase::cli;
use vistral_showcase::diagnostics;
use vistral_showcase::rng::SeededRng;

fn main() {
    let opts = cli::Opts::parse();

    if let Err(e) = diagnostics::init_tracing(opts.log_file.as_deref(), opts.log_json) {
        eprintln!("Failed to open log file: {e}");
        std::process::exit(1);
    }

    let start_screen = ScreenId::from_number(opts.start_screen).unwrap_or(ScreenId::Home);
    let seed = opts.seed.unwrap_or_else(SeededRng::seed_from_clock);
    tracing::info!(target: "vistral.app", seed, "seeded");

    let model = AppModel::new(seed)
        .with_start_screen(start_screen)
        .with_exit_after_ms(opts.exit_after_ms);

    let config = ProgramConfig {
        frame_interval: Duration::from_millis(opts.frame_ms),
        alt_screen: opts.alt_screen,
        ..ProgramConfig::default()
    };
    if let Err(e) = Program::with_config(model, config).run() {
        eprintln!("Runtime error: {e}");
        std::process::exit(1);
    }
}
