mod platform;

use std::process::ExitCode;

use clap::Parser;
use engine_logging::engine_warn;
use studio_engine::check_health_blocking;

use platform::config::{load_file_config, Cli, FileConfig, Settings};
use platform::RunOutcome;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (file_config, config_error) = match load_file_config(&cli.config) {
        Ok(config) => (config, None),
        Err(err) => (FileConfig::default(), Some(err)),
    };
    let settings = Settings::resolve(&cli, file_config);
    engine_logging::initialize(settings.log_to, settings.log_level, &settings.log_file);
    if let Some(err) = config_error {
        engine_warn!("{:#}; using default settings", err);
        eprintln!("studio: {err:#}; using default settings");
    }

    if cli.health {
        return match check_health_blocking(&settings.stream) {
            Ok(health) => {
                println!(
                    "{}: {}",
                    health.status,
                    health.message.as_deref().unwrap_or("no message")
                );
                if health.is_ok() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(err) => {
                eprintln!("Backend at {} is unreachable: {err}", settings.stream.base_url);
                ExitCode::FAILURE
            }
        };
    }

    match platform::run_app(settings, cli.query.clone(), cli.interactive) {
        Ok(RunOutcome::Completed) => ExitCode::SUCCESS,
        Ok(RunOutcome::Failed | RunOutcome::Interrupted) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("studio: {err:#}");
            ExitCode::FAILURE
        }
    }
}
