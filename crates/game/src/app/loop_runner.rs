use std::process::ExitCode;

use arcade_engine::run_headless;
use tracing::{error, info};

use super::bootstrap::{AppWiring, BootstrapError};

pub(crate) fn run(app: Result<AppWiring, BootstrapError>) -> ExitCode {
    let mut app = match app {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let summary = run_headless(&app.config, &mut app.scene, &mut app.world, &mut app.input);
    info!(
        ticks = summary.ticks,
        simulated_seconds = summary.simulated_seconds,
        stop_reason = summary.stop_reason.as_str(),
        "run_finished"
    );

    let report = app.scene.report(&app.world);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            error!(error = %err, "report_serialize_failed");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
