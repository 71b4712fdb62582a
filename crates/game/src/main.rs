mod app;

use std::process::ExitCode;

fn main() -> ExitCode {
    app::init_tracing();
    app::run(app::build_app())
}
