use std::process::ExitCode;

mod app {
    pub(crate) mod bootstrap;
    mod gameplay;
    pub(crate) mod loop_runner;
}

fn main() -> ExitCode {
    match app::bootstrap::build_app() {
        Ok(wiring) => app::loop_runner::run(wiring),
        Err(err) => {
            tracing::error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
