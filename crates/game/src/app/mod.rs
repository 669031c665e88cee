use std::process::ExitCode;

use tracing::error;

mod assets;
mod bootstrap;
mod dialogue;
mod loop_runner;
mod menu;
mod overworld;
mod settings;
#[cfg(test)]
mod testing;
mod world;

pub(crate) fn run() -> ExitCode {
    match bootstrap::build_app() {
        Ok(app) => loop_runner::run(app),
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
