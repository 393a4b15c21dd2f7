//! chunkmem: workbench for chunked arena and pool allocators.

use anyhow::Result;
use chunkmem_lib::errors::{handle_error, AppError};
use chunkmem_lib::{app, config};

fn main() -> Result<()> {
    let config = config::AppConfig::parse();

    // Initialize tracing
    let level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match app::run(&config) {
        Err(err) => match err.downcast_ref::<AppError>() {
            Some(app_err) => {
                chunkmem_cli::ui::print_error(&app_err.to_string());
                std::process::exit(handle_error(app_err));
            }
            None => Err(err),
        },
        ok => ok,
    }
}
