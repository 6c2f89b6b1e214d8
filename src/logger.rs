use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Only this crate's level follows the verbosity flag.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "category_trends=debug"
    } else {
        "category_trends=info"
    }
}

/// RUST_LOG takes precedence over the verbosity flag.
pub fn init_cli_logger(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
