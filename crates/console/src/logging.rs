//! Log setup shared by both binaries. Logs go to stderr so they never mix
//! with menu screens or report text on stdout.

/// `verbose` selects debug output; otherwise `default_level` applies
pub fn init_logging(verbose: bool, default_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,remote=debug,console=debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new(default_level)
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(filter)
        .init();
}
