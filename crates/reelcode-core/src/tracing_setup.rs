use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing for a front-end binary. Level defaults to `info`
/// and is overridable via `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
