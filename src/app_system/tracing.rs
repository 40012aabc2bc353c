/// Sets up tracing once for the whole process.
///
/// Log level comes from `RUST_LOG` and defaults to `info`:
///
/// ```bash
/// RUST_LOG=debug cargo run                               # everything
/// RUST_LOG=stall_market::feed=debug,info cargo run       # feed internals only
/// ```
pub fn setup_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // try_init: a second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .compact()
        .try_init();
}
