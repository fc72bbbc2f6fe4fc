use tracing_subscriber::EnvFilter;

/// Installs a stdout subscriber honoring `RUST_LOG`-style filter syntax.
/// Embedding applications that bring their own subscriber skip this.
pub fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}
