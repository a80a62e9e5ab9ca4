//! Logger setup
//!
//! The library only emits through the `log` facade; binaries pick the sink.

/// Initialize the logging system
///
/// Honors `RUST_LOG`; falls back to `default_level` when it is unset.
pub fn init(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    // A second init (tests, embedding hosts) keeps the existing logger
    let _ = env_logger::Builder::from_env(env).try_init();
}
