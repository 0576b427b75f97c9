//! Logging initialization.

/// Initializes `env_logger` with a default filter of `info`.
///
/// Override with the `RUST_LOG` environment variable, e.g.
/// `RUST_LOG=phylo_core=debug`.
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
