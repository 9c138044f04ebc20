/// Crate-level constants
pub const CRATE_NAME: &str = "Flarelog";
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,flarelog=debug"
}

/// Initialize tracing for host binaries and examples. Idempotent: a
/// second call is a no-op rather than a panic.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter())),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_name_is_flarelog() {
        assert_eq!(CRATE_NAME, "Flarelog");
    }

    #[test]
    fn version_matches_cargo() {
        assert_eq!(CRATE_VERSION, "0.1.0");
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
