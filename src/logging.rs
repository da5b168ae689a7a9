use tracing_subscriber::EnvFilter;

/// Filtr z RAMEN_LOG, pak RUST_LOG, jinak "info".
pub fn init() {
    let filter = EnvFilter::try_from_env("RAMEN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[macro_export]
macro_rules! log_anyhow_with_source {
    ($err:expr, $($rest:tt)+) => {{
        let err: &anyhow::Error = &$err;

        // Nejnižší příčina chyby (root cause)
        let root = err.root_cause();

        ::tracing::error!(
            error = %err,       // např. "install SIGTERM handler"
            root_cause = %root, // např. "Operation not permitted (os error 1)"
            $($rest)+
        );
    }};
}

#[macro_export]
macro_rules! debug_error_display {
    ($err:expr, $($rest:tt)+) => {{
        ::tracing::debug!(
            error = %$err,
            $($rest)+
        );
    }};
}
