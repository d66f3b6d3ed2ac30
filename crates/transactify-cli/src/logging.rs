use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TRANSACTIFY_LOG";

pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// `TRANSACTIFY_LOG` wins over `-v` when it holds a valid filter.
pub fn build_filter(verbosity: u8, env_value: Option<&str>) -> EnvFilter {
    let default = default_directive(verbosity);
    env_value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

/// Installs the stderr subscriber. Stdout stays reserved for status lines and
/// command output.
pub fn init(verbosity: u8) {
    let env_value = std::env::var(LOG_ENV).ok();
    let filter = build_filter(verbosity, env_value.as_deref());
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("a tracing subscriber was already installed");
    }
}
