//! Tracing subscriber setup.

use crate::error::{ClientError, ClientResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Selects JSON log lines when set to `json`.
pub const LOG_FORMAT_ENV: &str = "DEXNAV_LOG_FORMAT";

const DEFAULT_FILTER: &str = "dexnav=info,dexnav_client=info,dexnav_storage=info,warn";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() -> ClientResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = wants_json(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|e| ClientError::Telemetry(e.to_string()))
}

fn wants_json(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.trim().eq_ignore_ascii_case("json"))
}
