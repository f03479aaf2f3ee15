use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns an error when a subscriber is already installed.
pub fn init_subscriber(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        Registry::default()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        Registry::default().with(filter).with(fmt::layer()).try_init()?;
    }

    Ok(())
}
