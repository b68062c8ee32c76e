use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Progress goes to stderr; `RUST_LOG` overrides the `info` default.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
