use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize fmt logging. `RUST_LOG` wins; otherwise the debug flag picks
/// the default filter.
pub fn init_telemetry_and_tracing(debug: bool) -> anyhow::Result<()> {
    let default_filter = if debug {
        "wardgate=debug,info"
    } else {
        "wardgate=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .compact(),
        )
        .try_init()?;
    Ok(())
}
