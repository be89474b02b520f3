use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise our crates log at `default_level`, everything else at warn.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pixatools={default_level},pixatools_application={default_level},pixatools_adapters={default_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
