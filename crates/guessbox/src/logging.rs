//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise every guessbox crate and the HTTP
/// trace layer log at `default_level`.
pub fn init(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_filter(level: &str) -> String {
    [
        "guessbox",
        "guessbox_server",
        "guessbox_room",
        "guessbox_transport",
        "tower_http",
    ]
    .iter()
    .map(|target| format!("{target}={level}"))
    .collect::<Vec<_>>()
    .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_every_crate() {
        let filter = default_filter("debug");
        assert!(filter.contains("guessbox=debug"));
        assert!(filter.contains("guessbox_room=debug"));
        assert!(filter.contains("tower_http=debug"));
        assert!(filter.parse::<EnvFilter>().is_ok());
    }
}
