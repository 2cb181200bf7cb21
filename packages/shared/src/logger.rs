//! Logging setup shared by the binaries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence. Without it, `bin_name` is logged at
/// `default_level` together with `tower_http`.
///
/// # Arguments
///
/// * `bin_name` - Binary name (usually `env!("CARGO_BIN_NAME")`)
/// * `default_level` - Level used when `RUST_LOG` is not set
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(default_directive(bin_name, default_level))
    });

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Build the default filter directive for a binary.
///
/// Crate targets use `_` where binary names use `-`.
fn default_directive(bin_name: &str, default_level: &str) -> String {
    let target = bin_name.replace('-', "_");
    format!("{target}={default_level},tower_http={default_level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_normalizes_bin_name() {
        // テスト項目: バイナリ名のハイフンがアンダースコアに変換される
        // when (操作):
        let directive = default_directive("messenger-server", "debug");

        // then (期待する結果):
        assert_eq!(directive, "messenger_server=debug,tower_http=debug");
    }

    #[test]
    fn test_setup_logger_twice_does_not_panic() {
        // テスト項目: 2 回呼び出しても panic しない
        setup_logger("messenger-server", "info");
        setup_logger("messenger-server", "info");
    }
}
