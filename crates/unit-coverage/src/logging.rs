//! Log output for hosts that do not install their own subscriber.
//!
//! The crate emits `tracing` events under the `unit_coverage` target.
//! Hosts with their own subscriber need nothing from this module.

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber at `level`
///
/// `RUST_LOG` directives still apply on top of `level`. Returns `false`
/// if a global subscriber was already installed.
pub fn init(level: Level) -> bool {
    let filter = EnvFilter::from_default_env().add_directive(
        format!("unit_coverage={level}")
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into()),
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        let _ = init(Level::DEBUG);
        assert!(!init(Level::INFO));
    }
}
