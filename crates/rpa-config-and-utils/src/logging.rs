//! Logging initialization.
//!
//! Thin wrapper over the `observability` crate so binaries pick up the
//! configured level and the `~/.rpa/logs` location in one call.

use crate::Paths;
use observability::LogConfig;

/// Initialize logging for the `rpa` command-line client.
///
/// JSONL goes to `paths.log_file()`. Stderr gets a copy only at `debug` or
/// `trace`; at any other level nothing is logged to stderr and command
/// output stays clean.
pub fn init_logging(paths: &Paths, level: &str) {
    init_logging_for_service(paths, "rpa-cli", level);
}

/// Initialize logging with a custom service name.
pub fn init_logging_for_service(paths: &Paths, service_name: &str, level: &str) {
    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        write_file: true,
        also_stderr: mirrors_to_stderr(level),
    });
}

/// Whether logs at `level` are mirrored to stderr.
fn mirrors_to_stderr(level: &str) -> bool {
    matches!(
        observability::parse_level(level),
        tracing::Level::DEBUG | tracing::Level::TRACE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_only_for_verbose_levels() {
        assert!(mirrors_to_stderr("debug"));
        assert!(mirrors_to_stderr("TRACE"));
        assert!(!mirrors_to_stderr("info"));
        assert!(!mirrors_to_stderr("warn"));
        assert!(!mirrors_to_stderr("error"));
    }
}
