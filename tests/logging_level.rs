// tests/logging_level.rs

use relaunch::cli::LogLevel;
use relaunch::logging::resolve_level;
use tracing::Level;

#[test]
fn cli_flag_wins_over_everything() {
    assert_eq!(
        resolve_level(Some(LogLevel::Trace), Some("error"), Some("warn")),
        Level::TRACE
    );
}

#[test]
fn env_wins_over_config() {
    assert_eq!(resolve_level(None, Some("debug"), Some("warn")), Level::DEBUG);
}

#[test]
fn config_used_when_env_missing_or_invalid() {
    assert_eq!(resolve_level(None, None, Some("warning")), Level::WARN);
    assert_eq!(resolve_level(None, Some("loud"), Some("error")), Level::ERROR);
}

#[test]
fn defaults_to_info() {
    assert_eq!(resolve_level(None, None, None), Level::INFO);
    assert_eq!(resolve_level(None, None, Some("nonsense")), Level::INFO);
}
