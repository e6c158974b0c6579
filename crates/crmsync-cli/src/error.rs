use anyhow::Error;
use crmsync_config::ConfigError;
use crmsync_core::CoreError;
use crmsync_sync::{SyncError, SyncErrorKind};
use std::process::ExitCode;
use thiserror::Error as ThisError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_CONFIGURED: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn not_configured(message: impl Into<String>) -> Error {
    CliError::NotConfigured(message.into()).into()
}

pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {:#}", err);
    } else {
        eprintln!("error: {}", err);
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return ExitCode::from(match cli_err {
                CliError::InvalidInput(_) => EXIT_INVALID_INPUT,
                CliError::NotConfigured(_) => EXIT_NOT_CONFIGURED,
            });
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return ExitCode::from(config_exit_code(config_err));
        }
        if let Some(sync_err) = cause.downcast_ref::<SyncError>() {
            return ExitCode::from(sync_exit_code(sync_err.kind()));
        }
        if let Some(_core_err) = cause.downcast_ref::<CoreError>() {
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
        if let Some(_parse_err) = cause.downcast_ref::<serde_json::Error>() {
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    }
    ExitCode::from(EXIT_FAILURE)
}

fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingHomeDir => EXIT_FAILURE,
        ConfigError::InvalidConfigPath(_)
        | ConfigError::MissingConfigFile(_)
        | ConfigError::InsecurePermissions(_)
        | ConfigError::InvalidTimeout(_)
        | ConfigError::InvalidPlatformName(_)
        | ConfigError::InvalidPlatformParam { .. }
        | ConfigError::ConflictingRuleSources
        | ConfigError::InvalidRule(_)
        | ConfigError::Read { .. }
        | ConfigError::Parse { .. }
        | ConfigError::ParseRules { .. } => EXIT_INVALID_INPUT,
    }
}

fn sync_exit_code(kind: SyncErrorKind) -> u8 {
    match kind {
        SyncErrorKind::NotConfigured => EXIT_NOT_CONFIGURED,
        SyncErrorKind::UnsupportedPlatform
        | SyncErrorKind::InvalidConfiguration
        | SyncErrorKind::Configuration
        | SyncErrorKind::Unavailable => EXIT_INVALID_INPUT,
        SyncErrorKind::Auth | SyncErrorKind::Upstream => EXIT_FAILURE,
    }
}
