use anyhow::Error;
use renumber_config::ConfigError;
use renumber_core::{CoreError, MappingError};
use renumber_sync::SyncError;
use std::process::ExitCode;
use thiserror::Error as ThisError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INVALID_INPUT: u8 = 3;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {:#}", err);
    } else {
        eprintln!("error: {}", err);
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    ExitCode::from(exit_status(err))
}

fn exit_status(err: &Error) -> u8 {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return match cli_err {
                CliError::InvalidInput(_) => EXIT_INVALID_INPUT,
            };
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return config_exit_code(config_err);
        }
        if let Some(sync_err) = cause.downcast_ref::<SyncError>() {
            return sync_exit_code(sync_err);
        }
        if let Some(mapping_err) = cause.downcast_ref::<MappingError>() {
            return mapping_exit_code(mapping_err);
        }
        if let Some(_core_err) = cause.downcast_ref::<CoreError>() {
            return EXIT_INVALID_INPUT;
        }
    }
    EXIT_FAILURE
}

fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingHomeDir => EXIT_FAILURE,
        ConfigError::InvalidConfigPath(_)
        | ConfigError::MissingConfigFile(_)
        | ConfigError::InsecurePermissions(_)
        | ConfigError::InvalidMaxAttempts(_)
        | ConfigError::InvalidInitialDelay(_)
        | ConfigError::InvalidMaxDelay(_)
        | ConfigError::InvalidColumn { .. }
        | ConfigError::InvalidPath { .. }
        | ConfigError::Read { .. }
        | ConfigError::Parse { .. } => EXIT_INVALID_INPUT,
    }
}

fn mapping_exit_code(err: &MappingError) -> u8 {
    match err {
        MappingError::Open { .. } => EXIT_FAILURE,
        MappingError::MissingColumn(_) | MappingError::Csv(_) => EXIT_INVALID_INPUT,
    }
}

fn sync_exit_code(err: &SyncError) -> u8 {
    match err {
        SyncError::Auth(_)
        | SyncError::Http { .. }
        | SyncError::Transport(_)
        | SyncError::RateLimitExhausted { .. }
        | SyncError::Io(_)
        | SyncError::Json(_)
        | SyncError::MissingHomeDir => EXIT_FAILURE,
        SyncError::Mapping(mapping_err) => mapping_exit_code(mapping_err),
        SyncError::Core(_)
        | SyncError::Parse(_)
        | SyncError::Url(_)
        | SyncError::InvalidDataPath(_) => EXIT_INVALID_INPUT,
    }
}
