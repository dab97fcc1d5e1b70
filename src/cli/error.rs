//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Infra(e) => match e {
                InfraError::Io { .. } | InfraError::Terminal(_) => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(d) if d.is_validation() => crate::exitcode::DATAERR,
                    ApplicationError::Domain(DomainError::ResourceExhausted(_)) => {
                        crate::exitcode::OSERR
                    }
                    ApplicationError::Domain(_) => crate::exitcode::SOFTWARE,
                    ApplicationError::DataFileNotFound(_) => crate::exitcode::NOINPUT,
                    ApplicationError::NoRecords(_) => crate::exitcode::DATAERR,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn given_validation_error_then_exit_code_is_dataerr() {
        let err = CliError::from(ApplicationError::Domain(DomainError::EmptyName));
        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);
    }

    #[test]
    fn given_missing_data_file_then_exit_code_is_noinput() {
        let err = CliError::from(ApplicationError::DataFileNotFound(PathBuf::from("x.csv")));
        assert_eq!(err.exit_code(), crate::exitcode::NOINPUT);
    }

    #[test]
    fn given_cycle_error_then_exit_code_is_software() {
        let err = CliError::from(ApplicationError::Domain(DomainError::CycleDetected(
            "110000000000".into(),
        )));
        assert_eq!(err.exit_code(), crate::exitcode::SOFTWARE);
    }

    #[test]
    fn given_terminal_failure_then_exit_code_is_ioerr() {
        let err = CliError::from(InfraError::Terminal(std::io::Error::other("closed")));
        assert_eq!(err.exit_code(), crate::exitcode::IOERR);
    }
}
