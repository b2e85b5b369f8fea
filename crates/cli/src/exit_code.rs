// Consistent exit codes for the sidenote CLI.
//
//   0  = success
//   1  = general error
//   2  = usage/argument error
//   10 = document store not reachable
//   11 = authentication error
//   12 = note not found
//   13 = assistant unavailable

use std::process;

use sidenote_common::transfer::TransferError;

use crate::client::SessionFailure;

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    StoreDown = 10,
    Auth = 11,
    NotFound = 12,
    NoAssistant = 13,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(failure) = cause.downcast_ref::<SessionFailure>() {
                return Self::from_message(&failure.report.error);
            }
            if cause.downcast_ref::<TransferError>().is_some() {
                return Self::Usage;
            }
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
                return match io_err.kind() {
                    std::io::ErrorKind::NotFound => Self::NotFound,
                    _ => Self::Error,
                };
            }
        }
        Self::from_message(&format!("{err:#}"))
    }

    /// Classify a rendered store or assistant error.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("http 401") || lower.contains("http 403") {
            return Self::Auth;
        }
        if lower.contains("http 404") || lower.contains("could not be loaded") {
            return Self::NotFound;
        }
        if lower.contains("document store unreachable") {
            return Self::StoreDown;
        }
        if lower.contains("no assistant is configured") {
            return Self::NoAssistant;
        }
        Self::Error
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidenote_session::report::Report;

    fn failure(error: &str) -> anyhow::Error {
        let error = std::io::Error::other(error.to_string());
        SessionFailure { report: Report::new("Error loading note", &error, "notes/documents/7 GET") }
            .into()
    }

    #[test]
    fn exit_code_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Error.code(), 1);
        assert_eq!(ExitCode::Usage.code(), 2);
        assert_eq!(ExitCode::StoreDown.code(), 10);
        assert_eq!(ExitCode::Auth.code(), 11);
        assert_eq!(ExitCode::NotFound.code(), 12);
        assert_eq!(ExitCode::NoAssistant.code(), 13);
    }

    #[test]
    fn store_statuses_map_to_codes() {
        assert_eq!(
            ExitCode::from_error(&failure("document store returned HTTP 401: expired")),
            ExitCode::Auth
        );
        assert_eq!(
            ExitCode::from_error(&failure("document store returned HTTP 404: no document 7")),
            ExitCode::NotFound
        );
        assert_eq!(
            ExitCode::from_error(&failure("document store returned HTTP 500: oops")),
            ExitCode::Error
        );
    }

    #[test]
    fn unreachable_store_is_store_down() {
        let err = failure("document store unreachable: connection refused");
        assert_eq!(ExitCode::from_error(&err), ExitCode::StoreDown);
    }

    #[test]
    fn missing_assistant_has_its_own_code() {
        assert_eq!(ExitCode::from_error(&failure("no assistant is configured")), ExitCode::NoAssistant);
    }

    #[test]
    fn missing_import_file_is_not_found() {
        let err = anyhow::Error::new(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(ExitCode::from_error(&err), ExitCode::NotFound);
    }

    #[test]
    fn undecodable_upload_is_usage() {
        let err = anyhow::Error::new(TransferError::NullByte(3)).context("cannot import notes.bin");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Usage);
    }

    #[test]
    fn generic_error_is_error() {
        let err = anyhow::anyhow!("something went wrong");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Error);
    }
}
