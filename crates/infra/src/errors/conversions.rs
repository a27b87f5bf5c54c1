//! Conversions from external infrastructure errors into domain errors.

use leadflow_domain::LeadFlowError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LeadFlowError);

impl From<InfraError> for LeadFlowError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LeadFlowError> for InfraError {
    fn from(value: LeadFlowError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoLeadFlowError {
    fn into_leadflow(self) -> LeadFlowError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → LeadFlowError */
/* -------------------------------------------------------------------------- */

impl IntoLeadFlowError for SqlError {
    fn into_leadflow(self) -> LeadFlowError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => LeadFlowError::Storage("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        LeadFlowError::Storage("database is locked".into())
                    }
                    ErrorCode::ReadOnly => LeadFlowError::Storage("database is read-only".into()),
                    ErrorCode::CannotOpen => {
                        LeadFlowError::Storage(format!("unable to open database file: {message}"))
                    }
                    ErrorCode::NotADatabase => {
                        LeadFlowError::Storage("file is not a SQLite database".into())
                    }
                    _ => LeadFlowError::Storage(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => LeadFlowError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                LeadFlowError::Storage(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                LeadFlowError::Storage(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => LeadFlowError::Storage(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => LeadFlowError::Storage(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_leadflow())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → LeadFlowError */
/* -------------------------------------------------------------------------- */

impl IntoLeadFlowError for HttpError {
    fn into_leadflow(self) -> LeadFlowError {
        if self.is_timeout() {
            return LeadFlowError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return LeadFlowError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return LeadFlowError::Config(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return LeadFlowError::Server(format!("undecodable HTTP response: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => LeadFlowError::Auth(message),
                404 => LeadFlowError::NotFound(message),
                400..=499 if code != 429 => LeadFlowError::Validation(message),
                _ => LeadFlowError::Server(message),
            };
        }

        LeadFlowError::Network(format!("HTTP transport error: {self}"))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_leadflow())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / io → LeadFlowError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(LeadFlowError::Internal(format!("invalid JSON: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(LeadFlowError::Storage(format!("I/O failure: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
