//! Conversions from external infrastructure errors into domain errors.

use lightspeed_domain::RetailError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct InfraError(#[from] pub RetailError);

impl From<InfraError> for RetailError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

/// Convert any supported infrastructure error straight into a
/// [`RetailError`]; handy as `map_err(to_retail)`.
pub fn to_retail<E: Into<InfraError>>(err: E) -> RetailError {
    err.into().0
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoRetailError {
    fn into_retail(self) -> RetailError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → RetailError */
/* -------------------------------------------------------------------------- */

impl IntoRetailError for SqlError {
    fn into_retail(self) -> RetailError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => RetailError::Storage("database is busy".into()),
                    ErrorCode::DatabaseLocked => RetailError::Storage("database is locked".into()),
                    ErrorCode::NotADatabase => {
                        RetailError::Storage("file is not a SQLite database".into())
                    }
                    _ => RetailError::Storage(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                RetailError::Storage(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                RetailError::Storage(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => RetailError::Storage(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => RetailError::Storage(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_retail())
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(RetailError::Storage(format!("connection pool error: {value}")))
    }
}

impl From<tokio::task::JoinError> for InfraError {
    fn from(value: tokio::task::JoinError) -> Self {
        InfraError(RetailError::Internal(format!("Task join error: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(RetailError::Storage(format!("I/O error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RetailError */
/* -------------------------------------------------------------------------- */

impl IntoRetailError for HttpError {
    fn into_retail(self) -> RetailError {
        if self.is_timeout() {
            return RetailError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return RetailError::Network(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            let url = self.url().map(ToString::to_string).unwrap_or_default();
            let reason = status.canonical_reason().unwrap_or("unknown status");
            return RetailError::http(status.as_u16(), url, reason);
        }

        if self.is_decode() {
            return RetailError::Serialization(format!("invalid response body: {self}"));
        }

        if self.is_builder() {
            return RetailError::InvalidInput(format!("invalid request: {self}"));
        }

        RetailError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_retail())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use rusqlite::ffi::{Error as FfiError, ErrorCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn sqlite_busy_maps_to_storage_error() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            Some("database is locked".into()),
        );

        match to_retail(err) {
            RetailError::Storage(msg) => assert!(msg.contains("busy")),
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    #[test]
    fn infra_error_is_transparent_over_domain_error() {
        let inner = RetailError::Storage("disk full".into());
        let wrapped = InfraError::from(inner.clone());

        assert_eq!(wrapped.to_string(), inner.to_string());
        assert_eq!(to_retail(wrapped), inner);
    }

    #[test]
    fn io_error_maps_to_storage_error() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(to_retail(err), RetailError::Storage(_)));
    }

    #[tokio::test]
    async fn http_status_401_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped = to_retail(error);
        assert!(mapped.is_unauthorized(), "expected 401, got {mapped:?}");
    }

    #[tokio::test]
    async fn connection_refused_is_retryable_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped = to_retail(error);
        assert!(matches!(mapped, RetailError::Network(_)));
        assert!(mapped.is_retryable());
    }
}
