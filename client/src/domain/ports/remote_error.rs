//! Failure modes shared by the remote API ports.

use super::define_port_error;
use crate::domain::Error;

define_port_error! {
    /// Errors surfaced while calling the Hack-or-Snooze API.
    pub enum RemoteApiError {
        /// The request never produced an HTTP response.
        Transport => "remote API transport failed: {message}",
        /// The request exceeded the configured timeout.
        Timeout => "remote API timed out: {message}",
        /// The token or credentials were rejected.
        Unauthorized => "remote API rejected credentials: {message}",
        /// The referenced resource does not exist remotely.
        NotFound => "remote API resource not found: {message}",
        /// The request conflicts with existing remote state.
        Conflict => "remote API reported a conflict: {message}",
        /// The remote API refused the payload.
        Rejected => "remote API rejected the request: {message}",
        /// The response body could not be decoded into domain records.
        Decode => "remote API response decode failed: {message}",
    }
}

impl From<RemoteApiError> for Error {
    fn from(value: RemoteApiError) -> Self {
        let message = value.to_string();
        match value {
            RemoteApiError::Transport { .. } | RemoteApiError::Timeout { .. } => {
                Self::network(message)
            }
            RemoteApiError::Unauthorized { .. } => Self::unauthorized(message),
            RemoteApiError::NotFound { .. } => Self::not_found(message),
            RemoteApiError::Conflict { .. }
            | RemoteApiError::Rejected { .. }
            | RemoteApiError::Decode { .. } => Self::validation(message),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the default domain mapping.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case::transport(RemoteApiError::transport("reset"), ErrorCode::Network)]
    #[case::timeout(RemoteApiError::timeout("10s"), ErrorCode::Network)]
    #[case::unauthorized(RemoteApiError::unauthorized("bad token"), ErrorCode::Unauthorized)]
    #[case::not_found(RemoteApiError::not_found("no story"), ErrorCode::NotFound)]
    #[case::conflict(RemoteApiError::conflict("taken"), ErrorCode::Validation)]
    #[case::rejected(RemoteApiError::rejected("bad url"), ErrorCode::Validation)]
    #[case::decode(RemoteApiError::decode("missing title"), ErrorCode::Validation)]
    fn remote_errors_map_to_domain_codes(#[case] error: RemoteApiError, #[case] code: ErrorCode) {
        let mapped = Error::from(error.clone());
        assert_eq!(mapped.code(), code);
        assert_eq!(mapped.message(), error.to_string());
    }
}
