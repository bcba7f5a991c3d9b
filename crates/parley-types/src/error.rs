use thiserror::Error;

/// Errors from talking to the backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The backend rejected the token. Always escalates to a forced
    /// logout, never handled locally.
    #[error("not authorized")]
    Unauthorized,

    /// Any other non-success status, with a human-readable detail derived
    /// from the response body.
    #[error("{detail}")]
    Status { status: u16, detail: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Errors from the persistent session store.
///
/// Callers downgrade these to "no stored session" with a warning; a broken
/// store never takes the client down.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(String),

    #[error("corrupt store entry: {0}")]
    Corrupt(String),
}

/// Errors from posting a message.
#[derive(Debug, Error)]
pub enum SendError {
    /// Whitespace-only input. Caught before any network call.
    #[error("message text must not be empty")]
    EmptyText,

    /// No active chat run to send through.
    #[error("chat is not active")]
    Inactive,

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_uses_derived_detail() {
        let err = ApiError::Status {
            status: 400,
            detail: "A user with this username already exists.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "A user with this username already exists."
        );
    }

    #[test]
    fn test_unauthorized_classification() {
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert!(
            !ApiError::Status {
                status: 404,
                detail: "Profile not found.".to_string()
            }
            .is_unauthorized()
        );
        assert!(!ApiError::Network("refused".to_string()).is_unauthorized());
    }

    #[test]
    fn test_send_error_wraps_api_error() {
        let err = SendError::from(ApiError::Unauthorized);
        assert_eq!(err.to_string(), "not authorized");
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Corrupt("user.json: expected object".to_string());
        assert!(err.to_string().contains("user.json"));
    }
}
