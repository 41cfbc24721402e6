use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure, no response from the server
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `message` is the server's `message` field when present
    #[error("{message}")]
    Api { status: u16, message: String },

    /// 401 on an authenticated request. The session has already been cleared.
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Session storage error: {0}")]
    Session(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. } | ClientError::NotLoggedIn)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_display_the_server_message_verbatim() {
        let err = ClientError::Api {
            status: 401,
            message: "Invalid credentials".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(!err.is_unauthorized());

        let err = ClientError::Unauthorized {
            message: "Session expired, please log in again".to_string(),
        };
        assert!(err.is_unauthorized());
    }
}
