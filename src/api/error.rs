use thiserror::Error;

/// Errors that can occur while talking to the server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Response with a non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body was not the JSON shape we expected
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Server URL in the configuration could not be used
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

impl ApiError {
    /// Returns true if this error is transient and a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout | ApiError::Network(_) => true,
            ApiError::HttpStatus(status) => *status >= 500 || *status == 429,
            ApiError::Decode(_) | ApiError::InvalidUrl(_) | ApiError::ResponseTooLarge => false,
        }
    }

    /// True for a 404, which callers treat as "nothing there" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::HttpStatus(404))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::HttpStatus(503).is_retryable());
        assert!(ApiError::HttpStatus(429).is_retryable());
        assert!(!ApiError::HttpStatus(401).is_retryable());
        assert!(!ApiError::InvalidUrl("nope".into()).is_retryable());
        assert!(ApiError::HttpStatus(404).is_not_found());
    }
}
