use std::{fmt, sync::Arc, time::Duration};

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Upstream service a request was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Service owning flag definitions.
    Flags,
    /// Service owning targeting rules.
    Targeting,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Flags => f.write_str("flag-service"),
            Service::Targeting => f.write_str("targeting-service"),
        }
    }
}

/// Errors produced while resolving flag information from upstream services.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The named resource does not exist upstream.
    #[error("{name} not found in {resource}")]
    NotFound {
        /// Service that reported the resource missing.
        resource: Service,
        /// Name that was looked up.
        name: String,
    },

    /// The service answered with a status other than 200 or 404.
    #[error("{service} returned status {status}")]
    UnexpectedStatus {
        /// Service that answered.
        service: Service,
        /// HTTP status code.
        status: u16,
    },

    /// The request was unauthorized, the API key is likely invalid.
    #[error("unauthorized by {service}, api_key is likely invalid")]
    Unauthorized {
        /// Service that rejected the credential.
        service: Service,
    },

    /// The service did not answer within the fetch timeout.
    #[error("{service} did not respond within {after:?}")]
    Timeout {
        /// Service that timed out.
        service: Service,
        /// Deadline that expired.
        after: Duration,
    },

    /// Network error.
    #[error(transparent)]
    // reqwest::Error is not clonable, so we're wrapping it in an Arc.
    Network(Arc<reqwest::Error>),

    /// The response body could not be decoded.
    #[error("malformed response payload")]
    Decode(#[source] Arc<serde_json::Error>),

    /// Invalid base URL configuration.
    #[error("invalid base url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),
}

impl Error {
    /// Return `true` if the error means the resource is simply absent upstream, as opposed to the
    /// service being unreachable or misbehaving.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(Arc::new(value.without_url()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Decode(Arc::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguished_from_transport_errors() {
        let not_found = Error::NotFound {
            resource: Service::Flags,
            name: "missing-flag".to_owned(),
        };
        let status = Error::UnexpectedStatus {
            service: Service::Flags,
            status: 503,
        };

        assert!(not_found.is_not_found());
        assert!(!status.is_not_found());
        assert_eq!(not_found.to_string(), "missing-flag not found in flag-service");
        assert_eq!(status.to_string(), "flag-service returned status 503");
    }
}
