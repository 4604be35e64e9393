use crate::ResourceKind;
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;

pub type ApiResult<T> = Result<T, Error>;

/// Every failure a public operation can return, grouped by where it came from.
#[derive(Debug)]
pub enum Error {
    Config(ConfigError),
    Validation(ValidationError),
    Fetch(FetchError),
    Api(ApiError),
    Integrity(IntegrityError),
}

/// Raised while building a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingApiKey,
    /// The key contains characters that cannot go into a header.
    InvalidApiKey,
    InvalidUrl(String),
}

/// Raised while turning query options into a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    UnknownFilter(String),
    InvalidUrl(String),
}

/// Transport-level failures: the service could not be reached or answered
/// with something other than 200/400/401.
#[derive(Debug)]
pub enum FetchError {
    RequestFailed {
        url: String,
        status: Option<StatusCode>,
        source: Option<reqwest::Error>,
    },
    Timeout {
        url: String,
    },
    Parsing(serde_json::Error, String),
}

/// The service understood the request and refused it.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Unauthorized,
    MalformedRequest,
    /// A 200 response whose body carried a top-level `errors` member.
    Rejected(Value),
}

/// The response referenced something it did not include.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    UnresolvedReference { id: String, kind: ResourceKind },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {e}"),
            Error::Validation(e) => write!(f, "Validation error: {e}"),
            Error::Fetch(e) => write!(f, "Fetch error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Integrity(e) => write!(f, "Integrity error: {e}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey => f.write_str("an API key is required"),
            ConfigError::InvalidApiKey => f.write_str("the API key is not a valid header value"),
            ConfigError::InvalidUrl(url) => write!(f, "invalid URL: {url}"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnknownFilter(key) => write!(f, "unknown query option `{key}`"),
            ValidationError::InvalidUrl(url) => write!(f, "not a usable URL: {url}"),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::RequestFailed { url, status: Some(status), .. } => {
                write!(f, "request to {url} failed with status {status}")
            }
            FetchError::RequestFailed { url, source: Some(e), .. } => {
                write!(f, "request to {url} failed: {e}")
            }
            FetchError::RequestFailed { url, .. } => write!(f, "request to {url} failed"),
            FetchError::Timeout { url } => write!(f, "request to {url} timed out"),
            FetchError::Parsing(e, url) => write!(f, "invalid JSON from {url}: {e}"),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized => f.write_str("Unauthorized request."),
            ApiError::MalformedRequest => f.write_str("Malformed request."),
            ApiError::Rejected(errors) => write!(f, "request rejected: {errors}"),
        }
    }
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::UnresolvedReference { id, kind } => {
                write!(f, "{kind} `{id}` is referenced but was not included")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::Fetch(e) => Some(e),
            Error::Api(e) => Some(e),
            Error::Integrity(e) => Some(e),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for ApiError {}
impl std::error::Error for IntegrityError {}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::RequestFailed { source: Some(e), .. } => Some(e),
            FetchError::Parsing(e, _) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<FetchError> for Error {
    fn from(e: FetchError) -> Self {
        Error::Fetch(e)
    }
}

impl From<ApiError> for Error {
    fn from(e: ApiError) -> Self {
        Error::Api(e)
    }
}

impl From<IntegrityError> for Error {
    fn from(e: IntegrityError) -> Self {
        Error::Integrity(e)
    }
}
