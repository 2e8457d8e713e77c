use thiserror::Error;

const MSG_INVALID_REQUEST: &str = "The request could not be built";
const MSG_NO_CONNECTIVITY: &str =
    "No internet connection. Please check your network and try again.";
const MSG_DECODE_FAILURE: &str = "The server response could not be read";
const MSG_UNAUTHORIZED: &str = "Your session has expired. Please sign in again.";
const MSG_FORBIDDEN: &str = "You do not have permission to perform this action";
const MSG_NOT_FOUND: &str = "The requested record was not found";
const MSG_PAYLOAD_TOO_LARGE: &str = "The file is too large to upload";
const MSG_RATE_LIMITED: &str = "Too many requests. Please wait a moment and try again.";
const MSG_SERVICE_UNAVAILABLE: &str = "The service is temporarily unavailable";
const MSG_CLIENT_ERROR: &str = "Client error";
const MSG_SERVER_ERROR: &str = "Server error";
const MSG_UNKNOWN: &str = "An unexpected error occurred";

/// Errors surfaced by every request made against the practice backend.
///
/// The set is closed: transport failures, status codes and decode problems
/// are all folded into one of these variants by the request executor. Each
/// variant carries a human-readable message, taken from the server payload
/// when one was available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("No connectivity: {message}")]
    NoConnectivity { message: String },

    #[error("Decode failure: {message}")]
    DecodeFailure { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Client error ({code}): {message}")]
    ClientError { code: u16, message: String },

    #[error("Server error ({code}): {message}")]
    ServerError { code: u16, message: String },

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl ApiError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn no_connectivity(message: impl Into<String>) -> Self {
        Self::NoConnectivity {
            message: message.into(),
        }
    }

    pub fn decode_failure(message: impl Into<String>) -> Self {
        Self::DecodeFailure {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Classify a non-2xx status code.
    ///
    /// `server_message` is whatever readable text could be pulled out of the
    /// error body; the stock message is used when it is absent. `upload`
    /// enables the dedicated 413 mapping used by multipart uploads.
    pub fn from_status(status: u16, server_message: Option<String>, upload: bool) -> Self {
        let msg = |stock: &str| server_message.clone().unwrap_or_else(|| stock.to_string());
        match status {
            401 => Self::Unauthorized {
                message: msg(MSG_UNAUTHORIZED),
            },
            403 => Self::Forbidden {
                message: msg(MSG_FORBIDDEN),
            },
            404 => Self::NotFound {
                message: msg(MSG_NOT_FOUND),
            },
            413 if upload => Self::PayloadTooLarge {
                message: msg(MSG_PAYLOAD_TOO_LARGE),
            },
            429 => Self::RateLimited {
                message: msg(MSG_RATE_LIMITED),
            },
            503 => Self::ServiceUnavailable {
                message: msg(MSG_SERVICE_UNAVAILABLE),
            },
            400..=499 => Self::ClientError {
                code: status,
                message: msg(MSG_CLIENT_ERROR),
            },
            500..=599 => Self::ServerError {
                code: status,
                message: msg(MSG_SERVER_ERROR),
            },
            _ => Self::Unknown {
                message: msg(MSG_UNKNOWN),
            },
        }
    }

    /// The stock error for a kind, used when nothing more specific is known.
    pub fn stock(kind: ApiErrorKind) -> Self {
        match kind {
            ApiErrorKind::InvalidRequest => Self::invalid_request(MSG_INVALID_REQUEST),
            ApiErrorKind::NoConnectivity => Self::no_connectivity(MSG_NO_CONNECTIVITY),
            ApiErrorKind::DecodeFailure => Self::decode_failure(MSG_DECODE_FAILURE),
            ApiErrorKind::Unauthorized => Self::from_status(401, None, false),
            ApiErrorKind::Forbidden => Self::from_status(403, None, false),
            ApiErrorKind::NotFound => Self::from_status(404, None, false),
            ApiErrorKind::PayloadTooLarge => Self::from_status(413, None, true),
            ApiErrorKind::RateLimited => Self::from_status(429, None, false),
            ApiErrorKind::ServiceUnavailable => Self::from_status(503, None, false),
            ApiErrorKind::ClientError => Self::from_status(400, None, false),
            ApiErrorKind::ServerError => Self::from_status(500, None, false),
            ApiErrorKind::Unknown => Self::unknown(MSG_UNKNOWN),
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::InvalidRequest { .. } => ApiErrorKind::InvalidRequest,
            Self::NoConnectivity { .. } => ApiErrorKind::NoConnectivity,
            Self::DecodeFailure { .. } => ApiErrorKind::DecodeFailure,
            Self::Unauthorized { .. } => ApiErrorKind::Unauthorized,
            Self::Forbidden { .. } => ApiErrorKind::Forbidden,
            Self::NotFound { .. } => ApiErrorKind::NotFound,
            Self::PayloadTooLarge { .. } => ApiErrorKind::PayloadTooLarge,
            Self::RateLimited { .. } => ApiErrorKind::RateLimited,
            Self::ServiceUnavailable { .. } => ApiErrorKind::ServiceUnavailable,
            Self::ClientError { .. } => ApiErrorKind::ClientError,
            Self::ServerError { .. } => ApiErrorKind::ServerError,
            Self::Unknown { .. } => ApiErrorKind::Unknown,
        }
    }

    /// The message carried by this error, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidRequest { message }
            | Self::NoConnectivity { message }
            | Self::DecodeFailure { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::PayloadTooLarge { message }
            | Self::RateLimited { message }
            | Self::ServiceUnavailable { message }
            | Self::ClientError { message, .. }
            | Self::ServerError { message, .. }
            | Self::Unknown { message } => message,
        }
    }

    /// HTTP status associated with the error, if it came from one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::PayloadTooLarge { .. } => Some(413),
            Self::RateLimited { .. } => Some(429),
            Self::ServiceUnavailable { .. } => Some(503),
            Self::ClientError { code, .. } | Self::ServerError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether retrying the same request later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NoConnectivity { .. }
            | Self::RateLimited { .. }
            | Self::ServiceUnavailable { .. } => true,
            Self::ServerError { code, .. } => *code >= 500,
            _ => false,
        }
    }

    /// How the presentation layer should surface this error.
    pub fn presentation(&self) -> ErrorPresentation {
        if matches!(self, Self::Unauthorized { .. }) {
            ErrorPresentation::Reauthenticate
        } else if self.is_retryable() {
            ErrorPresentation::Retryable
        } else {
            ErrorPresentation::NonRetryable
        }
    }
}

/// Discriminant of [`ApiError`], convenient for matching and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    InvalidRequest,
    NoConnectivity,
    DecodeFailure,
    Unauthorized,
    Forbidden,
    NotFound,
    PayloadTooLarge,
    RateLimited,
    ServiceUnavailable,
    ClientError,
    ServerError,
    Unknown,
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidRequest => "invalid_request",
            Self::NoConnectivity => "no_connectivity",
            Self::DecodeFailure => "decode_failure",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::PayloadTooLarge => "payload_too_large",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable => "service_unavailable",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// User-facing treatment of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPresentation {
    /// Show the message with a "try again" affordance.
    Retryable,
    /// Show the server's message; retrying will not help.
    NonRetryable,
    /// Do not show inline; route to the sign-in flow.
    Reauthenticate,
}

/// Convenience result type for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;
