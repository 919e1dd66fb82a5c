use thiserror::Error;

/// Result type for transfer operations
pub type TransferResult<T> = Result<T, TransferError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the transfer protocol.
///
/// Every variant reaches the caller unchanged: nothing here is retried or
/// downgraded to a partial success.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Hashing algorithm unavailable: {algorithm}")]
    HashingUnavailable { algorithm: String },

    #[error("File is empty")]
    EmptyFile,

    #[error("File size exceeds the {max_bytes} byte limit")]
    FileTooLarge { max_bytes: u64 },

    #[error("Filename must contain at least one letter before the extension: {file_name:?}")]
    InvalidFileName { file_name: String },

    #[error("Object already exists: {key}")]
    ObjectAlreadyExists { key: String },

    #[error("Object not found: {key}")]
    ObjectNotFound { key: String },

    #[error("Hash mismatch: grant was issued for {expected}, content hashes to {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Access grant has expired or is invalid")]
    AccessGrantExpired,

    #[error("Malformed access URL: {reason}")]
    MalformedAccessUrl { reason: String },

    #[error("Storage backend unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Transfer failed: {message}")]
    TransferFailed {
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TransferError {
    pub fn invalid_file_name<S: Into<String>>(file_name: S) -> Self {
        Self::InvalidFileName {
            file_name: file_name.into(),
        }
    }

    pub fn already_exists<S: Into<String>>(key: S) -> Self {
        Self::ObjectAlreadyExists { key: key.into() }
    }

    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::ObjectNotFound { key: key.into() }
    }

    pub fn malformed_url<S: Into<String>>(reason: S) -> Self {
        Self::MalformedAccessUrl {
            reason: reason.into(),
        }
    }

    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Backend failure without an underlying error value
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Backend failure wrapping the SDK/driver error
    pub fn storage_source<S, E>(message: S, error: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StorageUnavailable {
            message: message.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Non-success status returned by the transport
    pub fn transfer_status(status: u16) -> Self {
        Self::TransferFailed {
            status: Some(status),
            message: format!("HTTP status {}", status),
            source: None,
        }
    }

    /// Transport-level failure (connect, timeout, body read)
    pub fn transfer_source<S, E>(message: S, error: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::TransferFailed {
            status: None,
            message: message.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Stable identifier for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::HashingUnavailable { .. } => "HashingUnavailable",
            Self::EmptyFile => "EmptyFile",
            Self::FileTooLarge { .. } => "FileTooLarge",
            Self::InvalidFileName { .. } => "InvalidFileName",
            Self::ObjectAlreadyExists { .. } => "ObjectAlreadyExists",
            Self::ObjectNotFound { .. } => "ObjectNotFound",
            Self::HashMismatch { .. } => "HashMismatch",
            Self::AccessGrantExpired => "AccessGrantExpired",
            Self::MalformedAccessUrl { .. } => "MalformedAccessUrl",
            Self::StorageUnavailable { .. } => "StorageUnavailable",
            Self::TransferFailed { .. } => "TransferFailed",
            Self::InvalidConfig { .. } => "InvalidConfig",
            Self::Io { .. } => "Io",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::EmptyFile | Self::InvalidFileName { .. } | Self::MalformedAccessUrl { .. } => {
                ErrorClass::BadRequest
            }
            Self::FileTooLarge { .. } => ErrorClass::PayloadTooLarge,
            Self::ObjectAlreadyExists { .. } => ErrorClass::Conflict,
            Self::ObjectNotFound { .. } => ErrorClass::NotFound,
            Self::HashMismatch { .. } | Self::AccessGrantExpired => ErrorClass::Forbidden,
            Self::TransferFailed { .. } => ErrorClass::BadGateway,
            Self::StorageUnavailable { .. } => ErrorClass::Unavailable,
            Self::HashingUnavailable { .. } | Self::InvalidConfig { .. } | Self::Io { .. } => {
                ErrorClass::GeneralError
            }
        }
    }

    pub fn status_code(&self) -> u16 {
        self.class().status_code()
    }

    /// Whether the caller caused this error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Client-facing payload. Sources stay in the logs.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.code(),
            "message": self.to_string(),
            "code": self.status_code(),
            "className": self.class().class_name(),
        })
    }
}

/// HTTP-facing classes the error kinds fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    BadRequest,      // 400
    Forbidden,       // 403
    NotFound,        // 404
    Conflict,        // 409
    PayloadTooLarge, // 413
    GeneralError,    // 500
    BadGateway,      // 502
    Unavailable,     // 503
}

impl ErrorClass {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorClass::BadRequest => 400,
            ErrorClass::Forbidden => 403,
            ErrorClass::NotFound => 404,
            ErrorClass::Conflict => 409,
            ErrorClass::PayloadTooLarge => 413,
            ErrorClass::GeneralError => 500,
            ErrorClass::BadGateway => 502,
            ErrorClass::Unavailable => 503,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorClass::BadRequest => "BadRequest",
            ErrorClass::Forbidden => "Forbidden",
            ErrorClass::NotFound => "NotFound",
            ErrorClass::Conflict => "Conflict",
            ErrorClass::PayloadTooLarge => "PayloadTooLarge",
            ErrorClass::GeneralError => "GeneralError",
            ErrorClass::BadGateway => "BadGateway",
            ErrorClass::Unavailable => "Unavailable",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorClass::BadRequest => "bad-request",
            ErrorClass::Forbidden => "forbidden",
            ErrorClass::NotFound => "not-found",
            ErrorClass::Conflict => "conflict",
            ErrorClass::PayloadTooLarge => "payload-too-large",
            ErrorClass::GeneralError => "general-error",
            ErrorClass::BadGateway => "bad-gateway",
            ErrorClass::Unavailable => "unavailable",
        }
    }
}
