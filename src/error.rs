use thiserror::Error;

/// User-facing validation failures
///
/// The `Display` text of each variant is exactly what the user sees, so the
/// controller can surface `err.to_string()` without reinterpretation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a valid image file")]
    NotAnImage,

    #[error("File size must be less than 5MB")]
    ImageTooLarge,

    #[error("Could not read the selected image")]
    UnreadableImage,

    #[error("Please fill in all required fields")]
    MissingFields,

    #[error("Please select an image")]
    MissingImage,

    #[error("Title must be 100 characters or less")]
    TitleTooLong,

    #[error("Article body must be 450 characters or less")]
    BodyTooLong,

    #[error("Name and email are required.")]
    MissingProfileFields,
}

/// Failures talking to the backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Transport(String),

    /// A non-2xx response; `message` is the body's `error` field when present.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A 2xx response whose body did not match the contract.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status of an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures reading or writing the article file
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Article file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Article file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}
