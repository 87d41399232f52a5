/// Failures of a single calorie estimate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no file uploaded")]
    MissingInput,
    #[error("unsupported image upload: {0}")]
    UnsupportedImage(String),
    #[error("malformed form data: {0}")]
    Multipart(String),
    #[error("upload is larger than the size limit: {0}")]
    TooLarge(String),
    #[error("generation call failed: {0}")]
    Service(#[from] ServiceError),
}

/// Anything that went wrong talking to the generation service. None of
/// these are retried.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("http request failed: {0}")]
    Http(reqwest::Error),
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response body {0}")]
    Decode(#[from] serde_json::Error),
    #[error("prompt was blocked: {0}")]
    Blocked(String),
    #[error("response contained no text")]
    EmptyResponse,
}
