use thiserror::Error;

#[derive(Debug, Error)]
pub enum MwApiError {
    #[error("HTTP error: {status} {url}")]
    Http { status: u16, url: String, body: String },

    #[error("API error: {code}: {info}")]
    ApiError { code: String, info: String },

    #[error("Unexpected response: {0}")]
    MalformedResponse(String),

    #[error("Invalid API URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Deserialization: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Network: {0}")]
    Network(#[from] reqwest::Error),
}
