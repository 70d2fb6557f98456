use central_storage_core::error::RepositoryError;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use thiserror::Error;

/// Failures talking to the storage server.
#[derive(Error, Debug)]
pub enum StorageServerError {
    /// The request failed or the server answered with an error status.
    /// Carries the raw response when there was one.
    #[error("Central storage server error: {message}")]
    Request {
        message: String,
        status: Option<StatusCode>,
        response: Option<String>,
        headers: HeaderMap,
    },

    #[error("Central storage returned invalid content (no json)")]
    InvalidContent(String),

    #[error("Central storage returned no assets")]
    EmptyResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for StorageServerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request {
            message: err.to_string(),
            status: err.status(),
            response: None,
            headers: HeaderMap::new(),
        }
    }
}

impl StorageServerError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }

    /// Raw response body, if the server sent one.
    pub fn response(&self) -> Option<&str> {
        match self {
            Self::Request { response, .. } => response.as_deref(),
            Self::InvalidContent(body) => Some(body),
            _ => None,
        }
    }

    pub fn response_headers(&self) -> Option<&HeaderMap> {
        match self {
            Self::Request { headers, .. } => Some(headers),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AssetManagerError {
    #[error(transparent)]
    Server(#[from] StorageServerError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
