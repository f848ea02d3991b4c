use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Backend is not running. Start it with: ae serve")]
    Network(#[source] reqwest::Error),

    #[error("Server error: {0}")]
    Status(u16),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Request(#[source] reqwest::Error),

    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

impl FetchError {
    /// Text shown to the user in the error view.
    pub fn user_message(&self) -> String {
        format!("Failed to fetch articles. {}", self)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            Self::Network(error)
        } else if let Some(status) = error.status() {
            Self::Status(status.as_u16())
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Request(error)
        }
    }
}
