use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("provider '{provider}' is missing required fields: {}", .fields.join(", "))]
    MissingProviderFields {
        provider: String,
        fields: Vec<String>,
    },

    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("could not obtain access token")]
    NoAccessToken { body: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String, body: String },
}

impl Error {
    /// Raw upstream payload attached to the error, when one exists.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::HttpStatus { body, .. }
            | Error::NoAccessToken { body }
            | Error::InvalidResponse { body, .. } => Some(body),
            _ => None,
        }
    }
}
