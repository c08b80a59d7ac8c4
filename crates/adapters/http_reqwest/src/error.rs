//! Errors raised while setting up the HTTP clients.

/// Errors originating from the outbound HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    /// The underlying client could not be built.
    #[error("http client error")]
    Client(#[from] reqwest::Error),

    /// A configured base URL is empty.
    #[error("{0} url is not configured")]
    MissingUrl(&'static str),
}
