use thiserror::Error;

/// Errors that can occur while managing rules or consuming the stream.
///
/// Every variant is fatal to its call site; the client performs no internal
/// retry. A cleanly closed stream connection is not an error and is reported
/// as `Ok(None)` by the session instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The provider replied with an unexpected HTTP status. Carries the
    /// status code and the full response body for diagnosis.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Request could not be sent or the connection failed mid-transfer.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A non-blank stream line that is not valid JSON.
    #[error("malformed stream line: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration file could not be read or parsed, or no bearer token
    /// was found in either the environment or the file.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build an `Api` error from a response, consuming its body.
    ///
    /// The body read itself can fail at the transport level, in which case
    /// that failure wins.
    pub(crate) async fn from_response(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => Error::Api { status, body },
            Err(e) => Error::Transport(e),
        }
    }
}
