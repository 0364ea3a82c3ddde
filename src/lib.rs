pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod rules;
pub mod runner;

use bytes::Bytes;
use futures_util::stream::Stream;
use futures_util::StreamExt;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use std::pin::Pin;
use tracing::debug;

use error::Error;

/// One decoded stream event. The schema is the provider's business; events
/// pass through this client opaque and uninterpreted.
pub type Event = serde_json::Value;

// ---------------------------------------------------------------------------
// LineDecoder: incremental newline splitter
// ---------------------------------------------------------------------------

/// Splits an incoming byte stream into lines, across chunk boundaries.
///
/// Lines are trimmed; a line that trims to empty is a keep-alive heartbeat
/// from the provider, which callers skip. Bytes after the last newline stay
/// buffered until the next chunk (or [`LineDecoder::take_remainder`] at
/// end of stream).
///
/// The buffer holds raw bytes and only complete lines are decoded as UTF-8,
/// so a multibyte character split across two chunks survives intact.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        LineDecoder::default()
    }

    /// Append a chunk of bytes to the internal buffer.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Pop the next complete line, or `None` if no newline is buffered yet.
    pub fn next_line(&mut self) -> Option<String> {
        let line_end = self.buffer.iter().position(|&b| b == b'\n')?;
        let line = String::from_utf8_lossy(&self.buffer[..line_end])
            .trim()
            .to_string();
        self.buffer.drain(..=line_end);
        Some(line)
    }

    /// Drain whatever is left after the final newline. Used once, when the
    /// connection has ended.
    pub fn take_remainder(&mut self) -> String {
        let rest = std::mem::take(&mut self.buffer);
        String::from_utf8_lossy(&rest).trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// StreamClient: long-poll connection opener
// ---------------------------------------------------------------------------

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Opens the long-lived filtered-stream connection. Built once at startup
/// from the immutable header set and stream config; reconnection is just
/// another [`StreamClient::connect`] call.
pub struct StreamClient {
    client: Client,
    headers: HeaderMap,
    endpoint: String,
    query: Vec<(String, String)>,
}

impl StreamClient {
    pub fn new(
        headers: HeaderMap,
        endpoint: impl Into<String>,
        query: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        StreamClient {
            client: Client::new(),
            headers,
            endpoint: endpoint.into(),
            query: query.into_iter().collect(),
        }
    }

    /// Issue the streaming GET and hand back a session over its body.
    ///
    /// Any status other than 200 terminates here with [`Error::Api`]
    /// carrying the status and body. No event is ever produced from a
    /// failed connect.
    pub async fn connect(&self) -> Result<EventSession, Error> {
        let response = self
            .client
            .get(&self.endpoint)
            .headers(self.headers.clone())
            .query(&self.query)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Error::from_response(response).await);
        }

        debug!(endpoint = %self.endpoint, "stream connected");
        Ok(EventSession::new(Box::pin(response.bytes_stream())))
    }
}

// ---------------------------------------------------------------------------
// EventSession: one streaming connection, consumed event by event
// ---------------------------------------------------------------------------

/// A single open streaming connection, consumed one event at a time.
///
/// Non-restartable: when [`EventSession::next_event`] returns `Ok(None)`
/// the peer has closed the connection cleanly and the session is spent.
/// The caller decides whether to connect again.
pub struct EventSession {
    stream: ByteStream,
    decoder: LineDecoder,
    ended: bool,
}

impl std::fmt::Debug for EventSession {
    // The boxed byte stream is opaque; show the decoder state instead.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSession")
            .field("decoder", &self.decoder)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl EventSession {
    fn new(stream: ByteStream) -> Self {
        EventSession {
            stream,
            decoder: LineDecoder::new(),
            ended: false,
        }
    }

    /// Pull the next event off the connection.
    ///
    /// Blank lines (heartbeats) are skipped silently; every non-blank line
    /// must be one JSON document, in arrival order. A malformed line is
    /// fatal ([`Error::Decode`]), a mid-transfer connection failure is
    /// fatal ([`Error::Transport`]), and a clean close is `Ok(None)`.
    pub async fn next_event(&mut self) -> Result<Option<Event>, Error> {
        loop {
            while let Some(line) = self.decoder.next_line() {
                if line.is_empty() {
                    continue; // heartbeat
                }
                return Ok(Some(serde_json::from_str(&line)?));
            }

            if self.ended {
                return Ok(None);
            }

            match self.stream.next().await {
                Some(chunk) => self.decoder.push(&chunk?),
                None => {
                    self.ended = true;
                    // A final line without a trailing newline still counts.
                    let rest = self.decoder.take_remainder();
                    if rest.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(serde_json::from_str(&rest)?));
                }
            }
        }
    }
}
