//! The reconnect loop that drives stream consumption.
//!
//! One session at a time: connect, drain events until the peer closes,
//! reconnect immediately. The attempt counter is logged but never used to
//! bound attempts or delay reconnection; any error tears the loop down.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::Error;
use crate::{Event, StreamClient};

/// Placeholder consumer: pretty-print one event to stdout. Keys are emitted
/// in sorted order (serde_json's default map ordering).
fn print_event(event: &Event) {
    match serde_json::to_string_pretty(event) {
        Ok(pretty) => println!("{}", pretty),
        Err(e) => warn!(error = %e, "event not printable"),
    }
}

/// Connect, consume, reconnect, until shutdown is signalled or an error
/// propagates.
///
/// A cleanly ended connection is the one non-fatal terminal state: the loop
/// counts it and reconnects with no delay, mirroring the provider's
/// expectation that clients simply dial back in. Every [`Error`] is fatal
/// and returned to the caller.
pub async fn run(
    client: &StreamClient,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Error> {
    let mut attempts: u64 = 0;

    loop {
        if *shutdown.borrow() {
            info!("shutdown requested, leaving reconnect loop");
            return Ok(());
        }

        let mut session = tokio::select! {
            result = client.connect() => result?,
            _ = shutdown.changed() => {
                info!("shutdown requested while connecting");
                return Ok(());
            }
        };

        loop {
            tokio::select! {
                result = session.next_event() => match result? {
                    Some(event) => print_event(&event),
                    None => break,
                },
                _ = shutdown.changed() => {
                    info!("shutdown requested mid-session");
                    return Ok(());
                }
            }
        }

        attempts += 1;
        info!(attempts, "stream connection ended, reconnecting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;

    #[tokio::test]
    async fn test_run_exits_cleanly_when_shutdown_already_signalled() {
        // Unroutable endpoint: the loop must return before any connect.
        let client = StreamClient::new(HeaderMap::new(), "http://0.0.0.0:0/stream", vec![]);
        let (tx, rx) = watch::channel(false);
        tx.send(true).expect("send");
        run(&client, rx).await.expect("clean exit");
    }
}
