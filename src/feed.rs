//! Newline-delimited JSON feed of stream messages.

use std::io;

use futures::{Stream, stream};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::warn;

use crate::types::StreamMessage;

/// Yields stream messages as their lines arrive.
///
/// Blank lines are ignored. Lines that are not a valid stream message,
/// including lines that are not UTF-8, are logged and skipped. A read error
/// is yielded as is; callers should stop at the first one.
pub fn messages<R>(reader: R) -> impl Stream<Item = io::Result<StreamMessage>>
where
    R: AsyncRead + Unpin,
{
    let segments = BufReader::new(reader).split(b'\n');
    stream::unfold((segments, 0usize), |(mut segments, mut line)| async move {
        loop {
            let segment = match segments.next_segment().await {
                Ok(Some(segment)) => segment,
                Ok(None) => return None,
                Err(e) => return Some((Err(e), (segments, line))),
            };
            line += 1;
            if segment.trim_ascii().is_empty() {
                continue;
            }
            match serde_json::from_slice::<StreamMessage>(&segment) {
                Ok(message) => return Some((Ok(message), (segments, line))),
                Err(e) => warn!(line, error = %e, "Skipping invalid stream message"),
            }
        }
    })
}
