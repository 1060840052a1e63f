//! Event feed reader
//!
//! Reads line-delimited JSON messages from stdin or a file on its own task
//! and forwards each non-blank line over a bounded channel. The channel
//! closes when the input ends. A line that is not valid UTF-8 is logged and
//! skipped; only a failing read ends the feed early.

use std::path::Path;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const FEED_QUEUE: usize = 256;

pub type FeedInput = Box<dyn AsyncRead + Unpin + Send>;

/// Open the feed file, or stdin when no path is given
pub async fn open(path: Option<&Path>) -> anyhow::Result<FeedInput> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening feed {}", path.display()))?;
            log::info!("Reading events from {}", path.display());
            Ok(Box::new(file))
        }
        None => {
            log::info!("Reading events from stdin");
            Ok(Box::new(tokio::io::stdin()))
        }
    }
}

/// Spawn the reader task. Its handle yields the number of lines forwarded.
pub fn spawn<R>(input: R) -> (mpsc::Receiver<String>, JoinHandle<anyhow::Result<u64>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(FEED_QUEUE);
    let handle = tokio::spawn(async move {
        let mut reader = BufReader::new(input);
        let mut buf = Vec::new();
        let mut line_no = 0u64;
        let mut forwarded = 0u64;
        loop {
            buf.clear();
            if reader
                .read_until(b'\n', &mut buf)
                .await
                .context("reading feed")?
                == 0
            {
                break;
            }
            line_no += 1;
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    log::warn!("Feed line {}: skipped, {}", line_no, e);
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            if tx.send(line.to_string()).await.is_err() {
                log::debug!("Feed consumer gone, stopping reader");
                break;
            }
            forwarded += 1;
        }
        log::debug!("Feed ended after {} lines", forwarded);
        Ok::<u64, anyhow::Error>(forwarded)
    });
    (rx, handle)
}
