//! Direct synchronous machine channel
//!
//! Out-of-band queries and uploads that do not fit the fire-and-forget bus
//! model: open a transient line-oriented TCP connection to one machine's
//! control endpoint, send exactly one command, and read reply lines until a
//! termination keyword closes the conversation.
//!
//! The exchange is bounded: connect and reply both carry mandatory timeouts,
//! and dropping the returned future closes the socket, so a silent peer can
//! never hang the caller. A peer that closes without ever emitting a
//! termination keyword is a protocol failure even if lines were received —
//! partial conversations are not success.

use shopfloor_core::{ConnectionError, Error, ProtocolError, Result};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Keywords that end a conversation when they open a reply line
const TERMINATION_KEYWORDS: &[&str] = &["ok", "error", "ready"];

/// Timeouts governing one direct exchange
#[derive(Debug, Clone, Copy)]
pub struct DirectChannelConfig {
    /// Bound on establishing the TCP connection
    pub connect_timeout: Duration,
    /// Bound on the whole reply read loop, from write to terminator
    pub reply_timeout: Duration,
}

impl Default for DirectChannelConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            reply_timeout: Duration::from_secs(5),
        }
    }
}

/// A completed direct exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectReply {
    /// Every line received, terminator included, in arrival order
    pub lines: Vec<String>,
    /// The line that terminated the conversation
    pub terminator: String,
}

/// Check whether a reply line opens with a termination keyword
///
/// The keyword must be a whole leading token: it matches only when followed
/// by end-of-line (LF or CRLF) or one of the separators space, `(`, `:`, `,`
/// that controllers append metadata after, e.g. `error: bad input` or
/// `ok (queued)`. A longer word sharing the prefix (`lookout`) is not a
/// terminator.
pub fn is_termination(line: &str) -> bool {
    for keyword in TERMINATION_KEYWORDS {
        if let Some(rest) = line.strip_prefix(keyword) {
            let mut chars = rest.chars();
            match chars.next() {
                None | Some('\n') | Some(' ') | Some('(') | Some(':') | Some(',') => return true,
                Some('\r') if matches!(chars.next(), None | Some('\n')) => return true,
                _ => {}
            }
        }
    }
    false
}

/// Send one command to `addr` and collect the reply
///
/// Writes `command` followed by a line terminator, then reads lines until a
/// termination keyword is observed. Every line read, terminator included, is
/// passed to `on_line` in arrival order before the call returns, so callers
/// can stream the conversation to a log while it happens.
///
/// Errors:
/// - connect failure or connect timeout ([`ConnectionError`])
/// - reply timeout: no terminator within `config.reply_timeout`
/// - peer closed without a terminator ([`ProtocolError::NoTermination`])
pub async fn run_direct_command(
    addr: &str,
    command: &str,
    config: DirectChannelConfig,
    mut on_line: impl FnMut(&str),
) -> Result<DirectReply> {
    let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| ConnectionError::ConnectTimeout {
            timeout_ms: config.connect_timeout.as_millis() as u64,
        })?
        .map_err(|e| ConnectionError::FailedToConnect {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;

    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    tracing::debug!(addr, command, "direct channel open");
    writer.write_all(command.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    let read_loop = async {
        let mut collected = Vec::new();
        while let Some(line) = lines.next_line().await? {
            // Keepalive chatter from the websocket bridge firmware.
            if line.starts_with("PING") {
                continue;
            }

            on_line(&line);
            let terminated = is_termination(&line);
            collected.push(line);
            if terminated {
                let terminator = collected.last().cloned().unwrap_or_default();
                return Ok(DirectReply {
                    lines: collected,
                    terminator,
                });
            }
        }
        Err(Error::from(ProtocolError::NoTermination {
            lines_read: collected.len(),
        }))
    };

    timeout(config.reply_timeout, read_loop)
        .await
        .map_err(|_| {
            Error::from(ConnectionError::ReplyTimeout {
                timeout_ms: config.reply_timeout.as_millis() as u64,
            })
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_termination_exact_match() {
        assert!(is_termination("ok"));
        assert!(is_termination("ok\n"));
        assert!(is_termination("error\r\n"));
        assert!(is_termination("ready"));
    }

    #[test]
    fn test_termination_with_separator_metadata() {
        assert!(is_termination("error: bad input\n"));
        assert!(is_termination("ready, idle\n"));
        assert!(is_termination("ok (queued at 12:00)"));
        assert!(is_termination("ok 123"));
    }

    #[test]
    fn test_termination_requires_whole_leading_token() {
        assert!(!is_termination("lookout\n"));
        assert!(!is_termination("okay"));
        assert!(!is_termination("errors ahead"));
        assert!(!is_termination("readyness"));
        assert!(!is_termination("not ok"));
        assert!(!is_termination(""));
    }
}
