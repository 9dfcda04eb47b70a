//! Line framing
//!
//! A request is one line: tokens joined by a single ASCII space and
//! terminated by `\n`. A response is one `\n`-terminated line whose
//! surrounding whitespace is stripped. There is no escaping, so a token
//! containing a space or newline changes the framing.

use crate::error::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Join tokens with single spaces (no trailing newline)
pub fn join_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut line = String::with_capacity(tokens.iter().map(|t| t.as_ref().len() + 1).sum());
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(token.as_ref());
    }
    line
}

/// Exact bytes that go on the wire for a token request
pub fn encode_request<S: AsRef<str>>(tokens: &[S]) -> Vec<u8> {
    let mut bytes = join_tokens(tokens).into_bytes();
    bytes.push(b'\n');
    bytes
}

/// Write `line` followed by `\n`, then flush
///
/// The flush matters: the child only sees the request once it leaves our
/// buffer, and it will not answer until it does.
pub async fn write_line<W>(writer: &mut W, line: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Read one line and strip surrounding whitespace
///
/// Returns `Ok(None)` on end-of-stream. A final line without a trailing
/// newline still counts as a line.
pub async fn read_line<R>(reader: &mut R) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    match reader.read_line(&mut line).await? {
        0 => Ok(None), // EOF
        _ => Ok(Some(line.trim().to_string())),
    }
}
