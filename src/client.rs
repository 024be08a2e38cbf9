//! Single-shot remote client.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::MAX_RESPONSE_BYTES;
use crate::error::{Error, Result};

/// Default timeout for connecting and for the whole exchange.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Join command words with single spaces, the way a shell splits them.
///
/// # Examples
/// ```
/// use fwpolicy::client::join_command;
///
/// assert_eq!(join_command(["A", "10.0.0.1", "80"]), "A 10.0.0.1 80");
/// ```
pub fn join_command<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| w.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Send one command to `host:port` and return the raw response text.
///
/// Reads until the server closes the connection, keeping at most
/// `MAX_RESPONSE_BYTES - 1` bytes.
pub async fn send_command(host: &str, port: u16, command: &str) -> Result<String> {
    send_command_with_timeout(host, port, command, DEFAULT_CLIENT_TIMEOUT).await
}

/// Like [`send_command`] with an explicit timeout for the whole exchange.
pub async fn send_command_with_timeout(
    host: &str,
    port: u16,
    command: &str,
    timeout: Duration,
) -> Result<String> {
    tokio::time::timeout(timeout, exchange(host, port, command))
        .await
        .map_err(|_| Error::Timeout("waiting for the server"))?
}

async fn exchange(host: &str, port: u16, command: &str) -> Result<String> {
    let mut stream = TcpStream::connect((host, port)).await?;
    log::debug!("Connected to {}", stream.peer_addr()?);

    stream.write_all(command.as_bytes()).await?;

    let mut buf = Vec::with_capacity(MAX_RESPONSE_BYTES);
    (&mut stream)
        .take((MAX_RESPONSE_BYTES - 1) as u64)
        .read_to_end(&mut buf)
        .await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_command() {
        assert_eq!(join_command(["L"]), "L");
        assert_eq!(
            join_command(vec!["A".to_string(), "10.0.0.1-10.0.0.5".into(), "80-90".into()]),
            "A 10.0.0.1-10.0.0.5 80-90"
        );
        assert_eq!(join_command(Vec::<String>::new()), "");
    }
}
