// Single-channel MCP server: newline-delimited JSON-RPC over stdio

use crate::dispatcher::Dispatcher;
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use std::io;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

/// Maximum bytes per JSON-RPC message (1 MiB).
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Serves exactly one client over a duplex line channel.
///
/// Requests are handled strictly one after another; the reply to a request
/// is written before the next line is read.
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Serve on the process stdin/stdout until stdin closes.
    pub async fn start(&self) -> io::Result<()> {
        tracing::info!("MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve on an arbitrary reader/writer pair until the reader hits EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut raw = Vec::new();

        loop {
            raw.clear();
            // One byte past the limit is enough to tell an oversized line apart
            let n = (&mut reader)
                .take(MAX_MESSAGE_BYTES as u64 + 1)
                .read_until(b'\n', &mut raw)
                .await?;
            if n == 0 {
                tracing::info!("Client closed the channel");
                break;
            }

            if n > MAX_MESSAGE_BYTES && raw.last() != Some(&b'\n') {
                tracing::warn!("Message exceeds {} bytes, discarding it", MAX_MESSAGE_BYTES);
                discard_line(&mut reader).await?;
                write_response(&mut writer, &JsonRpcResponse::error(None, JsonRpcError::parse_error()))
                    .await?;
                continue;
            }

            let line = match std::str::from_utf8(&raw) {
                Ok(s) => s.trim(),
                Err(_) => {
                    tracing::warn!("Message is not valid UTF-8");
                    write_response(&mut writer, &JsonRpcResponse::error(None, JsonRpcError::parse_error()))
                        .await?;
                    continue;
                }
            };

            if line.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(line) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Parse error: {}", e);
                    write_response(&mut writer, &JsonRpcResponse::error(None, JsonRpcError::parse_error()))
                        .await?;
                    continue;
                }
            };

            if let Some(response) = self.dispatcher.handle_request(request).await {
                write_response(&mut writer, &response).await?;
            }
        }

        Ok(())
    }
}

/// Skip the rest of the current line without buffering it.
async fn discard_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(());
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let out = serde_json::to_string(response).map_err(io::Error::other)?;
    writer.write_all(out.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
