//! MCP Transport Layer
//!
//! Newline-delimited JSON-RPC 2.0 over any async reader/writer pair; stdio in
//! production.

use super::protocol::{JsonRpcRequest, JsonRpcResponse};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// A line read from the client
#[derive(Debug)]
pub enum Incoming {
    Request(JsonRpcRequest),
    /// A non-empty line that is not a JSON-RPC request
    Malformed(String),
}

/// Async line transport for MCP
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

/// Transport bound to the process's stdin and stdout
pub type StdioTransport = LineTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Next message, skipping blank lines; `None` at EOF
    pub async fn read_message(&mut self) -> io::Result<Option<Incoming>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                return Ok(None);
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            return Ok(Some(match serde_json::from_str(line) {
                Ok(request) => Incoming::Request(request),
                Err(e) => {
                    tracing::error!("Failed to parse JSON-RPC request: {}", e);
                    Incoming::Malformed(e.to_string())
                }
            }));
        }
    }

    /// Write one response followed by a newline
    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response)?;
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::JsonRpcError;

    #[tokio::test]
    async fn test_reads_requests_and_skips_blank_lines() {
        let input = b"\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\n not json\n" as &[u8];
        let mut transport = LineTransport::new(input, Vec::new());

        match transport.read_message().await.unwrap() {
            Some(Incoming::Request(request)) => assert_eq!(request.method, "ping"),
            other => panic!("expected request, got {other:?}"),
        }
        assert!(matches!(
            transport.read_message().await.unwrap(),
            Some(Incoming::Malformed(_))
        ));
        assert!(transport.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_writes_one_line_per_response() {
        let mut transport = LineTransport::new(&b""[..], Vec::new());
        transport
            .write_response(&JsonRpcResponse::success(
                Some(serde_json::json!(1)),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        transport
            .write_response(&JsonRpcResponse::error(
                None,
                JsonRpcError::parse_error("bad"),
            ))
            .await
            .unwrap();

        let output = String::from_utf8(transport.into_writer()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("-32700"));
    }
}
