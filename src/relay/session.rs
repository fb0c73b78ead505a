//! The per-connection relay loop.
//!
//! One iteration relays one request/response pair:
//! read client headers → read client body → normalize request line →
//! route upstream → forward request → read upstream headers and body →
//! forward response. Request N+1 is not read until response N is delivered.
//!
//! A 1xx interim response counts as the whole exchange. `Expect: 100-continue`
//! is not supported, so the final response that follows a 1xx would be paired
//! with the client's next request.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::normalize::normalize_request_target;
use super::{RelayError, UpstreamConnector, UpstreamRouter};
use crate::wire::{content_length, is_chunked, read_body, read_headers, HttpMessage, Limits, WireError};

/// Outcome of writing one message. Write failures are counted rather than
/// aborting the send, so later parts of the message are still attempted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    pub attempted: usize,
    pub failed: usize,
}

impl SendReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, result: std::io::Result<()>) {
        self.attempted += 1;
        if let Err(e) = result {
            self.failed += 1;
            tracing::debug!(error = %e, "Write failed, continuing with remaining bytes");
        }
    }
}

/// Write the header block, then the body, then flush.
pub async fn send_message<W>(stream: &mut W, message: &HttpMessage) -> SendReport
where
    W: AsyncWrite + Unpin,
{
    let mut report = SendReport::default();
    report.record(stream.write_all(&message.header_bytes()).await);
    if let Some(body) = &message.body {
        report.record(stream.write_all(body).await);
    }
    report.record(stream.flush().await);
    report
}

enum Flow {
    Continue,
    ClientGone,
}

/// Relay state for one client connection.
pub struct Session<S, C: UpstreamConnector> {
    client: S,
    router: UpstreamRouter<C>,
    limits: Limits,
    exchanges: u64,
}

impl<S, C> Session<S, C>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    C: UpstreamConnector,
{
    pub fn new(client: S, connector: Arc<C>, limits: Limits) -> Self {
        Self {
            client,
            router: UpstreamRouter::new(connector),
            limits,
            exchanges: 0,
        }
    }

    /// Completed request/response exchanges.
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    pub fn router(&self) -> &UpstreamRouter<C> {
        &self.router
    }

    /// Relay exchanges until the client disconnects.
    ///
    /// A clean disconnect is `Ok`. Any other wire fault, a missing Host or a
    /// failure to reach the upstream ends the session with an error.
    pub async fn run(&mut self) -> Result<(), RelayError> {
        loop {
            match self.relay_once().await? {
                Flow::Continue => {}
                Flow::ClientGone => return Ok(()),
            }
        }
    }

    async fn relay_once(&mut self) -> Result<Flow, RelayError> {
        let limits = self.limits;

        let mut request = match read_headers(&mut self.client, &limits).await {
            Ok(request) => request,
            Err(WireError::Closed) => {
                tracing::debug!(exchanges = self.exchanges, "Client closed connection");
                return Ok(Flow::ClientGone);
            }
            Err(e) => return Err(e.into()),
        };
        request.body = read_framed_body(&mut self.client, &request, true, &limits).await?;
        tracing::debug!(headers = %request.escaped_headers(), "Headers from client");

        normalize_request_target(&mut request);
        let host = request.host().ok_or(RelayError::MissingHost)?.to_string();
        let head_request = request
            .start_line()
            .is_some_and(|line| line.starts_with("HEAD "));

        let upstream = self.router.route(&host).await?;
        let forwarded = send_message(upstream, &request).await;
        if !forwarded.is_clean() {
            tracing::warn!(host = %host, failed_writes = forwarded.failed, "Request forwarded with write failures");
        }

        let mut response = match read_headers(upstream, &limits).await {
            Ok(response) => response,
            Err(WireError::Closed) => return Err(RelayError::UpstreamClosed { host }),
            Err(e) => return Err(e.into()),
        };
        let has_body = !head_request && status_allows_body(response.start_line());
        response.body = read_framed_body(upstream, &response, has_body, &limits).await?;
        tracing::debug!(headers = %response.escaped_headers(), "Headers from server");

        tracing::info!(
            host = %host,
            request = request.start_line().unwrap_or_default(),
            status = response.start_line().unwrap_or_default(),
            "Relayed exchange"
        );

        let delivered = send_message(&mut self.client, &response).await;
        self.exchanges += 1;
        if !delivered.is_clean() {
            tracing::debug!(failed_writes = delivered.failed, "Client gone before response was delivered");
            return Ok(Flow::ClientGone);
        }
        Ok(Flow::Continue)
    }
}

async fn read_framed_body<R>(
    stream: &mut R,
    message: &HttpMessage,
    has_body: bool,
    limits: &Limits,
) -> Result<Option<Vec<u8>>, WireError>
where
    R: AsyncRead + Unpin,
{
    if !has_body {
        return Ok(None);
    }
    let chunked = is_chunked(message);
    let length = content_length(message)?;
    read_body(stream, length, chunked, limits).await
}

/// 1xx, 204 and 304 responses never carry a body.
fn status_allows_body(status_line: Option<&str>) -> bool {
    let code = status_line
        .and_then(|line| line.split(' ').nth(1))
        .and_then(|code| code.parse::<u16>().ok());
    !matches!(code, Some(100..=199 | 204 | 304))
}
