use futures::{SinkExt, StreamExt};
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::StompCodec;
use crate::config::{Mode, SessionConfig};
use crate::error::SessionError;
use crate::frame::Frame;
use crate::reply::{Reply, check_status};

/// Logical state of a session.
///
/// `Unconnected -> Connected -> Subscribed | Sent -> Disconnected`. A session
/// leaves `Unconnected` only after a non-ERROR reply to CONNECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected,
    Subscribed,
    Sent,
    Disconnected,
}

impl SessionState {
    fn as_str(&self) -> &'static str {
        match self {
            SessionState::Unconnected => "unconnected",
            SessionState::Connected => "connected",
            SessionState::Subscribed => "subscribed",
            SessionState::Sent => "sent",
            SessionState::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a send loop.
#[derive(Debug, Default)]
pub struct SendReport {
    /// SEND frames the loop tried to deliver (including a failed one).
    pub attempted: usize,
    /// SEND frames answered with a non-ERROR reply.
    pub delivered: usize,
    /// Successful replies, in send order.
    pub replies: Vec<Reply>,
    /// Index and cause of the message that stopped the loop, if any.
    pub failure: Option<(usize, SessionError)>,
}

impl SendReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Why a receive loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveEnd {
    /// The cancellation token fired.
    Cancelled,
    /// The broker closed the stream.
    StreamClosed,
}

/// Result of a receive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveSummary {
    /// Replies handed to the callback.
    pub delivered: usize,
    pub end: ReceiveEnd,
}

/// What `Session::run` did between CONNECT and DISCONNECT.
#[derive(Debug)]
pub enum Outcome {
    Sent(SendReport),
    Received(ReceiveSummary),
}

/// One STOMP session over an exclusively owned byte stream.
///
/// Every step is a full round trip awaited to completion before the next:
/// a frame is encoded, written and flushed, then (where the verb expects one)
/// a reply is read and checked. Nothing runs in the background.
///
/// `disconnect` and `close` consume the session, so the underlying stream is
/// shut down exactly once.
pub struct Session<T> {
    framed: Framed<T, StompCodec>,
    config: SessionConfig,
    state: SessionState,
}

impl Session<TcpStream> {
    /// Open a TCP connection to `config.address`. No frame is sent yet.
    pub async fn open(config: SessionConfig) -> Result<Self, SessionError> {
        let stream = TcpStream::connect(&config.address)
            .await
            .map_err(SessionError::Io)?;
        debug!(address = %config.address, "tcp stream opened");
        Ok(Session::new(stream, config))
    }
}

impl<T> Session<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already open transport. The session starts `Unconnected`.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            framed: Framed::new(transport, StompCodec::new()),
            config,
            state: SessionState::Unconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Encode, write and flush one frame.
    ///
    /// A frame with an empty command is refused with
    /// `SessionError::InvalidFrame` before anything is written.
    pub async fn send_frame(&mut self, frame: Frame) -> Result<(), SessionError> {
        if frame.command.is_empty() {
            return Err(SessionError::InvalidFrame("empty command".to_string()));
        }
        debug!(
            command = %frame.command,
            headers = frame.headers.len(),
            body_len = frame.body.len(),
            "sending frame"
        );
        self.framed.send(frame).await.map_err(SessionError::Transmit)
    }

    /// Read one reply. End of stream yields an empty reply.
    pub async fn read_reply(&mut self) -> Result<Reply, SessionError> {
        match self.framed.next().await {
            Some(Ok(reply)) => {
                debug!(
                    command = reply.command().unwrap_or_default(),
                    lines = reply.lines.len(),
                    "reply received"
                );
                Ok(reply)
            }
            Some(Err(e)) => Err(SessionError::Receive(e)),
            None => {
                debug!("stream ended");
                Ok(Reply::default())
            }
        }
    }

    async fn exchange(&mut self, frame: Frame) -> Result<Reply, SessionError> {
        self.send_frame(frame).await?;
        let reply = self.read_reply().await?;
        check_status(reply)
    }

    fn expect_state(
        &self,
        operation: &'static str,
        expected: SessionState,
    ) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Send CONNECT with the configured credentials and require a non-ERROR
    /// reply. Any failure is wrapped in `SessionError::ConnectFailure` and
    /// leaves the session `Unconnected`.
    pub async fn connect(&mut self) -> Result<Reply, SessionError> {
        self.expect_state("connect", SessionState::Unconnected)?;
        let frame = Frame::connect(&self.config.login, &self.config.passcode);
        let reply = self
            .exchange(frame)
            .await
            .map_err(|e| SessionError::ConnectFailure(Box::new(e)))?;
        self.state = SessionState::Connected;
        info!(address = %self.config.address, login = %self.config.login, "connected");
        Ok(reply)
    }

    /// Send SUBSCRIBE for the configured destination. The broker does not
    /// answer a SUBSCRIBE, so only the write can fail.
    ///
    /// An ERROR the broker sends after SUBSCRIBE (for example for an unknown
    /// destination) is delivered through `receive` like any other reply; it
    /// never becomes a `SubscribeFailure`.
    pub async fn subscribe(&mut self) -> Result<(), SessionError> {
        self.expect_state("subscribe", SessionState::Connected)?;
        let frame = Frame::subscribe(&self.config.destination);
        self.send_frame(frame)
            .await
            .map_err(|e| SessionError::SubscribeFailure(Box::new(e)))?;
        self.state = SessionState::Subscribed;
        info!(destination = %self.config.destination, "subscribed");
        Ok(())
    }

    /// Send `body` to the configured destination `count` times.
    ///
    /// Message `i` carries `receipt:message-<i>` and must be answered with a
    /// non-ERROR reply. The first failure stops the loop and is recorded in
    /// the report; it does not fail the call.
    pub async fn send_messages(
        &mut self,
        body: &str,
        count: usize,
    ) -> Result<SendReport, SessionError> {
        self.expect_state("send", SessionState::Connected)?;
        let destination = self.config.destination.clone();
        let mut report = SendReport::default();

        for index in 0..count {
            let frame = Frame::send(&destination, &Frame::receipt_id(index), body);
            report.attempted += 1;
            match self.exchange(frame).await {
                Ok(reply) => {
                    debug!(index, "message delivered");
                    report.delivered += 1;
                    report.replies.push(reply);
                }
                Err(e) => {
                    warn!(index, error = %e, "send failed, skipping remaining messages");
                    report.failure = Some((index, e));
                    break;
                }
            }
        }

        self.state = SessionState::Sent;
        info!(
            destination = %destination,
            delivered = report.delivered,
            requested = count,
            "send loop finished"
        );
        Ok(report)
    }

    /// Hand every non-empty reply to `on_reply` in arrival order until
    /// `cancel` fires or the broker closes the stream.
    ///
    /// A read in progress is abandoned when `cancel` fires; bytes already
    /// buffered stay in the codec. ERROR replies are delivered like any other
    /// and logged.
    pub async fn receive<F>(
        &mut self,
        cancel: &CancellationToken,
        mut on_reply: F,
    ) -> Result<ReceiveSummary, SessionError>
    where
        F: FnMut(&Reply),
    {
        self.expect_state("receive", SessionState::Subscribed)?;
        let mut delivered = 0usize;
        loop {
            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(delivered, "receive cancelled");
                    return Ok(ReceiveSummary { delivered, end: ReceiveEnd::Cancelled });
                }
                reply = self.read_reply() => reply?,
            };

            if reply.is_empty() {
                info!(delivered, "broker closed the stream");
                return Ok(ReceiveSummary {
                    delivered,
                    end: ReceiveEnd::StreamClosed,
                });
            }
            if reply.is_error() {
                warn!(reply = %reply.text(), "broker sent ERROR");
            }
            delivered += 1;
            on_reply(&reply);
        }
    }

    /// Send DISCONNECT and close the stream. Failures are logged, never
    /// returned.
    pub async fn disconnect(mut self) {
        if let Err(e) = self.send_frame(Frame::disconnect()).await {
            warn!(error = %e, "disconnect failed");
        }
        self.state = SessionState::Disconnected;
        self.close().await;
    }

    /// Close the stream without sending DISCONNECT.
    ///
    /// The transport is shut down exactly once. Bytes left in the write
    /// buffer by an earlier failed send are discarded.
    pub async fn close(self) {
        let state = self.state;
        let mut transport = self.framed.into_inner();
        if let Err(e) = transport.shutdown().await {
            warn!(error = %e, "closing stream failed");
        }
        debug!(state = %state, "stream closed");
    }

    /// Run a whole session: CONNECT, then SUBSCRIBE + receive loop or the
    /// send loop, then DISCONNECT.
    ///
    /// A failed CONNECT or SUBSCRIBE closes the stream and returns the error
    /// without sending anything else. Replies produced by the main phase are
    /// passed to `on_reply`.
    pub async fn run<F>(
        mut self,
        mode: &Mode,
        cancel: &CancellationToken,
        mut on_reply: F,
    ) -> Result<Outcome, SessionError>
    where
        F: FnMut(&Reply),
    {
        if let Err(e) = self.connect().await {
            self.close().await;
            return Err(e);
        }

        let outcome = match mode {
            Mode::Receive => {
                if let Err(e) = self.subscribe().await {
                    self.close().await;
                    return Err(e);
                }
                match self.receive(cancel, &mut on_reply).await {
                    Ok(summary) => Outcome::Received(summary),
                    Err(e) => {
                        self.disconnect().await;
                        return Err(e);
                    }
                }
            }
            Mode::Send { body, count } => match self.send_messages(body, *count).await {
                Ok(report) => {
                    report.replies.iter().for_each(&mut on_reply);
                    Outcome::Sent(report)
                }
                Err(e) => {
                    self.disconnect().await;
                    return Err(e);
                }
            },
        };

        self.disconnect().await;
        Ok(outcome)
    }
}
