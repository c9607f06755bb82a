//! # ethertag
//!
//! An EtherNet/IP communication library for reading and writing tagged data
//! on CIP-capable controllers: Allen-Bradley-style PLCs and FANUC robot
//! controllers.
//!
//! The crate is layered the way the protocol is:
//!
//! - [`codec`]: pure encoders/decoders for the CIP scalar types and the
//!   [`PlcValue`] tagged union;
//! - [`tag_path`]: symbolic request-path construction;
//! - [`cip`]: Read Tag / Write Tag service requests, response parsing, and
//!   the CIP general-status table;
//! - [`EipClient`]: the encapsulation session, owning one registered TCP
//!   connection and speaking the List Identity / Send RR Data / Send Unit
//!   Data commands;
//! - [`PlcClient`]: the typed single-tag facade most applications use;
//! - [`fanuc`]: FANUC register naming (`R[1]`, `PR[3].X`, `DI[7]`, ...) on
//!   top of the typed facade;
//! - [`retry`]: opt-in exponential backoff for transport-class failures.
//!
//! ## Quick start
//!
//! ```no_run
//! use ethertag::{CipType, PlcClient, PlcValue};
//!
//! #[tokio::main]
//! async fn main() -> ethertag::Result<()> {
//!     let client = PlcClient::connect("192.168.1.10").await?;
//!
//!     let counter = client.read_tag("Counter", CipType::Dint).await?;
//!     println!("Counter = {}", counter);
//!
//!     client
//!         .write_tag("SetPoint", CipType::Real, &PlcValue::Real(72.5))
//!         .await?;
//!
//!     client.close().await
//! }
//! ```
//!
//! All calls on one client are serialized over the session's TCP stream;
//! request *k*'s reply is fully read before request *k + 1* is written. Run
//! independent clients for concurrent controllers.

pub mod cip;
pub mod codec;
pub mod config;
pub mod error;
pub mod fanuc;
pub mod plc;
pub mod retry;
pub mod tag_path;

pub use codec::{CipType, PlcValue};
pub use config::ClientConfig;
pub use error::{EipError, Result};
pub use fanuc::{FanucClient, Position, RegisterType, RegisterValue};
pub use plc::PlcClient;
pub use retry::{retry_with_backoff, RetryPolicy};

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

/// Default EtherNet/IP TCP port.
pub const DEFAULT_PORT: u16 = 44818;
/// Protocol version sent in Register Session.
pub const PROTOCOL_VERSION: u16 = 1;

/// NOP.
pub const COMMAND_NOP: u16 = 0x0000;
/// List Identity.
pub const COMMAND_LIST_IDENTITY: u16 = 0x0063;
/// List Interfaces.
pub const COMMAND_LIST_INTERFACES: u16 = 0x0064;
/// Register Session.
pub const COMMAND_REGISTER_SESSION: u16 = 0x0065;
/// Unregister Session.
pub const COMMAND_UNREGISTER_SESSION: u16 = 0x0066;
/// Send RR Data.
pub const COMMAND_SEND_RR_DATA: u16 = 0x006F;
/// Send Unit Data.
pub const COMMAND_SEND_UNIT_DATA: u16 = 0x0070;
/// Indicate Status.
pub const COMMAND_INDICATE_STATUS: u16 = 0x0072;
/// Cancel.
pub const COMMAND_CANCEL: u16 = 0x0073;

/// The 24-byte EtherNet/IP encapsulation header.
///
/// Every command and reply starts with one of these; `length` counts the
/// payload bytes that follow. All fields are little-endian on the wire.
/// This client sends `sender_context` and `options` as zero on every
/// outbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EipHeader {
    /// Encapsulation command code.
    pub command: u16,
    /// Payload length in bytes.
    pub length: u16,
    /// Session handle; zero until Register Session assigns one.
    pub session_handle: u32,
    /// Status word; zero on success.
    pub status: u32,
    /// Opaque correlation bytes, unused by this client.
    pub sender_context: [u8; 8],
    /// Options word; always zero.
    pub options: u32,
}

impl EipHeader {
    /// Size of the encoded header.
    pub const LEN: usize = 24;

    /// Builds an outbound header with zero status, context, and options.
    pub fn new(command: u16, session_handle: u32, length: u16) -> Self {
        Self {
            command,
            length,
            session_handle,
            status: 0,
            sender_context: [0; 8],
            options: 0,
        }
    }

    /// Encodes the header to its wire form.
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        buf[0..2].copy_from_slice(&self.command.to_le_bytes());
        buf[2..4].copy_from_slice(&self.length.to_le_bytes());
        buf[4..8].copy_from_slice(&self.session_handle.to_le_bytes());
        buf[8..12].copy_from_slice(&self.status.to_le_bytes());
        buf[12..20].copy_from_slice(&self.sender_context);
        buf[20..24].copy_from_slice(&self.options.to_le_bytes());
        buf
    }

    /// Decodes a header from the first 24 bytes of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::LEN {
            return Err(EipError::parse(format!(
                "encapsulation header needs {} bytes, have {}",
                Self::LEN,
                buf.len()
            )));
        }
        let mut sender_context = [0u8; 8];
        sender_context.copy_from_slice(&buf[12..20]);
        Ok(Self {
            command: u16::from_le_bytes([buf[0], buf[1]]),
            length: u16::from_le_bytes([buf[2], buf[3]]),
            session_handle: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            status: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            sender_context,
            options: u32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]),
        })
    }
}

struct SessionState {
    /// `None` once the session is closed; only a reconnect brings it back.
    stream: Option<TcpStream>,
    /// Zero iff the session is not registered.
    session_handle: u32,
}

/// An EtherNet/IP encapsulation session over one TCP connection.
///
/// The client moves through three states: closed (no stream), connected
/// (stream, handle 0), and registered (non-zero handle). Register Session
/// must succeed before [`send_rr_data`](Self::send_rr_data) or
/// [`send_unit_data`](Self::send_unit_data) are usable. Any transport
/// failure (an I/O error, a missed deadline, a peer hang-up mid-frame)
/// closes the session.
///
/// All operations take `&self` and serialize on an internal mutex, so an
/// `EipClient` can be shared across tasks.
pub struct EipClient {
    state: Mutex<SessionState>,
    config: ClientConfig,
}

impl EipClient {
    /// Connects with the default configuration.
    ///
    /// `addr` may omit the port; the EtherNet/IP default 44818 is appended.
    pub async fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_config(addr, ClientConfig::default()).await
    }

    /// Connects with an explicit configuration.
    pub async fn connect_with_config(addr: &str, config: ClientConfig) -> Result<Self> {
        let addr = ensure_port(addr, DEFAULT_PORT);
        let stream = match timeout(config.connect_timeout, TcpStream::connect(addr.as_str())).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(EipError::Io(e)),
            Err(_) => return Err(EipError::Timeout(config.connect_timeout)),
        };
        debug!(peer = %addr, "connected");

        Ok(Self {
            state: Mutex::new(SessionState {
                stream: Some(stream),
                session_handle: 0,
            }),
            config,
        })
    }

    /// The current session handle; zero when unregistered.
    pub async fn session_handle(&self) -> u32 {
        self.state.lock().await.session_handle
    }

    /// True once Register Session has completed and the session has not
    /// been unregistered or lost.
    pub async fn is_registered(&self) -> bool {
        self.session_handle().await != 0
    }

    /// Registers the session with the controller.
    ///
    /// Sends protocol version 1 and adopts the handle the controller
    /// assigns. Calling this while already registered is a no-op success.
    pub async fn register_session(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.session_handle != 0 {
            return Ok(());
        }

        let mut payload = [0u8; 4];
        payload[0..2].copy_from_slice(&PROTOCOL_VERSION.to_le_bytes());
        // Bytes 2..4 are the option flags, zero.

        let (header, _body) =
            request_reply(&mut state, &self.config, COMMAND_REGISTER_SESSION, &payload).await?;

        if header.length != 4 {
            return Err(EipError::parse(format!(
                "register session reply carried {} payload bytes, want 4",
                header.length
            )));
        }
        if header.session_handle == 0 {
            return Err(EipError::parse("register session returned a zero handle"));
        }

        state.session_handle = header.session_handle;
        debug!(handle = header.session_handle, "session registered");
        Ok(())
    }

    /// Unregisters the session and closes the connection.
    ///
    /// The unregister frame is fire-and-forget: no reply is expected, and
    /// the handle is zeroed and the socket closed even when the write
    /// fails. Calling this while unregistered is a no-op success; a fresh
    /// session needs a new connect.
    pub async fn unregister_session(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.session_handle == 0 {
            return Ok(());
        }
        let result = teardown(&mut state, self.config.io_timeout).await;
        if let Err(e) = &result {
            warn!(error = %e, "unregister write failed");
        }
        result
    }

    /// Sends List Identity and returns the identity payload verbatim.
    ///
    /// Works on an unregistered session.
    pub async fn list_identity(&self) -> Result<Vec<u8>> {
        let mut state = self.state.lock().await;
        let (_, body) = request_reply(&mut state, &self.config, COMMAND_LIST_IDENTITY, &[]).await?;
        Ok(body)
    }

    /// Sends an embedded CIP request via Send RR Data and returns the
    /// embedded CIP reply.
    ///
    /// The 6-byte interface-handle/timeout prefix is added on the way out
    /// and stripped on the way back; callers deal in CIP bytes only. Fails
    /// with [`EipError::Precondition`] when the session is not registered.
    pub async fn send_rr_data(&self, cip_request: &[u8]) -> Result<Vec<u8>> {
        let mut state = self.state.lock().await;
        if state.session_handle == 0 {
            return Err(EipError::precondition("session not registered"));
        }

        let payload = wrap_interface_prefix(self.config.rr_timeout_hint, cip_request);
        let (_, body) =
            request_reply(&mut state, &self.config, COMMAND_SEND_RR_DATA, &payload).await?;

        if body.len() < 6 {
            return Err(EipError::parse(format!(
                "Send RR Data reply shorter than its 6-byte prefix ({} bytes)",
                body.len()
            )));
        }
        Ok(body[6..].to_vec())
    }

    /// Sends one-way data via Send Unit Data. No reply is read.
    pub async fn send_unit_data(&self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.session_handle == 0 {
            return Err(EipError::precondition("session not registered"));
        }

        let payload = wrap_interface_prefix(self.config.rr_timeout_hint, data);
        let frame = encode_frame(COMMAND_SEND_UNIT_DATA, state.session_handle, &payload);

        let stream = state
            .stream
            .as_mut()
            .ok_or_else(|| EipError::precondition("session is closed; reconnect required"))?;
        let result = write_all_deadline(stream, &frame, self.config.io_timeout).await;
        if let Err(e) = &result {
            if e.is_transport() {
                state.stream = None;
                state.session_handle = 0;
            }
        }
        result
    }

    /// Tears the session down: best-effort unregister when registered, then
    /// closes the socket. Safe to call in any state, any number of times.
    pub async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        teardown(&mut state, self.config.io_timeout).await
    }
}

/// Shared teardown behind [`EipClient::unregister_session`],
/// [`EipClient::close`], and the destructor: write the unregister frame
/// while a handle is live, zero the handle, drop the stream.
async fn teardown(state: &mut SessionState, deadline: Duration) -> Result<()> {
    let mut result = Ok(());
    if state.session_handle != 0 {
        let frame = EipHeader::new(COMMAND_UNREGISTER_SESSION, state.session_handle, 0).encode();
        if let Some(stream) = state.stream.as_mut() {
            result = write_all_deadline(stream, &frame, deadline).await;
        }
        state.session_handle = 0;
    }
    if state.stream.take().is_some() {
        debug!("session closed");
    }
    result
}

impl Drop for EipClient {
    /// Non-blocking variant of [`close`](Self::close): a best-effort
    /// unregister write, then the socket drops with the state.
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_lock() {
            if state.session_handle != 0 {
                if let Some(stream) = &state.stream {
                    let frame =
                        EipHeader::new(COMMAND_UNREGISTER_SESSION, state.session_handle, 0)
                            .encode();
                    let _ = stream.try_write(&frame);
                }
                state.session_handle = 0;
            }
            state.stream = None;
        }
    }
}

/// Appends the default port when `addr` carries none.
fn ensure_port(addr: &str, default_port: u16) -> String {
    if addr.contains(':') {
        addr.to_string()
    } else {
        format!("{}:{}", addr, default_port)
    }
}

/// Interface handle (always 0, meaning CIP) plus the timeout hint.
fn wrap_interface_prefix(timeout_hint: u16, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(6 + data.len());
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.extend_from_slice(&timeout_hint.to_le_bytes());
    payload.extend_from_slice(data);
    payload
}

fn encode_frame(command: u16, session_handle: u32, payload: &[u8]) -> Vec<u8> {
    let header = EipHeader::new(command, session_handle, payload.len() as u16);
    let mut frame = Vec::with_capacity(EipHeader::LEN + payload.len());
    frame.extend_from_slice(&header.encode());
    frame.extend_from_slice(payload);
    frame
}

/// Writes a frame and reads the matching reply, validating the echo.
///
/// On a transport failure the session state drops to closed; the caller
/// sees the error either way.
async fn request_reply(
    state: &mut SessionState,
    config: &ClientConfig,
    command: u16,
    payload: &[u8],
) -> Result<(EipHeader, Vec<u8>)> {
    let handle = state.session_handle;
    let stream = state
        .stream
        .as_mut()
        .ok_or_else(|| EipError::precondition("session is closed; reconnect required"))?;

    let frame = encode_frame(command, handle, payload);
    trace!(command, len = frame.len(), "sending frame");

    match exchange(stream, &frame, config.io_timeout).await {
        Ok((header, body)) => {
            trace!(
                command = header.command,
                status = header.status,
                len = body.len(),
                "received frame"
            );
            if header.command != command {
                return Err(EipError::CommandMismatch {
                    expected: command,
                    actual: header.command,
                });
            }
            if header.status != 0 {
                return Err(EipError::EncapStatus {
                    code: header.status,
                });
            }
            Ok((header, body))
        }
        Err(e) => {
            if e.is_transport() {
                state.stream = None;
                state.session_handle = 0;
            }
            Err(e)
        }
    }
}

async fn exchange(
    stream: &mut TcpStream,
    frame: &[u8],
    deadline: Duration,
) -> Result<(EipHeader, Vec<u8>)> {
    write_all_deadline(stream, frame, deadline).await?;

    let mut header_buf = [0u8; EipHeader::LEN];
    read_exact_deadline(stream, &mut header_buf, deadline).await?;
    let header = EipHeader::decode(&header_buf)?;

    let mut body = vec![0u8; header.length as usize];
    if !body.is_empty() {
        read_exact_deadline(stream, &mut body, deadline).await?;
    }
    Ok((header, body))
}

async fn write_all_deadline(stream: &mut TcpStream, data: &[u8], deadline: Duration) -> Result<()> {
    match timeout(deadline, stream.write_all(data)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(EipError::Io(e)),
        Err(_) => Err(EipError::Timeout(deadline)),
    }
}

/// Fills `buf` completely, re-arming the deadline before each read. A
/// zero-byte read means the peer closed mid-frame.
async fn read_exact_deadline(
    stream: &mut TcpStream,
    buf: &mut [u8],
    deadline: Duration,
) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = match timeout(deadline, stream.read(&mut buf[filled..])).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(EipError::Io(e)),
            Err(_) => return Err(EipError::Timeout(deadline)),
        };
        if n == 0 {
            return Err(EipError::Truncated {
                expected: buf.len(),
                received: filled,
            });
        }
        filled += n;
    }
    Ok(())
}
