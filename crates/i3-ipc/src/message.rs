//! Frame codec for the i3 IPC wire format
//!
//! # Wire Format
//!
//! ```text
//! "i3-ipc" | length: u32 | type: u32 | payload: length bytes of UTF-8 JSON
//! ```
//!
//! Both integers use the host byte order, which is what i3 itself writes.
//! The codec knows nothing about what a payload means; see `parser` for that.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::error::I3Error;
use crate::events::EventCategory;

/// Magic string that starts every i3 IPC message
pub const MAGIC: &[u8; 6] = b"i3-ipc";

/// Size of the fixed header: magic, payload length and message type
pub const HEADER_LEN: usize = MAGIC.len() + 8;

/// High bit set on every event message type
const EVENT_MASK: u32 = 1 << 31;

/// Every message type understood by i3
///
/// Replies reuse the type code of the request they answer. Event codes have
/// the high bit set, so the two ranges never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    RunCommand,
    GetWorkspaces,
    Subscribe,
    GetOutputs,
    GetTree,
    GetMarks,
    /// Shared by "list bar ids" (empty payload) and "get bar config" (bar id)
    GetBarConfig,
    GetVersion,
    GetBindingModes,
    GetConfig,
    SendTick,
    Sync,
    Event(EventCategory),
}

impl MessageType {
    /// Numeric type code as written on the wire
    pub fn code(self) -> u32 {
        match self {
            MessageType::RunCommand => 0,
            MessageType::GetWorkspaces => 1,
            MessageType::Subscribe => 2,
            MessageType::GetOutputs => 3,
            MessageType::GetTree => 4,
            MessageType::GetMarks => 5,
            MessageType::GetBarConfig => 6,
            MessageType::GetVersion => 7,
            MessageType::GetBindingModes => 8,
            MessageType::GetConfig => 9,
            MessageType::SendTick => 10,
            MessageType::Sync => 11,
            MessageType::Event(category) => EVENT_MASK | category.index() as u32,
        }
    }

    /// Look up a wire type code, `None` if i3 sent something unknown
    pub fn from_code(code: u32) -> Option<Self> {
        if code & EVENT_MASK != 0 {
            let index = (code & !EVENT_MASK) as usize;
            return EventCategory::ALL
                .get(index)
                .copied()
                .map(MessageType::Event);
        }

        let message_type = match code {
            0 => MessageType::RunCommand,
            1 => MessageType::GetWorkspaces,
            2 => MessageType::Subscribe,
            3 => MessageType::GetOutputs,
            4 => MessageType::GetTree,
            5 => MessageType::GetMarks,
            6 => MessageType::GetBarConfig,
            7 => MessageType::GetVersion,
            8 => MessageType::GetBindingModes,
            9 => MessageType::GetConfig,
            10 => MessageType::SendTick,
            11 => MessageType::Sync,
            _ => return None,
        };
        Some(message_type)
    }

    /// The event category for event types, `None` for request/reply types
    pub fn event_category(self) -> Option<EventCategory> {
        match self {
            MessageType::Event(category) => Some(category),
            _ => None,
        }
    }
}

/// One message as transferred over the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub message_type: MessageType,
    pub payload: Vec<u8>,
}

/// Encode a message into one contiguous buffer
///
/// # Errors
///
/// Returns `I3Error::InvalidArgument` if the payload does not fit the 32-bit
/// length field.
pub fn encode(message_type: MessageType, payload: &[u8]) -> Result<Vec<u8>, I3Error> {
    let length = u32::try_from(payload.len()).map_err(|_| {
        I3Error::invalid_argument(format!(
            "Message payload of {} bytes exceeds the protocol limit",
            payload.len()
        ))
    })?;

    let mut buffer = Vec::with_capacity(HEADER_LEN + payload.len());
    buffer.extend_from_slice(MAGIC);
    buffer.extend_from_slice(&length.to_ne_bytes());
    buffer.extend_from_slice(&message_type.code().to_ne_bytes());
    buffer.extend_from_slice(payload);
    Ok(buffer)
}

/// Encode and write a message, flushing the writer afterwards
pub async fn write_frame<W>(
    writer: &mut W,
    message_type: MessageType,
    payload: &[u8],
) -> Result<(), I3Error>
where
    W: AsyncWrite + Unpin,
{
    let buffer = encode(message_type, payload)?;

    debug!(
        code = message_type.code(),
        length = payload.len(),
        "Sending i3 message"
    );

    writer
        .write_all(&buffer)
        .await
        .map_err(I3Error::SendFailed)?;
    writer.flush().await.map_err(I3Error::SendFailed)?;
    Ok(())
}

/// Read and validate a message header
///
/// Returns the payload length and the message type. Short reads are retried
/// until the whole header has arrived; EOF before that is a transport error.
///
/// # Errors
///
/// Returns `I3Error::ReceiveFailed` if the socket fails or closes.
/// Returns `I3Error::BadMessage` if the magic string or type code is wrong.
pub async fn read_header<R>(reader: &mut R) -> Result<(u32, MessageType), I3Error>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader
        .read_exact(&mut header)
        .await
        .map_err(I3Error::ReceiveFailed)?;

    let (magic, rest) = header.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(I3Error::bad_message(format!(
            "Bad magic string! Expected: {:?}, received: {:?}",
            String::from_utf8_lossy(MAGIC),
            String::from_utf8_lossy(magic)
        )));
    }

    let length = u32::from_ne_bytes([rest[0], rest[1], rest[2], rest[3]]);
    let code = u32::from_ne_bytes([rest[4], rest[5], rest[6], rest[7]]);

    let message_type = MessageType::from_code(code).ok_or_else(|| {
        I3Error::bad_message(format!("Received unexpected message of type: {}", code))
    })?;

    trace!(code, length, "Read i3 message header");

    Ok((length, message_type))
}

/// Read exactly `length` payload bytes
///
/// The buffer grows with the bytes actually received, not with the length
/// the header claims.
pub async fn read_payload<R>(reader: &mut R, length: u32) -> Result<Vec<u8>, I3Error>
where
    R: AsyncRead + Unpin,
{
    let mut payload = Vec::new();
    (&mut *reader)
        .take(u64::from(length))
        .read_to_end(&mut payload)
        .await
        .map_err(I3Error::ReceiveFailed)?;

    if payload.len() != length as usize {
        return Err(I3Error::ReceiveFailed(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "connection closed after {} of {} payload bytes",
                payload.len(),
                length
            ),
        )));
    }

    Ok(payload)
}

/// Read one complete message
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame, I3Error>
where
    R: AsyncRead + Unpin,
{
    let (length, message_type) = read_header(reader).await?;
    let payload = read_payload(reader, length).await?;

    debug!(code = message_type.code(), length, "Received i3 message");

    Ok(Frame {
        message_type,
        payload,
    })
}
