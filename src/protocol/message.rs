//! Relayed chat messages

use bytes::{BufMut, Bytes, BytesMut};

use crate::registry::ConnectionId;

use super::constants::{SENDER_PREFIX, SENDER_SEPARATOR, SENTINEL};

/// A line of text paired with the id of the connection that sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Sender connection id
    pub sender: ConnectionId,
    /// Message text, without line terminator
    pub text: String,
}

impl ChatMessage {
    /// Create a new message
    pub fn new(sender: ConnectionId, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }

    /// Whether the text is the disconnect sentinel
    pub fn is_sentinel(&self) -> bool {
        self.text == SENTINEL
    }

    /// Encode as a relayed wire line: `Client <id>: <text>\n`
    ///
    /// The result is shared by reference count across all recipients.
    pub fn encode(&self) -> Bytes {
        let id = self.sender.to_string();
        let mut buf = BytesMut::with_capacity(
            SENDER_PREFIX.len() + id.len() + SENDER_SEPARATOR.len() + self.text.len() + 1,
        );
        buf.put_slice(SENDER_PREFIX.as_bytes());
        buf.put_slice(id.as_bytes());
        buf.put_slice(SENDER_SEPARATOR.as_bytes());
        buf.put_slice(self.text.as_bytes());
        buf.put_u8(b'\n');
        buf.freeze()
    }
}

/// Decode a relayed line (without terminator) back into a message
///
/// Returns `None` if the line does not carry a `Client <id>: ` prefix.
pub fn parse_broadcast_line(line: &str) -> Option<ChatMessage> {
    let rest = line.strip_prefix(SENDER_PREFIX)?;
    let (id, text) = rest.split_once(SENDER_SEPARATOR)?;
    let sender = id.parse::<ConnectionId>().ok()?;
    Some(ChatMessage::new(sender, text))
}
