//! Shared WheelStream bridge protocol helpers.
//!
//! The bridge sends a fixed-size header followed by a JSON payload. Payloads
//! cross into an embedded web surface, so JSON is the codec on both sides.
//! This crate keeps the framing and payload shapes in one place so the menu
//! controller and the host stay interoperable.

use std::convert::TryFrom;

use bytes::Buf;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

/// Bytes that prefix every WheelStream message ("WHEL").
pub const HEADER_MAGIC: [u8; 4] = *b"WHEL";

/// Protocol revision understood by this crate.
pub const PROTOCOL_VERSION: u16 = 0x0001;

/// Length of the binary header in bytes.
pub const HEADER_LEN: usize = 4 + 2 + 2 + 4;

/// Message kinds understood by WheelStream v1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, Hash)]
#[repr(u16)]
pub enum MessageKind {
    Hello = 0x0001,
    /// Host -> menu: open a payload, or force-close on a falsy body.
    Open = 0x0002,
    /// Host -> menu: replace the current item list in place.
    Refresh = 0x0003,
    /// Menu -> host: request permission for a page transition.
    Transition = 0x0004,
    /// Host -> menu: boolean answer to a pending transition request.
    TransitionAck = 0x0005,
    /// Menu -> host: a real sector was clicked (absolute index).
    ItemClicked = 0x0006,
    /// Menu -> host: restore the parent menu.
    Back = 0x0007,
    /// Menu -> host: tear down the menu session.
    Close = 0x0008,
}

impl TryFrom<u16> for MessageKind {
    type Error = ();

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Self::Hello),
            0x0002 => Ok(Self::Open),
            0x0003 => Ok(Self::Refresh),
            0x0004 => Ok(Self::Transition),
            0x0005 => Ok(Self::TransitionAck),
            0x0006 => Ok(Self::ItemClicked),
            0x0007 => Ok(Self::Back),
            0x0008 => Ok(Self::Close),
            _ => Err(()),
        }
    }
}

/// Envelope describing the upcoming payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: u16,
    pub kind: MessageKind,
    pub length: u32,
}

impl MessageHeader {
    /// Encode the header as big-endian bytes.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&HEADER_MAGIC);
        out[4..6].copy_from_slice(&self.version.to_be_bytes());
        out[6..8].copy_from_slice(&(self.kind as u16).to_be_bytes());
        out[8..12].copy_from_slice(&self.length.to_be_bytes());
        out
    }

    /// Decode a header from raw bytes.
    pub fn decode(input: &[u8]) -> Result<Self, ProtocolError> {
        if input.len() < HEADER_LEN {
            return Err(ProtocolError::TruncatedHeader);
        }
        if &input[..4] != HEADER_MAGIC {
            return Err(ProtocolError::BadMagic);
        }
        let mut version_bytes = &input[4..6];
        let version = version_bytes.get_u16();
        let mut kind_bytes = &input[6..8];
        let kind_raw = kind_bytes.get_u16();
        let kind = MessageKind::try_from(kind_raw)
            .map_err(|_| ProtocolError::UnknownMessageKind(kind_raw))?;
        let mut len_bytes = &input[8..12];
        let length = len_bytes.get_u32();
        Ok(Self {
            version,
            kind,
            length,
        })
    }
}

/// Minimal handshake message that opens a bridge session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hello {
    pub protocol: String,
    pub producer: String,
    pub build: Option<String>,
}

impl Hello {
    pub fn new(producer: impl Into<String>, build: Option<String>) -> Self {
        Self {
            protocol: "WheelStream".to_string(),
            producer: producer.into(),
            build,
        }
    }
}

/// One selectable entry of a menu payload. Identity is positional: an item
/// is addressed by its index within the list it arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub icon: String,
    pub label: String,
    /// Sub-menu identifier this item leads to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<String>,
}

/// Body of an [`MessageKind::Open`] message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenMenu {
    pub items: Vec<MenuItem>,
    /// True when this payload is a descendant of another menu.
    #[serde(default)]
    pub sub: bool,
    /// Deep link: open onto the page holding the item whose `menu` field
    /// matches this identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
}

/// Body of a [`MessageKind::Refresh`] message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshItems {
    pub items: Vec<MenuItem>,
}

/// Body of a [`MessageKind::Transition`] request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub seq: u64,
}

/// Body of a [`MessageKind::TransitionAck`] response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransitionAck {
    pub seq: u64,
    pub ready: bool,
}

/// Body of an [`MessageKind::ItemClicked`] message. The index is absolute
/// into the full unpaginated item list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ItemClicked {
    pub index: usize,
}

/// Error conditions returned by the protocol helpers.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("header smaller than {HEADER_LEN} bytes")]
    TruncatedHeader,
    #[error("header magic mismatch")]
    BadMagic,
    #[error("message kind {0:#06x} is unknown")]
    UnknownMessageKind(u16),
    #[error("payload length mismatch: header declared {expected} bytes but read {actual}")]
    LengthMismatch { expected: u32, actual: usize },
    #[error("payload codec error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Wraps a payload with framing suitable for the wire.
pub fn encode_message<T>(kind: MessageKind, payload: &T) -> Result<Vec<u8>, ProtocolError>
where
    T: Serialize,
{
    let payload_bytes = serde_json::to_vec(payload)?;
    let header = MessageHeader {
        version: PROTOCOL_VERSION,
        kind,
        length: u32::try_from(payload_bytes.len()).map_err(|_| ProtocolError::LengthMismatch {
            expected: u32::MAX,
            actual: payload_bytes.len(),
        })?,
    };
    let mut out = Vec::with_capacity(HEADER_LEN + payload_bytes.len());
    out.extend_from_slice(&header.encode());
    out.extend_from_slice(&payload_bytes);
    Ok(out)
}

/// Decodes a framed message returning both header and payload bytes.
pub fn decode_envelope(bytes: &[u8]) -> std::result::Result<(MessageHeader, &[u8]), ProtocolError> {
    if bytes.len() < HEADER_LEN {
        return Err(ProtocolError::TruncatedHeader);
    }
    let header = MessageHeader::decode(&bytes[..HEADER_LEN])?;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() != header.length as usize {
        return Err(ProtocolError::LengthMismatch {
            expected: header.length,
            actual: payload.len(),
        });
    }
    Ok((header, payload))
}

/// Decode a payload straight into the requested type.
pub fn decode_payload<T>(payload: &[u8]) -> std::result::Result<T, ProtocolError>
where
    T: for<'de> Deserialize<'de>,
{
    let value = serde_json::from_slice(payload)?;
    Ok(value)
}

/// Decode an `Open` body. The host sends `false` (or `null`) to force the
/// menu closed, so the body is an `Option` rather than a bare struct.
pub fn decode_open_payload(payload: &[u8]) -> Result<Option<OpenMenu>, ProtocolError> {
    let value: Value = serde_json::from_slice(payload)?;
    match value {
        Value::Bool(false) | Value::Null => Ok(None),
        other => {
            let body: OpenMenu = serde_json::from_value(other)?;
            Ok(Some(body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let header = MessageHeader {
            version: PROTOCOL_VERSION,
            kind: MessageKind::Open,
            length: 42,
        };
        let decoded = MessageHeader::decode(&header.encode()).expect("decode");
        assert_eq!(decoded, header);
    }

    #[test]
    fn header_rejects_bad_magic() {
        let mut bytes = MessageHeader {
            version: PROTOCOL_VERSION,
            kind: MessageKind::Close,
            length: 0,
        }
        .encode();
        bytes[0] = b'X';
        assert!(matches!(
            MessageHeader::decode(&bytes),
            Err(ProtocolError::BadMagic)
        ));
    }

    #[test]
    fn header_rejects_unknown_kind() {
        let mut bytes = MessageHeader {
            version: PROTOCOL_VERSION,
            kind: MessageKind::Hello,
            length: 0,
        }
        .encode();
        bytes[6] = 0xff;
        bytes[7] = 0xff;
        assert!(matches!(
            MessageHeader::decode(&bytes),
            Err(ProtocolError::UnknownMessageKind(0xffff))
        ));
    }

    #[test]
    fn envelope_checks_declared_length() {
        let frame = encode_message(MessageKind::ItemClicked, &ItemClicked { index: 3 })
            .expect("encode");
        let (header, payload) = decode_envelope(&frame).expect("envelope");
        assert_eq!(header.kind, MessageKind::ItemClicked);
        let body: ItemClicked = decode_payload(payload).expect("payload");
        assert_eq!(body.index, 3);

        let truncated = &frame[..frame.len() - 1];
        assert!(matches!(
            decode_envelope(truncated),
            Err(ProtocolError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn open_payload_false_means_close() {
        let closed = decode_open_payload(b"false").expect("decode");
        assert!(closed.is_none());

        let body = decode_open_payload(
            br#"{"items":[{"icon":"wrench","label":"Repair"}],"sub":true}"#,
        )
        .expect("decode");
        let menu = body.expect("payload");
        assert!(menu.sub);
        assert_eq!(menu.items.len(), 1);
        assert_eq!(menu.items[0].menu, None);
    }
}
