//! Wire format of client messages.
//!
//! Every message is UTF-8 text made of newline-separated `Key:value` lines.
//! The value is everything after the first colon, trimmed. Recognized keys are
//! `LogId`, `BoxId`, `ItemType`, `UserId` and `ImageData` (a base64 image);
//! anything else is ignored.
//!
//! The first message of a connection is the handshake and must carry all of
//! them. Later messages are processing triggers and may carry `ImageData` to
//! replace the session's current frame.

use crate::error_handling::types::HandshakeError;
use crate::session_management::SessionIdentity;

/// Fields found in one message; nothing is validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMessage {
    pub identity: SessionIdentity,
    pub image_data: Option<String>,
}

impl ClientMessage {
    pub fn parse(bytes: &[u8]) -> Result<Self, HandshakeError> {
        let text = std::str::from_utf8(bytes).map_err(|_| HandshakeError::NotUtf8)?;
        let mut message = ClientMessage::default();

        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "LogId" => message.identity.log_id = Some(value),
                "BoxId" => message.identity.box_id = Some(value),
                "ItemType" => message.identity.item_type = Some(value),
                "UserId" => message.identity.user_id = Some(value),
                "ImageData" => message.image_data = Some(value),
                _ => {}
            }
        }

        Ok(message)
    }

    /// Validates this message as a handshake.
    pub fn into_handshake(self) -> Result<Handshake, HandshakeError> {
        let id = &self.identity;
        let missing = [
            ("LogId", id.log_id.is_none()),
            ("BoxId", id.box_id.is_none()),
            ("ItemType", id.item_type.is_none()),
            ("UserId", id.user_id.is_none()),
        ];
        if let Some((name, _)) = missing.iter().find(|(_, absent)| *absent) {
            return Err(HandshakeError::MissingField(*name));
        }

        match self.image_data {
            Some(image_data) if !image_data.is_empty() => Ok(Handshake {
                identity: self.identity,
                image_data,
            }),
            _ => Err(HandshakeError::MissingImage),
        }
    }
}

/// A complete handshake: identity plus the encoded first frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub identity: SessionIdentity,
    pub image_data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "LogId:L1\nBoxId:B7\nItemType:bottle\nUserId:U3\nImageData:aGVsbG8=\n";

    #[test]
    fn parses_all_known_fields() {
        let handshake = ClientMessage::parse(FULL.as_bytes())
            .unwrap()
            .into_handshake()
            .unwrap();

        assert_eq!(handshake.identity.log_id.as_deref(), Some("L1"));
        assert_eq!(handshake.identity.box_id.as_deref(), Some("B7"));
        assert_eq!(handshake.identity.item_type.as_deref(), Some("bottle"));
        assert_eq!(handshake.identity.user_id.as_deref(), Some("U3"));
        assert_eq!(handshake.image_data, "aGVsbG8=");
    }

    #[test]
    fn value_is_everything_after_first_colon() {
        let msg = ClientMessage::parse(b"LogId: 2024-01-01T10:00 \r\nImageData:data:image/png;base64,AAA").unwrap();
        assert_eq!(msg.identity.log_id.as_deref(), Some("2024-01-01T10:00"));
        assert_eq!(msg.image_data.as_deref(), Some("data:image/png;base64,AAA"));
    }

    #[test]
    fn unknown_lines_are_ignored() {
        let text = format!("Hello there\nColor:blue\n{}", FULL);
        assert!(ClientMessage::parse(text.as_bytes())
            .unwrap()
            .into_handshake()
            .is_ok());
    }

    #[test]
    fn missing_identity_field_is_rejected() {
        let msg = ClientMessage::parse(b"LogId:L1\nItemType:x\nUserId:u\nImageData:abc").unwrap();
        assert!(matches!(
            msg.clone().into_handshake(),
            Err(HandshakeError::MissingField("BoxId"))
        ));
        assert_eq!(msg.identity.log_id.as_deref(), Some("L1"));
    }

    #[test]
    fn missing_image_is_rejected() {
        let msg = ClientMessage::parse(b"LogId:L1\nBoxId:B\nItemType:x\nUserId:u").unwrap();
        assert!(matches!(msg.into_handshake(), Err(HandshakeError::MissingImage)));

        let empty = ClientMessage::parse(b"LogId:L1\nBoxId:B\nItemType:x\nUserId:u\nImageData:").unwrap();
        assert!(matches!(empty.into_handshake(), Err(HandshakeError::MissingImage)));
    }

    #[test]
    fn trigger_without_fields_parses_empty() {
        let msg = ClientMessage::parse(b"next").unwrap();
        assert_eq!(msg, ClientMessage::default());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(matches!(
            ClientMessage::parse(&[0xff, 0xfe]),
            Err(HandshakeError::NotUtf8)
        ));
    }
}
