//! Message codecs.
//!
//! The transport hands the server raw frames; a `Codec` turns them into
//! `ClientMessage`s and `ServerMessage`s back into frames. JSON is the
//! browser-facing format, bincode the compact one for native clients.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::ProtocolError;

/// Frame encoding.
pub trait Codec: Send + Sync {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, ProtocolError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        bincode::serialize(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, ProtocolError> {
        bincode::deserialize(bytes).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use crate::protocol::{ClientMessage, IndexedOption, ServerMessage};
    use crate::selection::SelectionOption;

    #[test]
    fn test_json_rejects_garbage() {
        let err = JsonCodec.decode::<ClientMessage>(b"{\"fly\":{}}").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_bincode_carries_selection_requests() {
        let msg = ServerMessage::RequestSelection {
            request_id: 12,
            prompt: "Choose a minion".into(),
            options: vec![
                IndexedOption {
                    id: 0,
                    option: SelectionOption::Card { card: EntityId(3) },
                },
                IndexedOption {
                    id: 1,
                    option: SelectionOption::Text { text: "none".into() },
                },
            ],
        };
        let bytes = BincodeCodec.encode(&msg).unwrap();
        assert_eq!(BincodeCodec.decode::<ServerMessage>(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_bincode_rejects_truncated_frame() {
        let bytes = BincodeCodec
            .encode(&ClientMessage::Authenticate { name: "ann".into() })
            .unwrap();
        assert!(BincodeCodec.decode::<ClientMessage>(&bytes[..bytes.len() - 1]).is_err());
    }
}
