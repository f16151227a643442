/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Wire protocol: the JSON envelope, frame codec, and endpoint rules.
//!
//! # Wire Format
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ Frame Length (4 bytes, big-endian u32)                        │
//! ├───────────────────────────────────────────────────────────────┤
//! │ JSON Envelope (remaining bytes, UTF-8 encoded)                │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The envelope is a strict JSON object with five mandatory keys;
//! `sender_actor` and `sender_endpoint` are `null` when the message has
//! no reply path. Receivers ignore unknown keys.
//!
//! ```json
//! {
//!   "sender_actor": "ping",
//!   "sender_endpoint": "tcp://localhost:5002",
//!   "receiver": "pong",
//!   "message_type": "Ping",
//!   "message": { "count": 1 }
//! }
//! ```

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::types::RemoteError;

/// Frame header size: the 4-byte payload length.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Maximum frame size (16 MiB hard limit).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// The JSON record used for inter-process transport.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WireEnvelope {
    /// Name of the sending actor, or `null` when there is no reply path.
    pub sender_actor: Option<String>,
    /// Inbound endpoint of the sending process, or `null`.
    pub sender_endpoint: Option<String>,
    /// Name of the target actor in the receiving process.
    pub receiver: String,
    /// Registered wire type name, used to look up the deserializer.
    pub message_type: String,
    /// The serialized message body.
    pub message: serde_json::Value,
}

/// Writes one length-prefixed frame.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), RemoteError> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(RemoteError::ProtocolError(format!(
            "frame size {} exceeds maximum {MAX_FRAME_SIZE}",
            payload.len()
        )));
    }
    let length = payload.len() as u32;
    writer.write_all(&length.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Reads one complete frame, blocking until it arrives.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, RemoteError> {
    let mut header = [0u8; FRAME_HEADER_SIZE];
    reader.read_exact(&mut header).map_err(eof_as_closed)?;
    let length = u32::from_be_bytes(header) as usize;
    if length > MAX_FRAME_SIZE {
        return Err(RemoteError::ProtocolError(format!(
            "frame size {length} exceeds maximum {MAX_FRAME_SIZE}"
        )));
    }
    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).map_err(eof_as_closed)?;
    Ok(payload)
}

fn eof_as_closed(error: std::io::Error) -> RemoteError {
    if error.kind() == std::io::ErrorKind::UnexpectedEof {
        RemoteError::ConnectionClosed
    } else {
        RemoteError::IoError(error.to_string())
    }
}

/// Extracts one complete frame from an accumulation buffer, if present.
///
/// Used by the nonblocking receiver, which appends whatever bytes the
/// socket had available and extracts frames as they complete.
pub(crate) fn take_frame(buffer: &mut Vec<u8>) -> Result<Option<Vec<u8>>, RemoteError> {
    if buffer.len() < FRAME_HEADER_SIZE {
        return Ok(None);
    }
    let length = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    if length > MAX_FRAME_SIZE {
        return Err(RemoteError::ProtocolError(format!(
            "frame size {length} exceeds maximum {MAX_FRAME_SIZE}"
        )));
    }
    if buffer.len() < FRAME_HEADER_SIZE + length {
        return Ok(None);
    }
    let payload = buffer[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + length].to_vec();
    buffer.drain(..FRAME_HEADER_SIZE + length);
    Ok(Some(payload))
}

/// Rewrites an endpoint for an outbound connection: a leading `*:` or
/// `0.0.0.0:` bind address becomes `localhost:`.
pub fn connect_addr(endpoint: &str) -> String {
    let address = strip_scheme(endpoint);
    if let Some(rest) = address.strip_prefix("*:") {
        format!("localhost:{rest}")
    } else if let Some(rest) = address.strip_prefix("0.0.0.0:") {
        format!("localhost:{rest}")
    } else {
        address.to_string()
    }
}

/// Rewrites an endpoint for binding: a leading `*:` becomes `0.0.0.0:`.
pub fn bind_addr(endpoint: &str) -> String {
    let address = strip_scheme(endpoint);
    if let Some(rest) = address.strip_prefix("*:") {
        format!("0.0.0.0:{rest}")
    } else {
        address.to_string()
    }
}

fn strip_scheme(endpoint: &str) -> &str {
    endpoint.strip_prefix("tcp://").unwrap_or(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_write_read_frame() {
        let mut buffer = Vec::new();
        let payload = b"test payload";

        write_frame(&mut buffer, payload).unwrap();

        let mut reader = Cursor::new(buffer);
        let read_payload = read_frame(&mut reader).unwrap();
        assert_eq!(read_payload, payload);
    }

    #[test]
    fn test_read_frame_on_closed_stream() {
        let mut reader = Cursor::new(Vec::<u8>::new());
        let result = read_frame(&mut reader);
        assert!(matches!(result, Err(RemoteError::ConnectionClosed)));
    }

    #[test]
    fn test_frame_size_limit() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(MAX_FRAME_SIZE as u32 + 1).to_be_bytes());
        let mut reader = Cursor::new(buffer);
        let result = read_frame(&mut reader);
        assert!(matches!(result, Err(RemoteError::ProtocolError(_))));
    }

    #[test]
    fn test_take_frame_handles_partial_input() {
        let mut full = Vec::new();
        write_frame(&mut full, b"hello").unwrap();
        write_frame(&mut full, b"world").unwrap();

        let mut buffer = Vec::new();
        // Feed the bytes one at a time; frames appear exactly when complete.
        let mut frames = Vec::new();
        for byte in full {
            buffer.push(byte);
            if let Some(frame) = take_frame(&mut buffer).unwrap() {
                frames.push(frame);
            }
        }
        assert_eq!(frames, vec![b"hello".to_vec(), b"world".to_vec()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_envelope_round_trip() {
        let envelope = WireEnvelope {
            sender_actor: Some("ping".to_string()),
            sender_endpoint: Some("tcp://localhost:5002".to_string()),
            receiver: "pong".to_string(),
            message_type: "Ping".to_string(),
            message: serde_json::json!({ "count": 1 }),
        };

        let text = serde_json::to_string(&envelope).unwrap();
        let parsed: WireEnvelope = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed.sender_actor.as_deref(), Some("ping"));
        assert_eq!(parsed.sender_endpoint.as_deref(), Some("tcp://localhost:5002"));
        assert_eq!(parsed.receiver, "pong");
        assert_eq!(parsed.message_type, "Ping");
        assert_eq!(parsed.message["count"], 1);
    }

    #[test]
    fn test_envelope_emits_null_sender_keys() {
        let envelope = WireEnvelope {
            sender_actor: None,
            sender_endpoint: None,
            receiver: "pong".to_string(),
            message_type: "Ping".to_string(),
            message: serde_json::json!({}),
        };

        // All five keys are mandatory on the wire; absent senders are null.
        let value = serde_json::to_value(&envelope).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 5);
        assert!(object["sender_actor"].is_null());
        assert!(object["sender_endpoint"].is_null());
    }

    #[test]
    fn test_envelope_ignores_unknown_keys() {
        let text = r#"{
            "sender_actor": null,
            "sender_endpoint": null,
            "receiver": "pong",
            "message_type": "Ping",
            "message": { "count": 3 },
            "extra": "ignored"
        }"#;
        let parsed: WireEnvelope = serde_json::from_str(text).unwrap();
        assert_eq!(parsed.receiver, "pong");
        assert_eq!(parsed.message["count"], 3);
    }

    #[test]
    fn test_connect_addr_rewriting() {
        assert_eq!(connect_addr("tcp://*:5001"), "localhost:5001");
        assert_eq!(connect_addr("tcp://0.0.0.0:5001"), "localhost:5001");
        assert_eq!(connect_addr("tcp://localhost:5001"), "localhost:5001");
        assert_eq!(connect_addr("tcp://192.168.1.7:5001"), "192.168.1.7:5001");
    }

    #[test]
    fn test_bind_addr_rewriting() {
        assert_eq!(bind_addr("tcp://*:5001"), "0.0.0.0:5001");
        assert_eq!(bind_addr("tcp://0.0.0.0:5001"), "0.0.0.0:5001");
        assert_eq!(bind_addr("tcp://127.0.0.1:5001"), "127.0.0.1:5001");
    }
}
