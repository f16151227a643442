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

//! Error types for the remote bridge.

use std::fmt;

/// Errors produced while sending, receiving, or translating remote
/// messages.
#[derive(Debug, Clone)]
pub enum RemoteError {
    /// The message kind has no entry in the wire type registry. Raised
    /// locally by `send_to`; the message is destroyed and no envelope is
    /// emitted.
    UnregisteredKind(u32),

    /// The envelope's `message_type` has no registered deserializer.
    UnknownMessageType(String),

    /// The envelope's `receiver` is not registered with the receiving
    /// bridge.
    ActorNotFound(String),

    /// Serialization or deserialization failure; carries the underlying
    /// error message.
    SerializationError(String),

    /// The peer closed the connection mid-frame.
    ConnectionClosed,

    /// Malformed frame or endpoint.
    ProtocolError(String),

    /// Socket or I/O failure.
    IoError(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnregisteredKind(kind) => write!(f, "Message kind not registered: {kind}"),
            Self::UnknownMessageType(t) => write!(f, "Unknown message type: {t}"),
            Self::ActorNotFound(name) => write!(f, "Actor '{name}' not found"),
            Self::SerializationError(e) => write!(f, "Serialization error: {e}"),
            Self::ConnectionClosed => write!(f, "Connection closed"),
            Self::ProtocolError(e) => write!(f, "Protocol error: {e}"),
            Self::IoError(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
