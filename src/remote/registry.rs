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

//! Wire type registry for remote message serialization.
//!
//! Maps `(kind_id, wire type name)` to serialize/deserialize functions.
//! Message kinds must be registered before any remote send; registration
//! normally happens during process startup, next to message definitions.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::RemoteError;
use crate::traits::ActorMessage;

/// Serializes a trait-object message into a JSON body.
type WireSerializerFn =
    Arc<dyn Fn(&dyn ActorMessage) -> Result<serde_json::Value, String> + Send + Sync>;

/// Builds a new message from a JSON body.
type WireDeserializerFn =
    Arc<dyn Fn(&serde_json::Value) -> Result<Box<dyn ActorMessage>, String> + Send + Sync>;

struct KindEntry {
    type_name: String,
    serialize: WireSerializerFn,
}

/// Registry mapping message kinds to wire names and codec functions.
///
/// Safe to access concurrently; registration and lookups may interleave.
/// Registering the same kind or name twice overwrites the previous entry,
/// so duplicate registration is harmless.
///
/// Most code uses the process-wide instance via [`wire_registry`] and
/// [`register_wire_message`]; the struct itself is constructible for
/// tests.
#[derive(Default)]
pub struct WireTypeRegistry {
    by_kind: DashMap<u32, KindEntry>,
    by_name: DashMap<String, WireDeserializerFn>,
}

impl WireTypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a message type under a wire name.
    ///
    /// The kind id is taken from `M::default()`, so the type's
    /// [`kind_id`](ActorMessage::kind_id) and its registration can never
    /// disagree. Stable semantic names (`"Ping"`) are recommended over
    /// Rust type paths.
    pub fn register<M>(&self, type_name: &str)
    where
        M: ActorMessage + Serialize + DeserializeOwned + Default,
    {
        let kind = M::default().kind_id();

        let serialize: WireSerializerFn = Arc::new(|message: &dyn ActorMessage| {
            let concrete = message
                .as_any()
                .downcast_ref::<M>()
                .ok_or_else(|| "type mismatch during serialization".to_string())?;
            serde_json::to_value(concrete).map_err(|e| e.to_string())
        });
        let deserialize: WireDeserializerFn = Arc::new(|body: &serde_json::Value| {
            let message: M = serde_json::from_value(body.clone()).map_err(|e| e.to_string())?;
            Ok(Box::new(message) as Box<dyn ActorMessage>)
        });

        self.by_kind.insert(
            kind,
            KindEntry {
                type_name: type_name.to_string(),
                serialize,
            },
        );
        self.by_name.insert(type_name.to_string(), deserialize);
    }

    /// The wire name registered for a kind id, if any.
    pub fn type_name(&self, kind: u32) -> Option<String> {
        self.by_kind.get(&kind).map(|entry| entry.type_name.clone())
    }

    /// Serializes a message, returning its wire name and JSON body.
    ///
    /// # Errors
    ///
    /// * [`RemoteError::UnregisteredKind`] when the message's kind has no entry.
    /// * [`RemoteError::SerializationError`] when serialization fails.
    pub fn serialize(
        &self,
        message: &dyn ActorMessage,
    ) -> Result<(String, serde_json::Value), RemoteError> {
        let kind = message.kind_id();
        let entry = self
            .by_kind
            .get(&kind)
            .ok_or(RemoteError::UnregisteredKind(kind))?;
        let body = (entry.serialize)(message).map_err(RemoteError::SerializationError)?;
        Ok((entry.type_name.clone(), body))
    }

    /// Builds a message from a wire name and JSON body.
    ///
    /// # Errors
    ///
    /// * [`RemoteError::UnknownMessageType`] when the name has no entry.
    /// * [`RemoteError::SerializationError`] when the body does not fit the type.
    pub fn deserialize(
        &self,
        type_name: &str,
        body: &serde_json::Value,
    ) -> Result<Box<dyn ActorMessage>, RemoteError> {
        let deserializer = self
            .by_name
            .get(type_name)
            .ok_or_else(|| RemoteError::UnknownMessageType(type_name.to_string()))?;
        deserializer(body).map_err(RemoteError::SerializationError)
    }

    /// `true` when the wire name has a registered deserializer.
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.by_name.contains_key(type_name)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

impl std::fmt::Debug for WireTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireTypeRegistry")
            .field("registered_kinds", &self.by_kind.len())
            .finish()
    }
}

static REGISTRY: Lazy<WireTypeRegistry> = Lazy::new(WireTypeRegistry::new);

/// The process-wide wire type registry used by the remote bridge.
pub fn wire_registry() -> &'static WireTypeRegistry {
    &REGISTRY
}

/// Registers a message type with the process-wide registry.
///
/// ```rust,ignore
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Ping { count: i64 }
/// actor_message!(Ping, 100);
///
/// register_wire_message::<Ping>("Ping");
/// ```
pub fn register_wire_message<M>(type_name: &str)
where
    M: ActorMessage + Serialize + DeserializeOwned + Default,
{
    wire_registry().register::<M>(type_name);
}
