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
use std::any::Any;
use std::fmt::Debug;

/// A trait for types that can be delivered to actors in the Axon runtime.
///
/// This trait combines the standard library traits needed for cross-thread
/// delivery (`Any`, `Send`, `Debug`) with a numeric *kind id* used for
/// dispatch. Each message type declares a single kind id; ids in the
/// `0..512` range hit the per-actor handler cache, so after one map lookup
/// per (actor, kind) every subsequent dispatch is an array read. Ids at or
/// above 512 are legal but take the map path on every delivery.
///
/// Messages are exclusively owned: a posted message belongs to the
/// receiving actor, which destroys it once its handler returns. There is
/// no `Clone` requirement anywhere in the delivery path.
///
/// The `as_any`/`as_any_mut`/`into_any` methods support the runtime's
/// type-based dispatch and the downcasting helpers below. Implement the
/// trait with the [`actor_message!`](crate::actor_message) macro rather
/// than by hand:
///
/// ```rust,ignore
/// #[derive(Debug)]
/// struct PriceUpdate { symbol: String, price: f64 }
///
/// actor_message!(PriceUpdate, 100);
/// ```
pub trait ActorMessage: Any + Send + Debug {
    /// Returns the numeric kind of this message.
    ///
    /// Reserved ids live in [`kinds`](crate::message::kinds); application
    /// messages should start at [`kinds::APPLICATION`](crate::message::kinds::APPLICATION).
    fn kind_id(&self) -> u32;

    /// Returns a reference to the message as a dynamic [`Any`] trait object.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to the message as a dynamic [`Any`] trait object.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Converts the boxed message into a boxed [`Any`], enabling owned downcasts.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Implements [`ActorMessage`] for a concrete type with the given kind id.
///
/// ```rust,ignore
/// #[derive(Debug, Default)]
/// struct Ping { count: i64 }
///
/// actor_message!(Ping, 100);
/// ```
#[macro_export]
macro_rules! actor_message {
    ($message:ty, $kind:expr) => {
        impl $crate::ActorMessage for $message {
            fn kind_id(&self) -> u32 {
                $kind
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }
    };
}

/// Downcasts a message reference to its concrete type.
pub fn downcast_message<M: 'static>(message: &dyn ActorMessage) -> Option<&M> {
    message.as_any().downcast_ref::<M>()
}

/// Consumes a boxed message, returning the concrete value when the type matches.
///
/// Useful for unpacking the reply returned by a synchronous
/// [`call`](crate::common::ActorHandle::call).
pub fn into_message<M: 'static>(message: Box<dyn ActorMessage>) -> Option<M> {
    message.into_any().downcast::<M>().ok().map(|boxed| *boxed)
}
