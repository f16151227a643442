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

//! Reserved message kind ids.
//!
//! Kind ids below [`APPLICATION`] belong to the runtime. Ids in `0..512`
//! take the per-actor handler cache fast path; assign small ids to hot
//! message kinds.

/// Self-scheduling continuation used by cooperative pollers.
pub const CONTINUE: u32 = 1;

/// Graceful shutdown request; the sole cancellation mechanism.
pub const SHUTDOWN: u32 = 5;

/// Delivered once to every managed actor before its worker starts.
pub const START: u32 = 6;

/// Timer expiry notification.
pub const TIMEOUT: u32 = 8;

/// Remote delivery failure notification.
pub const REJECT: u32 = 9;

/// Internal record queued on the remote sender; never serialized.
pub const REMOTE_DISPATCH: u32 = 10;

/// First id available to application messages.
pub const APPLICATION: u32 = 100;
