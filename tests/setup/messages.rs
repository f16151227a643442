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
#![allow(unused)]

use axon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Ping {
    pub count: i64,
}

actor_message!(Ping, 100);

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Pong {
    pub count: i64,
}

actor_message!(Pong, 101);

#[derive(Debug, Default, Clone)]
pub struct GetPosition {
    pub symbol: String,
}

actor_message!(GetPosition, 102);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PositionInfo {
    pub symbol: String,
    pub quantity: i64,
    pub avg_price: f64,
}

actor_message!(PositionInfo, 103);

/// Sequence-numbered payload for ordering tests.
#[derive(Debug, Default, Clone)]
pub struct Tag {
    pub value: usize,
}

actor_message!(Tag, 104);

/// A message with no registered handler anywhere.
#[derive(Debug, Default, Clone)]
pub struct Stray;

actor_message!(Stray, 105);

/// A kind outside the handler cache range; dispatch must still work.
#[derive(Debug, Default, Clone)]
pub struct SlowPath;

actor_message!(SlowPath, 512);
