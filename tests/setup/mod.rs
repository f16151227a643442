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

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub use messages::*;

mod messages;

// Ensures tracing initialization happens only once across all tests.
static INIT: Once = Once::new();

/// Installs the global tracing subscriber for tests.
///
/// Noise from the runtime internals is filtered down to warnings unless a
/// test area is under investigation; bump individual directives while
/// debugging.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::new("")
            .add_directive("axon::actor=warn".parse().unwrap())
            .add_directive("axon::common=warn".parse().unwrap())
            .add_directive("axon::remote=warn".parse().unwrap())
            .add_directive("messaging_tests=info".parse().unwrap())
            .add_directive("call_tests=info".parse().unwrap())
            .add_directive("lifecycle_tests=info".parse().unwrap())
            .add_directive("remote_tests=info".parse().unwrap())
            .add_directive(tracing_subscriber::filter::LevelFilter::ERROR.into());

        let subscriber = FmtSubscriber::builder()
            .with_span_events(FmtSpan::NONE)
            .with_max_level(Level::TRACE)
            .compact()
            .with_line_number(true)
            .without_time()
            .with_target(true)
            .with_env_filter(filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    });
}
