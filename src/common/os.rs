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

//! Thin shims over the OS thread APIs: CPU affinity, real-time
//! scheduling, and thread ids. All unsafe in the crate lives here.
//!
//! Failures are surfaced as `io::Error` so the runtime can log and
//! continue; refused affinity or priority is never fatal.

use std::collections::BTreeSet;
use std::io;
use std::thread;

use crate::actor::SchedulingClass;

/// Number of cores visible to this process, used to validate affinity
/// sets at registration time.
pub(crate) fn available_cores() -> usize {
    thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

#[cfg(target_os = "linux")]
pub(crate) fn current_thread_id() -> Option<i32> {
    Some(unsafe { libc::gettid() })
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn current_thread_id() -> Option<i32> {
    None
}

/// Pins `worker` to the given cores.
#[cfg(target_os = "linux")]
pub(crate) fn set_thread_affinity(
    worker: &thread::JoinHandle<()>,
    cores: &BTreeSet<usize>,
) -> io::Result<()> {
    use std::os::unix::thread::JoinHandleExt;

    let mut cpu_set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    unsafe {
        libc::CPU_ZERO(&mut cpu_set);
        for &core in cores {
            libc::CPU_SET(core, &mut cpu_set);
        }
    }
    let rc = unsafe {
        libc::pthread_setaffinity_np(
            worker.as_pthread_t(),
            std::mem::size_of::<libc::cpu_set_t>(),
            &cpu_set,
        )
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(rc))
    }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn set_thread_affinity(
    _worker: &thread::JoinHandle<()>,
    _cores: &BTreeSet<usize>,
) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "thread affinity is only supported on linux",
    ))
}

/// Applies a real-time scheduling policy and priority to `worker`.
///
/// `SchedulingClass::Default` maps to `SCHED_FIFO` here because this shim
/// is only invoked for priorities above zero.
#[cfg(target_os = "linux")]
pub(crate) fn set_thread_scheduling(
    worker: &thread::JoinHandle<()>,
    class: SchedulingClass,
    priority: i32,
) -> io::Result<()> {
    use std::os::unix::thread::JoinHandleExt;

    let policy = match class {
        SchedulingClass::RoundRobin => libc::SCHED_RR,
        SchedulingClass::Default | SchedulingClass::Fifo => libc::SCHED_FIFO,
    };
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let rc = unsafe { libc::pthread_setschedparam(worker.as_pthread_t(), policy, &param) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(rc))
    }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn set_thread_scheduling(
    _worker: &thread::JoinHandle<()>,
    _class: SchedulingClass,
    _priority: i32,
) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "real-time scheduling is only supported on linux",
    ))
}
