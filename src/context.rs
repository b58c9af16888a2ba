// gitbenchcmp - Benchmark comparison across git revisions
// Copyright (c) 2025 Oliver Seifert
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! State shared between the run and the interrupt handler.
//!
//! Only two cells cross that boundary: the abort flag and the slot holding
//! the child process that is currently running, if any.

use std::io;
use std::process::{Child, ExitStatus};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};

/// Handle to a registered child, used to collect or release it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    generation: u64,
}

struct LiveProcess {
    generation: u64,
    program: String,
    child: Child,
}

#[derive(Default)]
pub struct RunContext {
    aborted: AtomicBool,
    next_generation: AtomicU64,
    live: Mutex<Option<LiveProcess>>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the abort flag. It is never cleared.
    pub fn request_abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Turns `result` into `Error::Interrupted` once an abort was requested,
    /// so a failure caused by the kill never hides the interruption itself.
    pub fn checkpoint<T>(&self, result: Result<T>) -> Result<T> {
        if self.is_aborted() {
            return Err(Error::Interrupted);
        }
        result
    }

    /// Makes `child` the current process. Kills it right away if an abort
    /// arrived before registration could make it visible.
    pub(crate) fn register(&self, program: &str, child: Child) -> Registration {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let mut slot = self.slot();
        if let Some(previous) = slot.as_ref() {
            log::warn!(
                "replacing live process {} that was never collected",
                previous.program
            );
        }
        *slot = Some(LiveProcess {
            generation,
            program: program.to_string(),
            child,
        });
        drop(slot);

        if self.is_aborted() {
            self.kill_if_any();
        }
        Registration { generation }
    }

    /// Checks whether the registered child has exited. On exit the slot is
    /// cleared and the status returned.
    pub(crate) fn try_collect(&self, registration: Registration) -> io::Result<Option<ExitStatus>> {
        let mut slot = self.slot();
        let live = match slot.as_mut() {
            Some(live) if live.generation == registration.generation => live,
            _ => {
                return Err(io::Error::other(
                    "registered process is no longer tracked",
                ));
            }
        };
        match live.child.try_wait()? {
            Some(status) => {
                *slot = None;
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }

    /// Kills and reaps the registered child if it is still in the slot.
    /// A newer registration is left alone.
    pub(crate) fn release(&self, registration: Registration) {
        let mut slot = self.slot();
        if slot
            .as_ref()
            .is_some_and(|live| live.generation == registration.generation)
        {
            if let Some(mut live) = slot.take() {
                let _ = live.child.kill();
                let _ = live.child.wait();
            }
        }
    }

    /// Sends a kill to the current child. Returns whether a signal was sent.
    ///
    /// No-op when nothing is registered or the child already exited; the
    /// child stays in the slot so its runner still collects the status.
    pub fn kill_if_any(&self) -> bool {
        let mut slot = self.slot();
        let Some(live) = slot.as_mut() else {
            return false;
        };
        match live.child.try_wait() {
            Ok(Some(_)) => false,
            Ok(None) => {
                log::info!("killing the currently running process: {}", live.program);
                match live.child.kill() {
                    Ok(()) => true,
                    // Raced with a natural exit.
                    Err(e) if e.kind() == io::ErrorKind::InvalidInput => false,
                    Err(e) => {
                        log::warn!("cannot kill {}: {}", live.program, e);
                        false
                    }
                }
            }
            Err(e) => {
                log::warn!("cannot query {}: {}", live.program, e);
                false
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Option<LiveProcess>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
