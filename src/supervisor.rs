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

//! Ctrl+C handling for the lifetime of the process.

use std::sync::Arc;

use log::LevelFilter;

use crate::context::RunContext;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No interrupt seen yet.
    Armed,
    /// At least one interrupt arrived; the abort flag is set for good.
    Tripped,
}

pub struct InterruptSupervisor;

impl InterruptSupervisor {
    /// Installs the process-wide Ctrl+C handler. `ctrlc` runs it on its own
    /// thread, once per signal, until the process exits.
    pub fn install(ctx: Arc<RunContext>) -> Result<()> {
        ctrlc::set_handler(move || Self::trip(&ctx))?;
        Ok(())
    }

    /// Reaction to one interrupt: abort the run, make logging visible and
    /// kill whatever is running. Repeating it is harmless.
    pub fn trip(ctx: &RunContext) {
        let first = Self::state(ctx) == SupervisorState::Armed;
        ctx.request_abort();
        log::set_max_level(LevelFilter::Trace);
        if first {
            log::warn!("interrupt received, aborting");
        }
        ctx.kill_if_any();
    }

    pub fn state(ctx: &RunContext) -> SupervisorState {
        if ctx.is_aborted() {
            SupervisorState::Tripped
        } else {
            SupervisorState::Armed
        }
    }
}
