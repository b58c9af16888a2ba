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

//! # gitbenchcmp
//!
//! Benchmarks a list of git revisions one after another and compares each
//! result with the next.
//!
//! For every revision the working tree is checked out, the benchmark command
//! runs with its standard output captured into a result file, and after the
//! last revision the branch that was checked out before the run is restored.
//! Consecutive result files are then handed to a comparison tool.
//!
//! Guarantees:
//! - nothing is checked out unless the tree was clean at the start
//! - the original branch is restored exactly once, on success, failure or Ctrl+C
//! - at most one child process is alive at any time, and Ctrl+C kills it
//!
//! ```no_run
//! use std::sync::Arc;
//! use gitbenchcmp::{Config, RunContext, process::CommandLine};
//!
//! let config = Config {
//!     revisions: vec!["main".into(), "feature".into()],
//!     outdir: None,
//!     verbose: false,
//!     bench: CommandLine::new("go", ["test", "-run=NONE", "-bench=."]),
//!     compare: CommandLine::new("benchcmp", Vec::<String>::new()),
//! };
//! gitbenchcmp::session::run(&config, Arc::new(RunContext::new()))?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod artifact;
pub mod compare;
pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod process;
pub mod revision;
pub mod session;
pub mod supervisor;

pub use config::{Cli, Config};
pub use context::RunContext;
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, RevisionResult};
pub use supervisor::InterruptSupervisor;
