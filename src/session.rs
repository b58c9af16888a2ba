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

//! One complete invocation: benchmark every revision, compare, clean up.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::compare::Comparator;
use crate::config::{self, Config};
use crate::context::RunContext;
use crate::orchestrator::Orchestrator;
use crate::process::{ProcessRunner, Sink};
use crate::revision::Workspace;

/// Where result files live for the duration of the run.
enum OutputDir {
    /// Emptied only once `close` or `Drop` takes it.
    Temporary(Option<TempDir>),
    Given(PathBuf),
}

impl OutputDir {
    fn prepare(requested: Option<&Path>) -> Result<Self> {
        match requested {
            None => {
                let dir = tempfile::Builder::new()
                    .prefix("gitbenchcmp")
                    .tempdir()
                    .context("cannot create temp dir to store benchmarks")?;
                log::debug!("storing results in {}", dir.path().display());
                Ok(OutputDir::Temporary(Some(dir)))
            }
            Some(dir) => {
                fs::create_dir_all(dir).with_context(|| {
                    format!("cannot create output directory {}", dir.display())
                })?;
                let dir = std::path::absolute(dir)
                    .with_context(|| format!("cannot resolve {}", dir.display()))?;
                Ok(OutputDir::Given(dir))
            }
        }
    }

    fn path(&self) -> &Path {
        match self {
            OutputDir::Temporary(Some(dir)) => dir.path(),
            OutputDir::Temporary(None) => Path::new(""),
            OutputDir::Given(dir) => dir,
        }
    }

    /// Removes a temporary directory, reporting any failure.
    fn close(&mut self) -> Result<()> {
        let OutputDir::Temporary(slot) = self else {
            return Ok(());
        };
        let Some(dir) = slot.take() else {
            return Ok(());
        };
        log::debug!("removing temp dir {}", dir.path().display());
        let path = dir.path().to_path_buf();
        dir.close()
            .with_context(|| format!("cannot remove temp dir {}", path.display()))
    }
}

impl Drop for OutputDir {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("{:#}", e);
            eprintln!("gitbenchcmp: {:#}", e);
        }
    }
}

/// Runs everything from the process's current directory, printing
/// comparisons to stdout.
pub fn run(config: &Config, ctx: Arc<RunContext>) -> Result<()> {
    run_in(config, ctx, Path::new("."), Sink::Inherit).map(|_| ())
}

/// Runs with `dir` as the place the repository is found and commands run.
/// Returns the number of comparisons made.
///
/// Teardown on every exit path, in order: the original branch is restored
/// (inside the orchestrator), then a temporary output directory is removed.
/// Failing to remove it fails the run; on paths that already failed the
/// removal error is logged and printed instead.
pub fn run_in(config: &Config, ctx: Arc<RunContext>, dir: &Path, output: Sink) -> Result<usize> {
    config::lookup_tools(config)?;
    let workspace = Workspace::discover(dir)?;
    let mut outdir = OutputDir::prepare(config.outdir.as_deref())?;
    let runner = ProcessRunner::new(Arc::clone(&ctx)).in_dir(dir);

    let results = Orchestrator::new(&workspace, &runner, &config.bench, outdir.path())
        .run(&config.revisions)?;
    let compared = Comparator::new(&runner, &config.compare).compare_all(&results, &output)?;

    outdir.close()?;
    ctx.checkpoint(Ok(compared)).map_err(Into::into)
}
