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

//! Feeds consecutive result files to the comparison tool.

use crate::error::{Error, Result};
use crate::orchestrator::RevisionResult;
use crate::process::{CommandLine, ProcessRunner, Sink};

pub struct Comparator<'a> {
    runner: &'a ProcessRunner,
    command: &'a CommandLine,
}

impl<'a> Comparator<'a> {
    pub fn new(runner: &'a ProcessRunner, command: &'a CommandLine) -> Self {
        Self { runner, command }
    }

    /// Compares each result with the next one, in order, writing the tool's
    /// output to `output`. Returns the number of comparisons run. The first
    /// failing comparison ends the run.
    pub fn compare_all(&self, results: &[RevisionResult], output: &Sink) -> Result<usize> {
        let ctx = self.runner.context();
        let mut compared = 0;
        for pair in results.windows(2) {
            let (old, new) = (&pair[0], &pair[1]);
            ctx.checkpoint(Ok(()))?;

            let mut sink = output
                .try_clone()
                .map_err(|e| Error::io("cannot write comparison output", e))?;
            sink.write_blank_line()
                .map_err(|e| Error::io("cannot write comparison output", e))?;

            log::info!(
                "comparing benchmark files: {} {}",
                old.path.display(),
                new.path.display()
            );
            ctx.checkpoint(self.runner.run(
                self.command,
                &[old.path.as_path(), new.path.as_path()],
                sink,
            ))?;
            compared += 1;
        }
        Ok(compared)
    }
}
