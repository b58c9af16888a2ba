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

//! Command-line surface and the commands built from it.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::{Error, Result};
use crate::process::CommandLine;

#[derive(Parser, Debug)]
#[command(name = "gitbenchcmp")]
#[command(about = "Benchmark git revisions and compare consecutive results", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Revisions to benchmark, in order
    #[arg(value_name = "COMMIT-ISH", num_args = 2.., required = true)]
    pub revisions: Vec<String>,

    /// Directory to store benchmark results. If blank, uses a temporary directory that is removed afterwards
    #[arg(long, value_name = "DIR")]
    pub outdir: Option<String>,

    /// Chatty logging
    #[arg(long)]
    pub verbose: bool,

    /// Run only the tests and examples matching the regular expression
    #[arg(long = "test.run", value_name = "REGEXP", default_value = "NONE")]
    pub test_run: String,

    /// Run benchmarks matching the regular expression
    #[arg(long = "test.bench", value_name = "REGEXP", default_value = ".")]
    pub test_bench: String,

    /// Tell long running tests to shorten their run time
    #[arg(long = "test.short")]
    pub test_short: bool,

    /// Include memory allocation statistics for comparison
    #[arg(long = "test.benchmem")]
    pub test_benchmem: bool,

    /// Compare best times
    #[arg(long)]
    pub best: bool,

    /// Show only benchmarks that have changed
    #[arg(long)]
    pub changed: bool,

    /// Sort benchmarks by magnitude of change
    #[arg(long)]
    pub mag: bool,

    /// Benchmark command, run in the current directory for every revision
    #[arg(long, value_name = "CMD", default_value = "go test")]
    pub bench_cmd: String,

    /// Comparison command, given two result files
    #[arg(long, value_name = "CMD", default_value = "benchcmp")]
    pub compare_cmd: String,
}

/// Long flags that may also be spelled with a single dash.
const LONG_FLAGS: &[&str] = &[
    "outdir",
    "verbose",
    "test.run",
    "test.bench",
    "test.short",
    "test.benchmem",
    "best",
    "changed",
    "mag",
    "bench-cmd",
    "compare-cmd",
    "help",
    "version",
];

/// Rewrites `-outdir` style flags to `--outdir` so both spellings parse.
/// Arguments after `--` are left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut past_separator = false;
    args.into_iter()
        .map(|arg| {
            if past_separator {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                past_separator = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split('=').next().unwrap_or(rest);
                    if LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{}", text))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub revisions: Vec<String>,
    /// `None` means a temporary directory.
    pub outdir: Option<PathBuf>,
    pub verbose: bool,
    pub bench: CommandLine,
    pub compare: CommandLine,
}

/// One flag forwarded to an external tool.
struct Passthrough<'a> {
    name: &'a str,
    value: String,
    default: &'a str,
}

impl<'a> Passthrough<'a> {
    fn new(name: &'a str, value: impl ToString, default: &'a str) -> Self {
        Self {
            name,
            value: value.to_string(),
            default,
        }
    }
}

/// Appends `-name=value` for every flag that is not left at a zero default.
fn forward_flags(command: &mut CommandLine, flags: &[Passthrough<'_>]) {
    for flag in flags {
        if flag.value == flag.default && is_zero_value(&flag.value) {
            continue;
        }
        command.push_arg(format!("-{}={}", flag.name, flag.value));
    }
}

/// Guesses whether a flag value is its type's zero value.
fn is_zero_value(value: &str) -> bool {
    matches!(value, "" | "false" | "0")
}

impl Cli {
    pub fn into_config(self) -> Result<Config> {
        if self.revisions.len() < 2 {
            return Err(Error::Usage("not enough commits to compare".to_string()));
        }

        let mut bench = CommandLine::parse(&self.bench_cmd)
            .ok_or_else(|| Error::Usage("benchmark command is empty".to_string()))?;
        forward_flags(
            &mut bench,
            &[
                Passthrough::new("run", &self.test_run, "NONE"),
                Passthrough::new("bench", &self.test_bench, "."),
                Passthrough::new("short", self.test_short, "false"),
                Passthrough::new("benchmem", self.test_benchmem, "false"),
            ],
        );

        let mut compare = CommandLine::parse(&self.compare_cmd)
            .ok_or_else(|| Error::Usage("comparison command is empty".to_string()))?;
        forward_flags(
            &mut compare,
            &[
                Passthrough::new("best", self.best, "false"),
                Passthrough::new("changed", self.changed, "false"),
                Passthrough::new("mag", self.mag, "false"),
            ],
        );

        log::debug!("benchmark command: {}", bench);
        log::debug!("comparison command: {} file1 file2", compare);

        Ok(Config {
            revisions: self.revisions,
            outdir: self
                .outdir
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            verbose: self.verbose,
            bench,
            compare,
        })
    }
}

/// Checks that the benchmark and comparison programs can be found.
pub fn lookup_tools(config: &Config) -> Result<()> {
    for program in [&config.bench.program, &config.compare.program] {
        log::debug!("checking for presence of {}", program);
        match find_program(program) {
            Some(path) => log::debug!("found {} at {}", program, path.display()),
            None => return Err(Error::ToolNotFound(program.clone())),
        }
    }
    Ok(())
}

/// Resolves `program` the way a shell would: paths are checked directly,
/// bare names are searched in `PATH`.
pub fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .flat_map(|dir| {
            let plain = dir.join(program);
            let suffixed = dir.join(format!("{}{}", program, env::consts::EXE_SUFFIX));
            [plain, suffixed]
        })
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
