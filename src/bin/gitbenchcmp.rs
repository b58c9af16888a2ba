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
//! Benchmarks each given revision and compares consecutive results.
//!
//! Usage:
//!   gitbenchcmp [flags] <commit-ish> <commit-ish>...

use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use log::LevelFilter;

use gitbenchcmp::config::normalize_args;
use gitbenchcmp::{Cli, InterruptSupervisor, RunContext, session};

fn init_logging(verbose: bool) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .format_timestamp(None)
        .format_target(false)
        .init();
    if !verbose {
        log::set_max_level(LevelFilter::Off);
    }
}

fn main() {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                e.exit();
            }
            let _ = e.print();
            process::exit(1);
        }
    };
    init_logging(cli.verbose);

    let ctx = Arc::new(RunContext::new());
    if let Err(e) = run(cli, Arc::clone(&ctx)) {
        if ctx.is_aborted() {
            log::warn!("run aborted by interrupt");
        }
        eprintln!("gitbenchcmp: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli, ctx: Arc<RunContext>) -> Result<()> {
    let config = cli.into_config()?;
    InterruptSupervisor::install(Arc::clone(&ctx))?;
    session::run(&config, ctx)
}
