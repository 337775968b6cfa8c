//! Define the developer command line interface
use crate::config::Config;
use crate::history::parse_dump;
use crate::{Error, LocationSample};
use simplelog::LevelFilter;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

mod filter;
use filter::{filter_command, FilterOpts};
mod replay;
use replay::{replay_command, ReplayOpts};

/// Replay recorded location dumps through the self location engine
#[derive(Debug, StructOpt)]
#[structopt(name = "self-location")]
pub struct Cli {
    /// Set logging level to debug, use a second time (e.g. -vv) to set logging to trace
    #[structopt(short, long, parse(from_occurrences))]
    verbose: i32,
    /// Suppress info logging messages use a second time (e.g. -qq) to hide warnings
    #[structopt(short, long, parse(from_occurrences))]
    quiet: i32,
    /// YAML configuration file, defaults are used when not given
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    cmd: Command,
}

impl Cli {
    /// Return the verbose flag counts as a log level filter
    pub fn verbosity(&self, default: LevelFilter) -> LevelFilter {
        if self.quiet == 1 {
            LevelFilter::Warn
        } else if self.quiet > 1 {
            LevelFilter::Error
        } else if self.verbose == 1 {
            LevelFilter::Debug
        } else if self.verbose > 1 {
            LevelFilter::Trace
        } else {
            default
        }
    }

    /// Load the configuration file if one was given
    pub fn load_config(&self) -> Result<Config, Error> {
        match &self.config {
            Some(path) => {
                let mut fp = File::open(path)?;
                Config::load(&mut fp)
            }
            None => Ok(Config::default()),
        }
    }

    /// Consume options struct and return the result of subcommand execution
    pub fn execute_subcommand(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        self.cmd.execute(config)
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Feed a dump through a session with a simulated map and report what happened
    #[structopt(name = "replay")]
    Replay(ReplayOpts),
    /// Show which fixes of a dump are kept as trace points
    #[structopt(name = "filter")]
    Filter(FilterOpts),
}

impl Command {
    /// Consume enum variant and return the result of the command's execution
    fn execute(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Command::Replay(opts) => replay_command(config, opts),
            Command::Filter(opts) => filter_command(config, opts),
        }
    }
}

/// Read fixes from a file written with `dump()`
fn read_dump(path: &Path) -> Result<Vec<LocationSample>, Error> {
    let mut buf = String::new();
    File::open(path)?.read_to_string(&mut buf)?;
    parse_dump(&buf)
}
