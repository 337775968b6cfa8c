use log::debug;
use self_location::cli::Cli;
use simplelog::{Config, TermLogger, TerminalMode};
use structopt::StructOpt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Cli::from_args();
    let config = opt.load_config()?;
    let level_filter = opt.verbosity(config.log_level());
    TermLogger::init(level_filter, Config::default(), TerminalMode::Mixed)?;
    debug!("using configuration: {:?}", config);

    // execute any subcommands
    opt.execute_subcommand(config)
}
