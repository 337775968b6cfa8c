//! Define filter subcommand
use super::read_dump;
use crate::config::Config;
use crate::filter::should_keep_as_trace;
use std::path::PathBuf;
use structopt::StructOpt;

/// Show which fixes pass the trace filter
#[derive(Debug, StructOpt)]
pub struct FilterOpts {
    /// JSON dump of fixes
    #[structopt(name = "DUMP", parse(from_os_str))]
    dump: PathBuf,
}

pub fn filter_command(config: Config, opts: FilterOpts) -> Result<(), Box<dyn std::error::Error>> {
    let samples = read_dump(&opts.dump)?;
    let mut kept = 0;
    println!(
        "{:>15}  {:>10}  {:>10}  {:>8}  location",
        "timestamp", "accuracy", "speed", "trace"
    );
    for sample in &samples {
        let keep = should_keep_as_trace(sample, config.filter());
        if keep {
            kept += 1;
        }
        let speed = sample
            .speed()
            .map_or_else(|| "-".to_string(), |s| format!("{:.2}", s));
        println!(
            "{:>15}  {:>10.1}  {:>10}  {:>8}  {:.6}, {:.6}",
            sample.timestamp(),
            sample.accuracy(),
            speed,
            if keep { "keep" } else { "drop" },
            sample.latitude(),
            sample.longitude()
        );
    }
    println!("{} of {} fixes kept", kept, samples.len());
    Ok(())
}
