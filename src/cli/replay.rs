//! Define replay subcommand
use super::read_dump;
use crate::config::Config;
use crate::gps::LatLng;
use crate::services::simulated::{
    simulated_services, RecordingInterface, SimulatedMap, SimulatedSource,
};
use crate::services::Team;
use crate::session::LocationSession;
use log::{info, warn};
use std::path::PathBuf;
use structopt::StructOpt;

/// Replay a dump of fixes through a session drawing onto a simulated map
#[derive(Debug, StructOpt)]
pub struct ReplayOpts {
    /// JSON dump of fixes
    #[structopt(name = "DUMP", parse(from_os_str))]
    dump: PathBuf,
    /// Turn on follow mode before the first fix
    #[structopt(short, long)]
    follow: bool,
    /// Zoom level of the simulated map
    #[structopt(short, long, default_value = "16")]
    zoom: u32,
    /// Print the session's dump after the replay
    #[structopt(long)]
    print_dump: bool,
}

pub fn replay_command(config: Config, opts: ReplayOpts) -> Result<(), Box<dyn std::error::Error>> {
    let samples = read_dump(&opts.dump)?;
    let start = samples
        .first()
        .map_or_else(LatLng::default, |s| s.position());

    let map = SimulatedMap::new(start, opts.zoom, (1280, 800));
    let source = SimulatedSource::new();
    let ui = RecordingInterface::new(false);
    let mut session = LocationSession::new(
        &config,
        simulated_services(&map, &source, &ui, Team::Resistance),
    );
    session.init();
    if opts.follow {
        session.follow_start();
    }

    let mut delivered = 0;
    for sample in samples.iter() {
        let handle = match session.watch_handle() {
            Some(handle) => handle,
            None => {
                warn!("location watch stopped after {} fix(es)", delivered);
                break;
            }
        };
        session.handle_event(handle, Ok(*sample));
        delivered += 1;
    }
    info!("replayed {} of {} fixes", delivered, samples.len());

    println!("fixes delivered:  {}", delivered);
    println!("trace points:     {}", session.trace().len());
    println!("map recenters:    {}", map.set_view_calls().len());
    println!("watch active:     {}", session.is_watching());
    for alert in ui.alerts() {
        println!("alert: {}", alert);
    }
    if opts.print_dump {
        println!("{}", session.dump());
    }
    Ok(())
}
