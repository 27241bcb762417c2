use std::io::Result;

use env_logger::Builder;
use log::{debug, info, LevelFilter};
use structopt::StructOpt;

use bgplite::{serve, NeighborConfig, RouterConfig};

#[derive(StructOpt, Debug)]
#[structopt(name = "bgplite", rename_all = "kebab-case")]
/// Simplified BGP route processor
struct Args {
    /// Autonomous system number of this router
    asn: u32,
    /// Neighbor descriptors of the form port-address-relation
    /// (E.g. 7777-192.168.0.2-cust)
    #[structopt(required = true)]
    neighbors: Vec<NeighborConfig>,
    #[structopt(short, parse(from_occurrences))]
    /// Sets the level of logging verbosity
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::from_args();

    let (bgplite_level, other_level) = match args.verbose {
        0 => (LevelFilter::Info, LevelFilter::Warn),
        1 => (LevelFilter::Debug, LevelFilter::Warn),
        2 => (LevelFilter::Trace, LevelFilter::Warn),
        _ => (LevelFilter::Trace, LevelFilter::Trace),
    };
    Builder::new()
        .filter(Some("bgplite"), bgplite_level)
        .filter(None, other_level)
        .init();
    info!("Logging at levels {}/{}", bgplite_level, other_level);

    let config = RouterConfig::new(args.asn, args.neighbors);
    debug!(
        "Starting AS {} with {} configured neighbors",
        config.asn,
        config.neighbors.len()
    );

    serve(config).await?;

    Ok(())
}
