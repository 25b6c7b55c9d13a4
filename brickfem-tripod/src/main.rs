use brickfem_tripod::{run, Error, TripodConfig};
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::{info, Level};

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "brickfem-tripod",
    about = "Solves the tripod elasticity demo and exports the results to VTK"
)]
struct Options {
    /// GiD mesh of the tripod
    #[structopt(long, parse(from_os_str))]
    mesh: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Output directory
    #[structopt(long, parse(from_os_str))]
    out_dir: Option<PathBuf>,

    /// Degree of the displacement fem
    #[structopt(long)]
    degree: Option<usize>,

    /// Large deformation model
    #[structopt(long)]
    nonlinear: bool,

    /// Add an incompressibility term (needs degree 2)
    #[structopt(long)]
    incompressible: bool,

    /// Only report warnings and errors
    #[structopt(long, conflicts_with = "verbose")]
    quiet: bool,

    /// Debug output
    #[structopt(long)]
    verbose: bool,
}

fn main() -> Result<(), Error> {
    // parse options
    let options = Options::from_args();

    let level = if options.quiet {
        Level::WARN
    } else if options.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    // configuration file, then flags
    let mut config = match &options.config {
        Some(path) => TripodConfig::from_json_file(path)?,
        None => TripodConfig::default(),
    };
    if let Some(mesh) = options.mesh {
        config.mesh = mesh;
    }
    if let Some(out_dir) = options.out_dir {
        config.out_dir = out_dir;
    }
    if let Some(degree) = options.degree {
        config.degree = degree;
    }
    if options.nonlinear {
        config.linear = false;
    }
    if options.incompressible {
        config.incompressible = true;
    }

    let report = run(&config)?;
    info!(
        files = report.files.len(),
        seconds = report.solve.time_seconds,
        "tripod done"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
