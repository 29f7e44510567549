use clap::{Parser, Subcommand};
use hmmdecode::cli::{self, WeightFiles};
use hmmdecode::error::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, about, version)]
struct Opts {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode the most probable state sequence of an observation file
    Decode {
        /// Initial state weights
        #[clap(short, long)]
        initial: PathBuf,
        /// Transition weights (`source target weight` or
        /// `source action target weight` lines)
        #[clap(short, long)]
        transitions: PathBuf,
        /// Emission weights
        #[clap(short, long)]
        emissions: PathBuf,
        /// Observations (and actions) to decode
        #[clap(short = 's', long)]
        observations: PathBuf,
        /// Output state file
        #[clap(short, long, default_value = "states.txt")]
        output: PathBuf,
        /// JSON of the action/observation enumerations
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Build the model and report zero-mass rows
    Build {
        #[clap(short, long)]
        initial: PathBuf,
        #[clap(short, long)]
        transitions: PathBuf,
        #[clap(short, long)]
        emissions: PathBuf,
        /// Dump the model as JSON (gzipped if `.gz`)
        #[clap(long)]
        json: Option<PathBuf>,
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

fn run(opts: &Opts) -> Result<()> {
    match &opts.command {
        Commands::Decode {
            initial,
            transitions,
            emissions,
            observations,
            output,
            config,
        } => {
            let config = cli::load_config(config.as_deref())?;
            let files = WeightFiles::new(initial.clone(), transitions.clone(), emissions.clone());
            let summary = cli::decode(&files, observations, output, &config)?;
            println!("{}", summary);
        }
        Commands::Build {
            initial,
            transitions,
            emissions,
            json,
            config,
        } => {
            let config = cli::load_config(config.as_deref())?;
            let files = WeightFiles::new(initial.clone(), transitions.clone(), emissions.clone());
            let model = cli::build(&files, json.as_deref(), &config)?;
            println!("{}", model);
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let opts: Opts = Opts::parse();
    println!("# started_at={}", chrono::Local::now());
    println!("# n_threads={}", rayon::current_num_threads());
    println!("# opts={:?}", opts);
    if let Err(e) = run(&opts) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
    println!("# finished_at={}", chrono::Local::now());
}
