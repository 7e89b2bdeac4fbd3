use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Parser, Subcommand};
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use dag_sampler::dag::Dag;
use dag_sampler::io::{read_nonsymmetric_weights, read_symmetric_weights};
use dag_sampler::nonsymmetric::NonsymmetricSampler;
use dag_sampler::sampler::Sampler;
use dag_sampler::symmetric::SymmetricSampler;
use dag_sampler::weights::SymmetricWeights;

/// Sample random DAGs with weights on parent sets.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    model: Model,

    /// Random seed (random if not given).
    #[arg(long, value_name = "INT", global = true)]
    seed: Option<u64>,

    /// More logging on stderr (-v: debug, -vv: trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Model {
    /// Node weights depend on the number of parents.
    Symmetric {
        #[command(subcommand)]
        source: SymmetricSource,

        /// Forbid nodes with more than this many parents.
        #[arg(long, value_name = "INT", global = true)]
        max_in_degree: Option<usize>,
    },

    /// Node weights depend on the exact parent set.
    Nonsymmetric {
        /// Weight file.
        file: PathBuf,

        /// Number of DAGs to sample.
        dags: usize,

        /// Print node names instead of indices.
        #[arg(long)]
        names: bool,
    },
}

#[derive(Debug, Subcommand)]
enum SymmetricSource {
    /// All DAGs on the given number of nodes are equally likely.
    Uniform {
        /// Number of nodes.
        nodes: usize,

        /// Number of DAGs to sample.
        dags: usize,
    },

    /// Read the weights from a file.
    Input {
        /// Weight file.
        file: PathBuf,

        /// Number of DAGs to sample.
        dags: usize,
    },
}

/// Preprocess and sample the whole batch, reporting the timings.
fn sample_timed<S, F>(dags: usize, rng: &mut ChaCha8Rng, build: F) -> color_eyre::Result<(S, Vec<Dag>)>
where
    S: Sampler,
    F: FnOnce() -> dag_sampler::error::Result<S>,
{
    info!("Sampling {} DAGs", dags);

    let time_pre = Instant::now();
    let sampler = build()?;
    let pre_elapsed = time_pre.elapsed();

    let time_sample = Instant::now();
    let samples = sampler.sample_many(dags, rng);
    let sample_elapsed = time_sample.elapsed();

    info!("Precomputation: {:.6}s", pre_elapsed.as_secs_f64());
    if dags > 0 {
        info!("Per DAG: {:.6}s", sample_elapsed.as_secs_f64() / dags as f64);
    }

    Ok((sampler, samples))
}

fn write_dags<I>(dags: I) -> io::Result<()>
where
    I: IntoIterator,
    I::Item: std::fmt::Display,
{
    let mut out = BufWriter::new(io::stdout().lock());
    for dag in dags {
        writeln!(out, "{}", dag)?;
    }
    out.flush()
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Usage errors exit with 1; --help and --version with 0.
            let code = if e.use_stderr() { 1 } else { 0 };
            e.print()?;
            std::process::exit(code);
        }
    };

    let level = match args.verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Random seed: {}", seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    match args.model {
        Model::Symmetric { source, max_in_degree } => {
            let (weights, dags) = match source {
                SymmetricSource::Uniform { nodes, dags } => (SymmetricWeights::uniform(nodes)?, dags),
                SymmetricSource::Input { file, dags } => (read_symmetric_weights(&file)?, dags),
            };
            let weights = match max_in_degree {
                Some(bound) => weights.with_max_in_degree(bound),
                None => weights,
            };
            let (_, samples) = sample_timed(dags, &mut rng, || SymmetricSampler::new(weights))?;
            write_dags(&samples)?;
        }
        Model::Nonsymmetric { file, dags, names } => {
            let weights = read_nonsymmetric_weights(&file)?;
            let (sampler, samples) = sample_timed(dags, &mut rng, || NonsymmetricSampler::new(weights))?;
            if names {
                let names = sampler.weights().names();
                write_dags(samples.iter().map(|dag| dag.display_with_names(names)))?;
            } else {
                write_dags(&samples)?;
            }
        }
    }

    Ok(())
}
