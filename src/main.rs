use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use gaml::align::{IndexMeta, SingleReadSet};
use gaml::anneal::Annealer;
use gaml::config::Config;
use gaml::graph::velvet_to_internal;
use gaml::index::{AnyReadIndex, DEFAULT_K};
use gaml::io;
use gaml::path::build_paths_from_single_nodes;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "gaml",
    author,
    version,
    about = "Genome assembly refinement by maximum likelihood",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Optimize the assembly described by a TOML configuration
    Optimize {
        /// Configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Worker threads for path alignment (overrides the configuration)
        #[arg(short = 't', long = "threads")]
        threads: Option<usize>,
    },
    /// Build a k-mer index of a FASTQ read file
    Index {
        /// Reads FASTQ file
        reads: PathBuf,
        /// Output index file
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, default_value_t = DEFAULT_K)]
        k: usize,
        /// Index only this many random k-mers per read
        #[arg(long)]
        sampled: Option<usize>,
        #[arg(long = "max-error", default_value_t = gaml::align::DEFAULT_MAX_ERROR)]
        max_error: u32,
        #[arg(long, default_value_t = 47)]
        seed: u64,
    },
    /// Print the neighbourhood of a node as a Graphviz digraph
    Subgraph {
        /// Graph file
        graph: PathBuf,
        /// Velvet node id (negative for the reverse strand)
        #[arg(allow_hyphen_values = true)]
        node: i64,
        /// Do not explore through nodes at least this long
        #[arg(long, default_value_t = 500)]
        threshold: usize,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);
    match cli.command {
        Commands::Optimize { config, threads } => run_optimize(&config, threads),
        Commands::Index { reads, output, k, sampled, max_error, seed } => {
            run_index(&reads, &output, k, sampled, max_error, seed)
        }
        Commands::Subgraph { graph, node, threshold } => run_subgraph(&graph, node, threshold),
    }
}

fn run_optimize(config_path: &Path, threads: Option<usize>) -> Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("cannot load configuration '{}'", config_path.display()))?;

    if let Some(n) = threads.or(config.threads) {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("cannot configure the thread pool")?;
    }

    let graph = io::graph::load_graph_file(&config.starting_graph)
        .with_context(|| format!("cannot load graph '{}'", config.starting_graph.display()))?;
    let calc = config.build_calculator().context("cannot load read sets")?;

    let start = build_paths_from_single_nodes(&graph.big_nodes(config.moves.big_node_threshold));
    info!("{} starting paths from nodes of at least {} bp", start.len(), config.moves.big_node_threshold);
    if start.is_empty() {
        anyhow::bail!("graph has no node of at least {} bp", config.moves.big_node_threshold);
    }

    let output = config.output_file.clone();
    let mut annealer = Annealer::new(&graph, calc, config.moves.clone(), config.anneal.clone());
    let outcome = annealer.run(start, |iteration, paths| {
        let path = output.with_extension(format!("{}.fasta", iteration));
        io::fasta::write_paths_file(paths, &graph, &path)?;
        info!("checkpoint written to {}", path.display());
        Ok(())
    })?;

    io::fasta::write_paths_file(&outcome.paths, &graph, &output)
        .with_context(|| format!("cannot write assembly '{}'", output.display()))?;
    info!(
        "{} paths, log-prob {:.4}, {} of {} proposals accepted, written to {}",
        outcome.paths.len(),
        outcome.log_prob,
        outcome.accepted,
        outcome.iterations,
        output.display()
    );
    Ok(())
}

fn run_index(reads: &Path, output: &Path, k: usize, sampled: Option<usize>, max_error: u32, seed: u64) -> Result<()> {
    if k == 0 {
        anyhow::bail!("k must be positive");
    }
    let index = match sampled {
        Some(0) => anyhow::bail!("--sampled must be positive"),
        Some(n) => AnyReadIndex::sampled(k, n, seed),
        None => AnyReadIndex::standard(k),
    };
    let mut set = SingleReadSet::from_fastq(reads, index)
        .with_context(|| format!("cannot load reads '{}'", reads.display()))?
        .with_max_error(max_error);
    if set.is_empty() {
        anyhow::bail!("FASTQ file '{}' contains no reads", reads.display());
    }
    set.set_meta(IndexMeta {
        reads_file: Some(reads.display().to_string()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    });
    set.save_to_file(output)
        .with_context(|| format!("cannot write index to '{}'", output.display()))?;
    info!("read index of {} reads saved: {}", set.len(), output.display());
    Ok(())
}

fn run_subgraph(graph_path: &Path, node: i64, threshold: usize) -> Result<()> {
    let graph = io::graph::load_graph_file(graph_path)
        .with_context(|| format!("cannot load graph '{}'", graph_path.display()))?;
    let start = velvet_to_internal(node)
        .filter(|&id| id < graph.len())
        .with_context(|| format!("node {} is not in the graph", node))?;
    let nodes = graph.reach_local_with_threshold(start, threshold);
    print!("{}", graph.to_dot(&nodes));
    Ok(())
}
