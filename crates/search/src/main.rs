//! Tagline search driver.
//!
//! Runs the tree search for a company description with random-rollout
//! collaborators and saves the exported tree as JSON. Saved trees can be
//! summarized later, optionally rewound to an earlier iteration.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tagline_core::Axis;
use tagline_mcts::{
    BestTagline, EvaluationRecord, ExportedTree, Mcts, MctsConfig, RandomRollout, SearchResult,
    TracingObserver,
};
use tracing_subscriber::EnvFilter;

/// Maximum number of words a rollout completion appends.
const ROLLOUT_EXTRA_WORDS: usize = 4;

/// Tagline search with Monte Carlo Tree Search.
#[derive(Parser)]
#[command(name = "tagline-search")]
#[command(about = "Search for a company tagline and inspect saved search trees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a tagline and save the tree.
    Run {
        /// File containing the company description.
        #[arg(short, long)]
        description: PathBuf,

        /// Number of search iterations.
        #[arg(short, long, default_value = "10")]
        iterations: usize,

        /// Maximum number of words in a partial tagline.
        #[arg(long, default_value = "10")]
        max_depth: usize,

        /// Maximum number of children per node.
        #[arg(short, long, default_value = "5")]
        branching: usize,

        /// UCB1 exploration constant.
        #[arg(short, long, default_value = "0.1")]
        exploration: f64,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Where to write the exported tree.
        #[arg(short, long, default_value = "tree.json")]
        output: PathBuf,
    },

    /// Summarize a saved tree.
    Summary {
        /// Exported tree written by `run`.
        #[arg(short, long)]
        input: PathBuf,

        /// Show the tree as it stood after this iteration (0-based).
        #[arg(long)]
        iteration: Option<usize>,

        /// Number of taglines to list.
        #[arg(short, long, default_value = "5")]
        top: usize,
    },
}

fn read_description(path: &Path) -> Result<String> {
    let description = fs::read_to_string(path)
        .with_context(|| format!("Failed to read description: {:?}", path))?;
    let description = description.trim();
    if description.is_empty() {
        bail!("Description file {:?} is empty", path);
    }
    Ok(description.to_string())
}

fn write_export(path: &Path, tree: &ExportedTree) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, tree)
        .with_context(|| format!("Failed to serialize tree to {:?}", path))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write tree to {:?}", path))
}

fn load_export(path: &Path) -> Result<ExportedTree> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse tree from {:?}", path))
}

/// Run the search and save the tree.
fn cmd_run(description: &Path, config: MctsConfig, seed: u64, output: &Path) -> Result<SearchResult> {
    let description = read_description(description)?;

    println!(
        "Searching with {} iterations (depth {}, branching {}, exploration {})",
        config.iterations, config.max_depth, config.branching_factor, config.exploration
    );
    println!("Seed: {}", seed);

    let rollout = RandomRollout::from_description(
        ChaCha8Rng::seed_from_u64(seed),
        &description,
        config.branching_factor,
        ROLLOUT_EXTRA_WORDS,
    );
    if rollout.vocabulary().is_empty() {
        bail!("Description contains no usable words");
    }

    let start = Instant::now();
    let mut mcts = Mcts::new(config, description, &rollout, &rollout, &rollout)
        .context("Invalid search configuration")?
        .with_observer(TracingObserver);

    // Save what was built even if the search aborts
    let outcome = mcts.run();
    write_export(output, &mcts.tree().export())?;
    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(
                completed = mcts.iterations_completed(),
                category = ?err.category(),
                error = %err,
                "search aborted"
            );
            return Err(err).with_context(|| {
                format!(
                    "Search aborted after {} iterations",
                    mcts.iterations_completed()
                )
            });
        }
    };

    tracing::info!(
        iterations = result.iterations,
        nodes = mcts.tree().len(),
        root_value = result.root_value,
        best = result.best.as_ref().map(|b| b.tagline.as_str()),
        "search finished"
    );
    println!("\nCompleted in {:.2}s", start.elapsed().as_secs_f64());
    println!("Nodes: {}", mcts.tree().len());
    print_result(&result);
    println!("Tree saved to: {:?}", output);

    Ok(result)
}

fn print_result(result: &SearchResult) {
    println!(
        "Root: {} visits, mean outcome {:.3}",
        result.root_visits, result.root_value
    );

    let line: Vec<&str> = result
        .principal_line
        .iter()
        .skip(1)
        .map(String::as_str)
        .collect();
    if let Some(deepest) = line.last() {
        println!("Most visited line: {:?}", deepest);
    }

    match &result.best {
        Some(best) => {
            println!("{}", best_line(best));
            for axis in Axis::ALL {
                let component = best.score.component(axis);
                println!("  {:<10} {} - {}", axis, component.score, component.rationale);
            }
        }
        None => println!("No tagline was rated"),
    }
}

/// Iterations are reported 0-based everywhere, matching `summary --iteration`.
fn best_line(best: &BestTagline) -> String {
    format!(
        "Best tagline: {:?} ({:.2}, iteration {})",
        best.tagline,
        best.score.combined(),
        best.iteration
    )
}

fn ranked_line(rank: usize, evaluation: &EvaluationRecord) -> String {
    format!(
        "{:>3}. {:.2}  {:?} (iteration {})",
        rank,
        evaluation.score.combined(),
        evaluation.tagline,
        evaluation.iteration
    )
}

/// Load a saved tree and print its best taglines.
fn cmd_summary(input: &Path, iteration: Option<usize>, top: usize) -> Result<ExportedTree> {
    let exported = load_export(input)?;

    let tree = match iteration {
        Some(k) => match exported.max_iteration() {
            Some(last) if k <= last => exported
                .as_of(k)
                .with_context(|| format!("Root missing at iteration {}", k))?,
            Some(last) => bail!("Iteration {} not in tree (last is {})", k, last),
            None => bail!("Tree has no completed iterations"),
        },
        None => exported,
    };

    let nodes = tree.nodes().len();
    match iteration {
        Some(k) => println!("Tree after iteration {}: {} nodes", k, nodes),
        None => println!("Tree: {} nodes", nodes),
    }
    println!(
        "Root: {} visits, mean outcome {:.3}",
        tree.root().visit_count,
        tree.root().mean_value()
    );

    println!("\nTop taglines:");
    for (rank, evaluation) in tree.ranked_evaluations().into_iter().take(top).enumerate() {
        println!("{}", ranked_line(rank + 1, evaluation));
    }

    Ok(tree)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            description,
            iterations,
            max_depth,
            branching,
            exploration,
            seed,
            output,
        } => {
            let config = MctsConfig {
                iterations,
                max_depth,
                branching_factor: branching,
                exploration,
            };
            cmd_run(&description, config, seed, &output).map(|_| ())
        }

        Commands::Summary {
            input,
            iteration,
            top,
        } => cmd_summary(&input, iteration, top).map(|_| ()),
    }
}
