use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use quercus_io::{DatasetReader, write_forest, write_predictions, write_summary};
use quercus_tree::{DecisionTree, InductionStrategy, SplitMetric, TreeBuilder};

#[derive(Parser)]
#[command(name = "quercus")]
#[command(about = "Categorical decision tree induction and classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Induce a decision tree from a CSV dataset and save the model
    Fit {
        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Name of the target (class) column
        #[arg(long)]
        target: String,

        /// Split metric: "gainratio" or "infogain"
        #[arg(long, default_value = "gainratio")]
        metric: String,

        /// Induction strategy: "recursive" or "worklist"
        #[arg(long, default_value = "recursive")]
        strategy: String,

        /// Score candidate attributes in parallel
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Where to write the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Also write a LaTeX forest rendering to this path
        #[arg(long)]
        render: Option<PathBuf>,

        /// Also write a JSON tree summary to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Classify every row of a CSV dataset with a trained model
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the CSV file to classify
        #[arg(long)]
        data: PathBuf,

        /// Where to write the predictions CSV
        #[arg(long)]
        output: PathBuf,
    },

    /// Render a trained model as a LaTeX forest document
    Render {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Where to write the .tex document
        #[arg(long)]
        output: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct FitOutput {
    target: String,
    metric: String,
    strategy: String,
    n_rows: usize,
    n_nodes: usize,
    n_leaves: usize,
    depth: usize,
    training_accuracy: f64,
}

#[derive(Serialize)]
struct PredictOutput {
    n_rows: usize,
    n_classified: usize,
    n_failed: usize,
    /// Present when the dataset carries the target column.
    accuracy: Option<f64>,
}

#[derive(Serialize)]
struct RenderOutput {
    output: PathBuf,
    n_nodes: usize,
    n_leaves: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Fit {
            data,
            target,
            metric,
            strategy,
            parallel,
            model,
            render,
            summary,
        } => {
            let metric: SplitMetric = metric.parse()?;
            let strategy: InductionStrategy = strategy.parse()?;

            let dataset = DatasetReader::new(&data)
                .read()
                .with_context(|| format!("failed to read {}", data.display()))?;

            let tree = TreeBuilder::new()
                .with_metric(metric)
                .with_strategy(strategy)
                .with_parallel(parallel)
                .fit(&dataset, &target)
                .context("tree induction failed")?;

            tree.save(&model).context("failed to save model")?;
            if let Some(path) = &render {
                write_forest(&tree, path)?;
            }
            if let Some(path) = &summary {
                write_summary(&tree, path)?;
            }

            let output = FitOutput {
                target,
                metric: metric.to_string(),
                strategy: strategy.to_string(),
                n_rows: dataset.n_rows(),
                n_nodes: tree.n_nodes(),
                n_leaves: tree.n_leaves(),
                depth: tree.depth(),
                training_accuracy: tree.accuracy(&dataset)?,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            model,
            data,
            output,
        } => {
            let tree = DecisionTree::load(&model).context("failed to load model")?;
            let dataset = DatasetReader::new(&data)
                .read()
                .with_context(|| format!("failed to read {}", data.display()))?;

            let results = tree.classify_dataset(&dataset);
            let n_failed = results.iter().filter(|r| r.is_err()).count();
            if n_failed > 0 {
                warn!(n_failed, "some rows could not be classified");
            }
            write_predictions(&results, &output)?;

            let accuracy = if dataset.attribute_index(tree.target()).is_ok() {
                Some(tree.accuracy(&dataset)?)
            } else {
                None
            };

            let out = PredictOutput {
                n_rows: dataset.n_rows(),
                n_classified: results.len() - n_failed,
                n_failed,
                accuracy,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }

        Command::Render { model, output } => {
            let tree = DecisionTree::load(&model).context("failed to load model")?;
            write_forest(&tree, &output)?;

            let out = RenderOutput {
                n_nodes: tree.n_nodes(),
                n_leaves: tree.n_leaves(),
                output,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(())
}
