//! Command-line surface for training and assignment.
//!
//! The delimited-text shim lives here: a header row names the columns,
//! every following row becomes a record with named numeric fields. The
//! engine itself only ever sees `Record`s and feature vectors.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;

use centra::{assign_batch, persist, summarize, FeatureVectorBuilder, FieldMap, Kmeans};

#[derive(Parser)]
#[command(name = "centra", version, about = "Centroid-based clustering over delimited numeric data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a model and write it to a binary artifact.
    Train {
        /// Delimited text file with a header row.
        #[arg(long)]
        data: PathBuf,
        /// Ordered, comma-separated feature column names.
        #[arg(long, value_delimiter = ',', required = true)]
        features: Vec<String>,
        /// Number of clusters.
        #[arg(short, long)]
        k: usize,
        /// Iteration cap.
        #[arg(long, default_value_t = 100)]
        max_iter: usize,
        /// Convergence tolerance on summed squared centroid displacement.
        #[arg(long, default_value_t = 1e-4)]
        tol: f64,
        /// Seed for reproducible initialization.
        #[arg(long)]
        seed: Option<u64>,
        /// Output path for the model artifact.
        #[arg(long)]
        model: PathBuf,
        /// Column delimiter.
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
    /// Assign rows to a trained model's clusters and print statistics.
    Assign {
        /// Model artifact produced by `train`.
        #[arg(long)]
        model: PathBuf,
        /// Delimited text file with a header row.
        #[arg(long)]
        data: PathBuf,
        /// The same ordered feature column names used at training time.
        #[arg(long, value_delimiter = ',', required = true)]
        features: Vec<String>,
        /// Feature indices to average per cluster (defaults to the first
        /// two, like the report this replaces).
        #[arg(long, value_delimiter = ',')]
        summary_features: Option<Vec<usize>>,
        /// Column delimiter.
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
}

fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().filter_or("RUST_LOG", "info"));

    match Cli::parse().command {
        Command::Train {
            data,
            features,
            k,
            max_iter,
            tol,
            seed,
            model,
            delimiter,
        } => train(&data, features, k, max_iter, tol, seed, &model, delimiter),
        Command::Assign {
            model,
            data,
            features,
            summary_features,
            delimiter,
        } => assign(&model, &data, features, summary_features, delimiter),
    }
}

#[allow(clippy::too_many_arguments)]
fn train(
    data: &Path,
    features: Vec<String>,
    k: usize,
    max_iter: usize,
    tol: f64,
    seed: Option<u64>,
    model_path: &Path,
    delimiter: char,
) -> Result<()> {
    let records = read_records(data, delimiter)?;
    let builder = FeatureVectorBuilder::new(features);
    let vectors = builder.build_all(&records)?;
    println!(
        "Loaded {} rows x {} features from {}",
        vectors.len(),
        builder.dimension(),
        data.display()
    );

    let mut trainer = Kmeans::new(k).with_max_iter(max_iter).with_tol(tol);
    if let Some(seed) = seed {
        trainer = trainer.with_seed(seed);
    }
    let model = trainer.train(&vectors)?;

    if let Some(diag) = model.diagnostics() {
        println!(
            "Trained {model}: {} iterations, inertia {:.4}{}",
            diag.iterations,
            diag.inertia,
            if diag.converged {
                ""
            } else {
                " (iteration cap reached before tolerance)"
            }
        );
    }

    persist::save(&model, model_path)?;
    println!("Model saved to: {}", model_path.display());
    Ok(())
}

fn assign(
    model_path: &Path,
    data: &Path,
    features: Vec<String>,
    summary_features: Option<Vec<usize>>,
    delimiter: char,
) -> Result<()> {
    let model = persist::load(model_path)?;
    println!("Model loaded: {model}");

    let records = read_records(data, delimiter)?;
    let builder = FeatureVectorBuilder::new(features);
    let vectors = records
        .iter()
        .map(|r| builder.build_for(r, model.dimension()))
        .collect::<centra::Result<Vec<_>>>()?;

    let assignments = assign_batch(&model, &vectors)?;

    let selected = summary_features
        .unwrap_or_else(|| (0..model.dimension().min(2)).collect());
    let report = summarize(&assignments, &vectors, &selected)?;
    println!("{report}");
    Ok(())
}

/// Read a delimited text file into named-field records.
fn read_records(path: &Path, delimiter: char) -> Result<Vec<FieldMap>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines
        .next()
        .with_context(|| format!("dataset {} is empty", path.display()))?;
    let header: Vec<String> = header_line
        .split(delimiter)
        .map(|name| name.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (line_no, line) in lines {
        let mut values = Vec::with_capacity(header.len());
        for raw in line.split(delimiter) {
            let raw = raw.trim();
            let value: f64 = raw
                .parse()
                .with_context(|| format!("line {}: '{raw}' is not numeric", line_no + 1))?;
            values.push(value);
        }
        if values.len() != header.len() {
            bail!(
                "line {}: {} columns, header has {}",
                line_no + 1,
                values.len(),
                header.len()
            );
        }
        records.push(FieldMap::from_row(&header, &values)?);
    }
    Ok(records)
}
