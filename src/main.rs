use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use ndarray::{s, ArrayView2};

use tinyformer::compare::{compare_outputs, random_attention};
use tinyformer::utils::{build_rng, read_array_json};
use tinyformer::EncoderConfig;

/// Random self-attention maps for small arrays
#[derive(Parser)]
#[command(name = "tinyformer", version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the attention maps of a fresh encoder over random input
    Attend {
        /// Sequence length
        #[arg(long, default_value_t = 5)]
        seq_len: usize,

        /// Model dimension
        #[arg(long, default_value_t = 8)]
        model_dim: usize,

        /// Number of attention heads
        #[arg(long, default_value_t = 2)]
        heads: usize,

        /// Encoder config JSON; overrides --model-dim and --heads
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for reproducible weights and input
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check an answer and compare the attention it induces with the expected one
    Compare {
        /// JSON array with the user's answer
        #[arg(long)]
        user: PathBuf,

        /// JSON array with the expected answer
        #[arg(long)]
        expected: PathBuf,

        /// Only compare shapes (the expected answer is random)
        #[arg(long)]
        shape_only: bool,

        /// Seed for reproducible weights
        #[arg(long)]
        seed: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Attend {
            seq_len,
            model_dim,
            heads,
            config,
            seed,
        } => attend(seq_len, model_dim, heads, config, seed),
        Commands::Compare {
            user,
            expected,
            shape_only,
            seed,
            json,
        } => compare(&user, &expected, shape_only, seed, json),
    }
}

fn attend(
    seq_len: usize,
    model_dim: usize,
    heads: usize,
    config: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<()> {
    let config = load_config(config.as_deref(), model_dim, heads)?;

    let mut rng = build_rng(seed.or(config.seed));
    info!(
        "Attending over random input: seq_len={}, model_dim={}, heads={}",
        seq_len, config.embed_dim, config.num_heads
    );
    let attention = random_attention(seq_len, config.embed_dim, config.num_heads, &mut rng)?;

    for h in 0..attention.dim().1 {
        println!("Head {}", h + 1);
        print_matrix(attention.slice(s![0, h, .., ..]));
    }
    Ok(())
}

fn load_config(path: Option<&Path>, model_dim: usize, heads: usize) -> Result<EncoderConfig> {
    let config = match path {
        Some(path) => EncoderConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EncoderConfig::new(model_dim, heads),
    };
    config
        .validate()
        .context("Invalid encoder configuration")?;
    Ok(config)
}

fn compare(
    user: &Path,
    expected: &Path,
    shape_only: bool,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let user_answer = read_array_json(user)
        .with_context(|| format!("Failed to read answer {}", user.display()))?;
    let expected_answer = read_array_json(expected)
        .with_context(|| format!("Failed to read expected answer {}", expected.display()))?;

    let mut rng = build_rng(seed);
    let report = compare_outputs(&user_answer, &expected_answer, shape_only, &mut rng)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Your output shape: {:?}, expected: {:?}",
        user_answer.shape(),
        expected_answer.shape()
    );
    if report.correct {
        println!("Correct!");
    } else {
        println!("Not quite. Comparing attention structure...");
    }

    for cmp in &report.heads {
        println!("\nHead {} comparison", cmp.head + 1);
        println!("Your attention:");
        print_matrix(report.user_attention.slice(s![0, cmp.head, .., ..]));
        println!("Expected attention:");
        print_matrix(report.expected_attention.slice(s![0, cmp.head, .., ..]));
        println!("Attention similarity (MSE): {:.6}", cmp.mse);
        println!("Your {}", cmp.similarity);
        println!("  yours:    {}", cmp.user);
        println!("  expected: {}", cmp.expected);
    }
    Ok(())
}

fn print_matrix(matrix: ArrayView2<f32>) {
    for row in matrix.rows() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:6.3}", v)).collect();
        println!("  {}", cells.join(" "));
    }
}
