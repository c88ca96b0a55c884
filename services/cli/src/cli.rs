use crate::commands::{run_dedup, run_evaluate, run_rank};
use clap::{Args, Parser, Subcommand};
use comp_engine::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "comps",
    about = "Score, rank and evaluate comparable properties for appraisal subjects",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank each subject's candidate pool and write the top comps as CSV
    Rank(RankArgs),
    /// Report duplicate candidate records and what merging would remove
    Dedup(DedupArgs),
    /// Rank, then compare against historical appraiser selections
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub(crate) struct DatasetArgs {
    /// Subjects CSV (requires `id` and `effective_date` columns)
    #[arg(long)]
    pub(crate) subjects: PathBuf,
    /// Candidates CSV (requires `subject_id` and `id` columns)
    #[arg(long)]
    pub(crate) candidates: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct RankingArgs {
    /// Deduplicate candidate pools before ranking
    #[arg(long)]
    pub(crate) dedup: bool,
    /// Override the configured number of comps per subject
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) top_k: Option<u32>,
    /// Override the configured worker pool size
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) workers: Option<u32>,
}

#[derive(Args, Debug)]
pub(crate) struct RankArgs {
    #[command(flatten)]
    pub(crate) dataset: DatasetArgs,
    #[command(flatten)]
    pub(crate) ranking: RankingArgs,
    /// Write rankings here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct DedupArgs {
    #[command(flatten)]
    pub(crate) dataset: DatasetArgs,
    /// Override the configured per-subject candidate floor
    #[arg(long)]
    pub(crate) min_candidates: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    #[command(flatten)]
    pub(crate) dataset: DatasetArgs,
    /// Ground-truth CSV with `subject_id` and `candidate_id` columns
    #[arg(long)]
    pub(crate) selections: PathBuf,
    #[command(flatten)]
    pub(crate) ranking: RankingArgs,
    /// Also write the full evaluation report as JSON
    #[arg(long)]
    pub(crate) json: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Rank(args) => run_rank(args).await,
        Command::Dedup(args) => run_dedup(args),
        Command::Evaluate(args) => run_evaluate(args).await,
    }
}
