use crate::cli::{DatasetArgs, DedupArgs, EvaluateArgs, RankArgs, RankingArgs};
use crate::render::{render_coverage, render_dedup, render_evaluation};
use comp_engine::config::AppConfig;
use comp_engine::dataset::{write_rankings, Dataset};
use comp_engine::error::AppError;
use comp_engine::evaluation::evaluate;
use comp_engine::pipeline::{pool, CompPipeline};
use comp_engine::ranking::Ranking;
use comp_engine::telemetry;
use std::fs::File;
use std::io::{self, BufWriter};
use std::sync::Arc;
use tracing::info;

fn load_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(environment = ?config.environment, "configuration loaded");
    Ok(config)
}

fn load_dataset(config: &AppConfig, args: &DatasetArgs, dedup: bool) -> Result<Dataset, AppError> {
    let dataset = Dataset::from_paths(&args.subjects, &args.candidates)?;
    if !dedup {
        return Ok(dataset);
    }
    let (deduplicated, _) = dataset.deduplicate(&config.dedup());
    Ok(deduplicated)
}

async fn rank(
    config: &AppConfig,
    dataset: Dataset,
    args: &RankingArgs,
) -> Result<Vec<Ranking>, AppError> {
    let mut pipeline_config = config.pipeline();
    if let Some(top_k) = args.top_k {
        pipeline_config.top_k = top_k as usize;
    }
    let workers = args
        .workers
        .map(|workers| workers as usize)
        .unwrap_or(config.ranking.workers);

    let pipeline = Arc::new(CompPipeline::new(pipeline_config));
    let rankings = pool::rank_concurrently(pipeline, Arc::new(dataset), workers).await?;
    Ok(rankings)
}

pub(crate) async fn run_rank(args: RankArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let dataset = load_dataset(&config, &args.dataset, args.ranking.dedup)?;
    let rankings = rank(&config, dataset, &args.ranking).await?;

    match &args.output {
        Some(path) => {
            write_rankings(BufWriter::new(File::create(path)?), &rankings)?;
            eprintln!("Wrote rankings to {}", path.display());
        }
        None => write_rankings(io::stdout().lock(), &rankings)?,
    }

    render_coverage(&rankings);
    Ok(())
}

pub(crate) fn run_dedup(args: DedupArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let dataset = Dataset::from_paths(&args.dataset.subjects, &args.dataset.candidates)?;

    let mut dedup_config = config.dedup();
    if let Some(min_candidates) = args.min_candidates {
        dedup_config = dedup_config.with_min_candidates(min_candidates);
    }

    let (_, outcome) = dataset.deduplicate(&dedup_config);
    render_dedup(&outcome);
    Ok(())
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let dataset = load_dataset(&config, &args.dataset, args.ranking.dedup)?;
    let selections = dataset.load_selections_from_path(&args.selections)?;
    let rankings = rank(&config, dataset, &args.ranking).await?;

    let report = evaluate(&rankings, &selections);
    render_evaluation(&report);

    if let Some(path) = &args.json {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &report)?;
        println!("\nWrote evaluation report to {}", path.display());
    }

    Ok(())
}
