use super::{log_summary, CompPipeline};
use crate::dataset::Dataset;
use crate::ranking::Ranking;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("worker pool needs at least one worker")]
    NoWorkers,
    #[error("ranking worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Ranks subjects on up to `workers` blocking tasks. The result matches
/// [`CompPipeline::rank_dataset`] exactly, including subject order.
pub async fn rank_concurrently(
    pipeline: Arc<CompPipeline>,
    dataset: Arc<Dataset>,
    workers: usize,
) -> Result<Vec<Ranking>, PoolError> {
    if workers == 0 {
        return Err(PoolError::NoWorkers);
    }

    let subject_count = dataset.subjects().len();
    if subject_count == 0 {
        return Ok(Vec::new());
    }

    let chunk_size = subject_count.div_ceil(workers);
    let chunk_count = subject_count.div_ceil(chunk_size);
    let mut tasks = JoinSet::new();

    for chunk in 0..chunk_count {
        let pipeline = Arc::clone(&pipeline);
        let dataset = Arc::clone(&dataset);
        let start = chunk * chunk_size;
        let end = (start + chunk_size).min(subject_count);

        tasks.spawn_blocking(move || {
            let subjects = &dataset.subjects()[start..end];
            debug!(chunk, subjects = subjects.len(), "ranking chunk");
            (chunk, pipeline.rank_subjects(&dataset, subjects))
        });
    }

    let mut chunks: Vec<Option<Vec<Ranking>>> = vec![None; chunk_count];
    while let Some(joined) = tasks.join_next().await {
        let (chunk, rankings) = joined?;
        chunks[chunk] = Some(rankings);
    }

    let rankings: Vec<Ranking> = chunks.into_iter().flatten().flatten().collect();
    log_summary(&rankings);
    Ok(rankings)
}
