//! Deduplicated dataset in, one ranking per subject out.

pub mod pool;

use crate::dataset::Dataset;
use crate::domain::{Property, Subject};
use crate::features::{FeatureConfig, FeatureExtractor};
use crate::ranking::{Ranker, Ranking, DEFAULT_TOP_K};
use crate::scoring::{CompositeScorer, FeatureVector, ScoringWeights};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub weights: ScoringWeights,
    pub top_k: usize,
    #[serde(default)]
    pub features: FeatureConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            top_k: DEFAULT_TOP_K,
            features: FeatureConfig::default(),
        }
    }
}

/// Immutable extractor, scorer and ranker stages. Safe to share across workers.
#[derive(Debug, Clone, Default)]
pub struct CompPipeline {
    extractor: FeatureExtractor,
    scorer: CompositeScorer,
    ranker: Ranker,
}

impl CompPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            extractor: FeatureExtractor::new(config.features),
            scorer: CompositeScorer::new(config.weights),
            ranker: Ranker::new(config.top_k),
        }
    }

    pub fn top_k(&self) -> usize {
        self.ranker.top_k()
    }

    /// Every candidate is scored before ranking starts.
    pub fn score_pool(&self, subject: &Subject, candidates: &[Property]) -> Vec<FeatureVector> {
        self.extractor
            .extract_pool(subject, candidates)
            .into_iter()
            .map(|features| self.scorer.score(features))
            .collect()
    }

    pub fn rank_subject(&self, subject: &Subject, candidates: &[Property]) -> Ranking {
        let vectors = self.score_pool(subject, candidates);

        for vector in vectors.iter().filter(|vector| vector.is_degraded()) {
            debug!(
                subject_id = %subject.id(),
                candidate_id = %vector.candidate_id,
                composite = vector.composite,
                "scored with degraded inputs"
            );
        }

        self.ranker.rank(subject.id(), vectors)
    }

    pub(crate) fn rank_subjects(&self, dataset: &Dataset, subjects: &[Subject]) -> Vec<Ranking> {
        subjects
            .iter()
            .map(|subject| self.rank_subject(subject, dataset.pool_for(subject.id())))
            .collect()
    }

    /// Sequential ranking in subject identifier order.
    pub fn rank_dataset(&self, dataset: &Dataset) -> Vec<Ranking> {
        let rankings = self.rank_subjects(dataset, dataset.subjects());
        log_summary(&rankings);
        rankings
    }
}

pub(crate) fn log_summary(rankings: &[Ranking]) {
    let empty = rankings.iter().filter(|r| r.is_empty_pool()).count();
    let short = rankings
        .iter()
        .filter(|r| r.is_short() && !r.is_empty_pool())
        .count();
    info!(
        subjects = rankings.len(),
        full = rankings.len() - empty - short,
        short,
        empty,
        "ranking complete"
    );
}
