//! Offline comparison of rankings against historical appraiser selections.

mod metrics;

pub use metrics::DistributionStats;

use crate::domain::PropertyId;
use crate::ranking::{QualityLabel, Ranking};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, warn};

/// Ground truth: the candidates an appraiser actually chose, per subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppraiserSelections {
    selections: BTreeMap<PropertyId, BTreeSet<PropertyId>>,
}

impl AppraiserSelections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, subject_id: PropertyId, candidate_id: PropertyId) {
        self.selections
            .entry(subject_id)
            .or_default()
            .insert(candidate_id);
    }

    /// Selections for a subject; `None` means the subject is unlabeled.
    pub fn selected_for(&self, subject_id: &PropertyId) -> Option<&BTreeSet<PropertyId>> {
        self.selections
            .get(subject_id)
            .filter(|selected| !selected.is_empty())
    }

    pub fn subjects(&self) -> impl Iterator<Item = &PropertyId> {
        self.selections.keys()
    }
}

impl FromIterator<(PropertyId, PropertyId)> for AppraiserSelections {
    fn from_iter<I: IntoIterator<Item = (PropertyId, PropertyId)>>(iter: I) -> Self {
        let mut selections = Self::new();
        for (subject_id, candidate_id) in iter {
            selections.insert(subject_id, candidate_id);
        }
        selections
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectMetrics {
    pub subject_id: PropertyId,
    pub ranked: usize,
    pub selected: usize,
    pub hits: usize,
    pub precision_at_k: f64,
    pub recall: f64,
}

impl SubjectMetrics {
    fn measure(ranking: &Ranking, selected: &BTreeSet<PropertyId>) -> Self {
        let ranked = ranking.entries.len();
        let hits = ranking
            .candidate_ids()
            .filter(|candidate_id| selected.contains(*candidate_id))
            .count();

        Self {
            subject_id: ranking.subject_id.clone(),
            ranked,
            selected: selected.len(),
            hits,
            precision_at_k: ratio(hits, ranked),
            recall: ratio(hits, selected.len()),
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: QualityLabel,
    pub label_name: &'static str,
    pub count: usize,
}

fn label_counts(counts: &HashMap<QualityLabel, usize>) -> Vec<LabelCount> {
    QualityLabel::ordered()
        .into_iter()
        .map(|label| LabelCount {
            label,
            label_name: label.label(),
            count: counts.get(&label).copied().unwrap_or(0),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub per_subject: Vec<SubjectMetrics>,
    pub unlabeled: Vec<PropertyId>,
    pub labeled_subjects: usize,
    pub mean_precision: Option<f64>,
    pub mean_recall: Option<f64>,
    pub precision: Option<DistributionStats>,
    pub recall: Option<DistributionStats>,
    /// Share of labeled subjects with at least one hit.
    pub hit_rate: Option<f64>,
    pub label_distribution: Vec<LabelCount>,
    pub hit_label_distribution: Vec<LabelCount>,
}

impl EvaluationReport {
    pub fn unlabeled_count(&self) -> usize {
        self.unlabeled.len()
    }
}

pub fn evaluate(rankings: &[Ranking], selections: &AppraiserSelections) -> EvaluationReport {
    let mut per_subject = Vec::new();
    let mut unlabeled = Vec::new();
    let mut labels: HashMap<QualityLabel, usize> = HashMap::new();
    let mut hit_labels: HashMap<QualityLabel, usize> = HashMap::new();

    for ranking in rankings {
        for entry in &ranking.entries {
            *labels.entry(entry.quality).or_default() += 1;
        }

        let Some(selected) = selections.selected_for(&ranking.subject_id) else {
            unlabeled.push(ranking.subject_id.clone());
            continue;
        };

        for entry in &ranking.entries {
            if selected.contains(&entry.candidate_id) {
                *hit_labels.entry(entry.quality).or_default() += 1;
            }
        }
        per_subject.push(SubjectMetrics::measure(ranking, selected));
    }

    let ranked_subjects: BTreeSet<&PropertyId> =
        rankings.iter().map(|ranking| &ranking.subject_id).collect();
    let orphaned = selections
        .subjects()
        .filter(|subject_id| !ranked_subjects.contains(subject_id))
        .count();
    if orphaned > 0 {
        warn!(orphaned, "selections reference subjects without a ranking");
    }

    let precisions: Vec<f64> = per_subject.iter().map(|m| m.precision_at_k).collect();
    let recalls: Vec<f64> = per_subject.iter().map(|m| m.recall).collect();
    let precision = DistributionStats::from_values(&precisions);
    let recall = DistributionStats::from_values(&recalls);

    let labeled_subjects = per_subject.len();
    let hit_rate = (labeled_subjects > 0).then(|| {
        ratio(
            per_subject.iter().filter(|m| m.hits > 0).count(),
            labeled_subjects,
        )
    });

    let report = EvaluationReport {
        labeled_subjects,
        mean_precision: precision.map(|stats| stats.mean),
        mean_recall: recall.map(|stats| stats.mean),
        precision,
        recall,
        hit_rate,
        label_distribution: label_counts(&labels),
        hit_label_distribution: label_counts(&hit_labels),
        per_subject,
        unlabeled,
    };

    info!(
        labeled = report.labeled_subjects,
        unlabeled = report.unlabeled_count(),
        mean_precision = report.mean_precision.unwrap_or_default(),
        mean_recall = report.mean_recall.unwrap_or_default(),
        "evaluation complete"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SubScore;
    use crate::ranking::Ranker;
    use crate::scoring::FeatureVector;

    fn ranking(subject: &str, candidates: &[(&str, f64)]) -> Ranking {
        let vectors = candidates
            .iter()
            .map(|(id, composite)| FeatureVector {
                candidate_id: PropertyId::new(*id),
                physical: SubScore::measured(*composite, Vec::new()),
                location: SubScore::measured(*composite, Vec::new()),
                temporal: SubScore::measured(*composite, Vec::new()),
                market: SubScore::measured(*composite, Vec::new()),
                composite: *composite,
                distance_km: None,
                days_since_sale: None,
                sold_after_effective: None,
            })
            .collect();
        Ranker::new(3).rank(&PropertyId::new(subject), vectors)
    }

    fn selections(pairs: &[(&str, &str)]) -> AppraiserSelections {
        pairs
            .iter()
            .map(|(s, c)| (PropertyId::new(*s), PropertyId::new(*c)))
            .collect()
    }

    #[test]
    fn exact_match_scores_full_precision() {
        let rankings = vec![ranking("s1", &[("a", 90.0), ("b", 80.0), ("c", 70.0)])];
        let report = evaluate(&rankings, &selections(&[("s1", "a"), ("s1", "b"), ("s1", "c")]));

        assert_eq!(report.per_subject[0].precision_at_k, 1.0);
        assert_eq!(report.per_subject[0].recall, 1.0);
        assert_eq!(report.mean_precision, Some(1.0));
        assert_eq!(report.hit_rate, Some(1.0));
    }

    #[test]
    fn zero_overlap_scores_zero() {
        let rankings = vec![ranking("s1", &[("a", 90.0), ("b", 80.0)])];
        let report = evaluate(&rankings, &selections(&[("s1", "z")]));

        assert_eq!(report.per_subject[0].precision_at_k, 0.0);
        assert_eq!(report.per_subject[0].recall, 0.0);
        assert_eq!(report.hit_rate, Some(0.0));
    }

    #[test]
    fn unlabeled_subjects_are_excluded_from_means() {
        let rankings = vec![
            ranking("s1", &[("a", 90.0), ("b", 80.0)]),
            ranking("s2", &[("x", 90.0)]),
            ranking("s3", &[]),
        ];
        let report = evaluate(&rankings, &selections(&[("s1", "a"), ("s3", "q")]));

        assert_eq!(report.labeled_subjects, 2);
        assert_eq!(report.unlabeled, vec![PropertyId::new("s2")]);
        assert_eq!(report.mean_precision, Some(0.25));
        assert_eq!(report.mean_recall, Some(0.5));

        let empty = &report.per_subject[1];
        assert_eq!(empty.ranked, 0);
        assert_eq!(empty.precision_at_k, 0.0);
        assert_eq!(empty.recall, 0.0);
    }

    #[test]
    fn label_distributions_follow_quality_order() {
        let rankings = vec![ranking("s1", &[("a", 90.0), ("b", 72.0), ("c", 10.0)])];
        let report = evaluate(&rankings, &selections(&[("s1", "b")]));

        let counts: Vec<(QualityLabel, usize)> = report
            .label_distribution
            .iter()
            .map(|entry| (entry.label, entry.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                (QualityLabel::Excellent, 1),
                (QualityLabel::Good, 1),
                (QualityLabel::Fair, 0),
                (QualityLabel::Poor, 1),
            ]
        );
        assert_eq!(report.hit_label_distribution[1].count, 1);
        assert_eq!(report.hit_label_distribution[0].count, 0);
    }

    #[test]
    fn no_rankings_gives_empty_aggregates() {
        let report = evaluate(&[], &AppraiserSelections::new());
        assert_eq!(report.labeled_subjects, 0);
        assert_eq!(report.mean_precision, None);
        assert_eq!(report.hit_rate, None);
    }
}
