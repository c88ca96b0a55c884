//! Conservative collapse of near-identical candidate records within each
//! subject's pool.

mod address;
mod similarity;

use crate::domain::{Candidate, PropertyId, StructureType};
use serde::{Deserialize, Serialize};
use similarity::{duplicate_confidence, ComparableRecord};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// Threshold and relative tolerance applied to one structure type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuplicateRule {
    pub threshold: f64,
    pub tolerance: f64,
}

impl DuplicateRule {
    pub const STANDARD: Self = Self {
        threshold: 0.85,
        tolerance: 0.05,
    };

    pub const CONDOMINIUM: Self = Self {
        threshold: 0.95,
        tolerance: 0.02,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Candidates a subject must keep after any merge.
    pub min_candidates: usize,
    pub default_rule: DuplicateRule,
    pub structure_rules: HashMap<StructureType, DuplicateRule>,
    pub colocated_meters: f64,
    pub proximity_radius_meters: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            min_candidates: 3,
            default_rule: DuplicateRule::STANDARD,
            structure_rules: HashMap::from([(
                StructureType::Condominium,
                DuplicateRule::CONDOMINIUM,
            )]),
            colocated_meters: 10.0,
            proximity_radius_meters: 100.0,
        }
    }
}

impl DedupConfig {
    pub fn with_min_candidates(mut self, min_candidates: usize) -> Self {
        self.min_candidates = min_candidates;
        self
    }

    pub fn rule_for(&self, structure: StructureType) -> &DuplicateRule {
        self.structure_rules
            .get(&structure)
            .unwrap_or(&self.default_rule)
    }
}

/// A removed record and the retained record it was folded into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeDecision {
    pub subject_id: PropertyId,
    pub removed: PropertyId,
    pub retained: PropertyId,
    pub confidence: f64,
}

/// A pair above threshold that was kept because the subject floor forbade it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectedDuplicate {
    pub subject_id: PropertyId,
    pub kept: PropertyId,
    pub duplicate_of: PropertyId,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCount {
    pub subject_id: PropertyId,
    pub before: usize,
    pub after: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupOutcome {
    pub retained: Vec<Candidate>,
    pub merges: Vec<MergeDecision>,
    pub protected: Vec<ProtectedDuplicate>,
    pub counts: Vec<PoolCount>,
}

impl DedupOutcome {
    pub fn removed_count(&self) -> usize {
        self.merges.len()
    }

    /// Where each removed record went.
    pub fn merge_map(&self) -> BTreeMap<&PropertyId, &PropertyId> {
        self.merges
            .iter()
            .map(|merge| (&merge.removed, &merge.retained))
            .collect()
    }
}

struct PairMatch {
    left: usize,
    right: usize,
    confidence: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    config: DedupConfig,
}

impl Deduplicator {
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// Deduplicates every subject pool independently. Retained candidates keep
    /// their input order.
    pub fn deduplicate(&self, candidates: &[Candidate]) -> DedupOutcome {
        let mut pools: BTreeMap<&PropertyId, Vec<usize>> = BTreeMap::new();
        for (index, candidate) in candidates.iter().enumerate() {
            pools.entry(&candidate.subject_id).or_default().push(index);
        }

        let mut removed = HashSet::new();
        let mut merges = Vec::new();
        let mut protected = Vec::new();
        let mut counts = Vec::with_capacity(pools.len());

        for (subject_id, members) in &pools {
            let before = members.len();
            let after = self.collapse_pool(
                subject_id,
                candidates,
                members,
                &mut removed,
                &mut merges,
                &mut protected,
            );
            counts.push(PoolCount {
                subject_id: (*subject_id).clone(),
                before,
                after,
            });
        }

        let retained: Vec<Candidate> = candidates
            .iter()
            .enumerate()
            .filter(|(index, _)| !removed.contains(index))
            .map(|(_, candidate)| candidate.clone())
            .collect();

        info!(
            pools = counts.len(),
            before = candidates.len(),
            after = retained.len(),
            merges = merges.len(),
            protected = protected.len(),
            "deduplication complete"
        );

        DedupOutcome {
            retained,
            merges,
            protected,
            counts,
        }
    }

    fn collapse_pool(
        &self,
        subject_id: &PropertyId,
        candidates: &[Candidate],
        members: &[usize],
        removed: &mut HashSet<usize>,
        merges: &mut Vec<MergeDecision>,
        protected: &mut Vec<ProtectedDuplicate>,
    ) -> usize {
        let records: Vec<(usize, ComparableRecord<'_>)> = members
            .iter()
            .filter_map(|&index| {
                ComparableRecord::from_property(&candidates[index].property)
                    .map(|record| (index, record))
            })
            .collect();

        let mut matches = Vec::new();
        for (offset, (left_index, left)) in records.iter().enumerate() {
            for (right_index, right) in &records[offset + 1..] {
                let Some(confidence) = duplicate_confidence(left, right, &self.config) else {
                    continue;
                };
                if confidence >= self.config.rule_for(left.structure).threshold {
                    matches.push(PairMatch {
                        left: *left_index,
                        right: *right_index,
                        confidence,
                    });
                }
            }
        }

        matches.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.left.cmp(&b.left))
                .then_with(|| a.right.cmp(&b.right))
        });

        let mut remaining = members.len();
        let mut survivors: HashSet<usize> = HashSet::new();

        for pair in matches {
            if removed.contains(&pair.left) || removed.contains(&pair.right) {
                continue;
            }

            let (mut keep, mut drop) = choose_survivor(candidates, pair.left, pair.right);
            if survivors.contains(&drop) {
                if survivors.contains(&keep) {
                    continue;
                }
                std::mem::swap(&mut keep, &mut drop);
            }

            let kept_id = &candidates[keep].property.id;
            let drop_id = &candidates[drop].property.id;

            if remaining <= self.config.min_candidates {
                debug!(
                    subject_id = %subject_id,
                    kept = %drop_id,
                    duplicate_of = %kept_id,
                    confidence = pair.confidence,
                    "duplicate protected by subject floor"
                );
                protected.push(ProtectedDuplicate {
                    subject_id: subject_id.clone(),
                    kept: drop_id.clone(),
                    duplicate_of: kept_id.clone(),
                    confidence: pair.confidence,
                });
                continue;
            }

            removed.insert(drop);
            survivors.insert(keep);
            remaining -= 1;
            merges.push(MergeDecision {
                subject_id: subject_id.clone(),
                removed: drop_id.clone(),
                retained: kept_id.clone(),
                confidence: pair.confidence,
            });
        }

        remaining
    }
}

/// More populated fields wins; on a tie the smaller identifier survives.
fn choose_survivor(candidates: &[Candidate], left: usize, right: usize) -> (usize, usize) {
    let a = &candidates[left].property;
    let b = &candidates[right].property;
    let left_wins = a
        .completeness()
        .cmp(&b.completeness())
        .then_with(|| b.id.cmp(&a.id))
        .is_ge();
    if left_wins {
        (left, right)
    } else {
        (right, left)
    }
}
