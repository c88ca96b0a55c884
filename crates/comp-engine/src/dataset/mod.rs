//! Dataset boundary: schema validation, normalization and table output.

mod normalizer;
mod parser;
mod writer;

pub use writer::{write_rankings, RANKING_COLUMNS};

use crate::dedup::{DedupConfig, DedupOutcome, Deduplicator};
use crate::domain::{Candidate, Property, PropertyId, Subject};
use crate::evaluation::AppraiserSelections;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column `{column}`")]
    MissingColumn { column: &'static str },
    #[error("line {row}: missing value for `{column}`")]
    MissingValue { row: usize, column: &'static str },
    #[error("line {row}: unknown structure type `{value}`")]
    UnknownStructureType { row: usize, value: String },
    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: PropertyId },
    #[error("candidate `{candidate_id}` references unknown subject `{subject_id}`")]
    UnknownSubject {
        subject_id: PropertyId,
        candidate_id: PropertyId,
    },
}

/// Validated subjects and their candidate pools, held fully in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    subjects: Vec<Subject>,
    pools: BTreeMap<PropertyId, Vec<Property>>,
}

impl Dataset {
    /// Rejects duplicate identifiers and candidates of unlisted subjects.
    /// Subjects are kept in identifier order.
    pub fn new(
        mut subjects: Vec<Subject>,
        candidates: Vec<Candidate>,
    ) -> Result<Self, DatasetError> {
        let mut subject_ids = HashSet::new();
        for subject in &subjects {
            if !subject_ids.insert(subject.id().clone()) {
                return Err(DatasetError::DuplicateId {
                    kind: "subject",
                    id: subject.id().clone(),
                });
            }
        }
        subjects.sort_by(|a, b| a.id().cmp(b.id()));

        let mut pools: BTreeMap<PropertyId, Vec<Property>> = subjects
            .iter()
            .map(|subject| (subject.id().clone(), Vec::new()))
            .collect();
        let mut candidate_ids = HashSet::new();

        for candidate in candidates {
            if !candidate_ids.insert(candidate.property.id.clone()) {
                return Err(DatasetError::DuplicateId {
                    kind: "candidate",
                    id: candidate.property.id,
                });
            }
            match pools.get_mut(&candidate.subject_id) {
                Some(pool) => pool.push(candidate.property),
                None => {
                    return Err(DatasetError::UnknownSubject {
                        subject_id: candidate.subject_id,
                        candidate_id: candidate.property.id,
                    })
                }
            }
        }

        Ok(Self { subjects, pools })
    }

    pub fn from_readers<S: Read, C: Read>(
        subjects: S,
        candidates: C,
    ) -> Result<Self, DatasetError> {
        let subjects = parser::parse_subjects(subjects)?;
        let candidates = parser::parse_candidates(candidates)?;
        let dataset = Self::new(subjects, candidates)?;
        info!(
            subjects = dataset.subjects.len(),
            candidates = dataset.candidate_count(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        subjects: P,
        candidates: Q,
    ) -> Result<Self, DatasetError> {
        Self::from_readers(File::open(subjects)?, File::open(candidates)?)
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn subject(&self, id: &PropertyId) -> Option<&Subject> {
        self.subjects
            .binary_search_by(|subject| subject.id().cmp(id))
            .ok()
            .map(|index| &self.subjects[index])
    }

    /// The subject's candidate pool; empty for a subject without candidates.
    pub fn pool_for(&self, subject_id: &PropertyId) -> &[Property] {
        self.pools
            .get(subject_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn candidate_count(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }

    /// Candidates flattened back into (subject, property) records.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.pools
            .iter()
            .flat_map(|(subject_id, pool)| {
                pool.iter().map(move |property| Candidate {
                    subject_id: subject_id.clone(),
                    property: property.clone(),
                })
            })
            .collect()
    }

    /// Applies the deduplicator to every pool. Subjects are untouched.
    pub fn deduplicate(&self, config: &DedupConfig) -> (Dataset, DedupOutcome) {
        let outcome = Deduplicator::new(config.clone()).deduplicate(&self.candidates());

        let mut pools: BTreeMap<PropertyId, Vec<Property>> = self
            .pools
            .keys()
            .map(|subject_id| (subject_id.clone(), Vec::new()))
            .collect();
        for candidate in &outcome.retained {
            pools
                .entry(candidate.subject_id.clone())
                .or_default()
                .push(candidate.property.clone());
        }

        let dataset = Dataset {
            subjects: self.subjects.clone(),
            pools,
        };
        (dataset, outcome)
    }

    /// Loads ground truth, rejecting selections for subjects not in this dataset.
    pub fn load_selections<R: Read>(
        &self,
        reader: R,
    ) -> Result<AppraiserSelections, DatasetError> {
        let mut selections = AppraiserSelections::new();
        for (subject_id, candidate_id) in parser::parse_selections(reader)? {
            if self.subject(&subject_id).is_none() {
                return Err(DatasetError::UnknownSubject {
                    subject_id,
                    candidate_id,
                });
            }
            selections.insert(subject_id, candidate_id);
        }
        Ok(selections)
    }

    pub fn load_selections_from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<AppraiserSelections, DatasetError> {
        self.load_selections(File::open(path)?)
    }
}
