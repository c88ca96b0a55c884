use super::DatasetError;
use crate::ranking::Ranking;
use std::io::Write;

/// Writes every ranking as flat CSV rows, header first.
pub fn write_rankings<W: Write>(writer: W, rankings: &[Ranking]) -> Result<(), DatasetError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut wrote_any = false;

    for ranking in rankings {
        for row in ranking.rows() {
            csv_writer.serialize(row)?;
            wrote_any = true;
        }
    }

    // serde only emits the header alongside the first record.
    if !wrote_any {
        csv_writer.write_record(RANKING_COLUMNS)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub const RANKING_COLUMNS: [&str; 9] = [
    "subject_id",
    "candidate_id",
    "rank",
    "composite_score",
    "physical_score",
    "location_score",
    "temporal_score",
    "market_score",
    "quality_label",
];
