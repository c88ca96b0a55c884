use chrono::{Duration, NaiveDate};
use comp_engine::dataset::{write_rankings, Dataset};
use comp_engine::domain::{Candidate, Property, PropertyId, StructureType, Subject};
use comp_engine::pipeline::{pool, CompPipeline, PipelineConfig};
use comp_engine::ranking::{PoolCoverage, QualityLabel};
use comp_engine::scoring::ScoringWeights;
use std::io::Write;
use std::sync::Arc;

const SUBJECT_LAT: f64 = 44.2312;
const SUBJECT_LON: f64 = -76.4860;
const KM_PER_DEGREE_LAT: f64 = 111.195;

fn effective_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid effective date")
}

fn subject() -> Subject {
    let mut property = Property::bare("S-1");
    property.structure_type = Some(StructureType::Detached);
    property.gla_sqft = Some(1_800.0);
    property.bedrooms = Some(3);
    property.bathrooms = Some(2.0);
    property.lot_size_sqft = Some(5_000.0);
    property.levels = Some(2.0);
    property.year_built = Some(1995);
    property.latitude = Some(SUBJECT_LAT);
    property.longitude = Some(SUBJECT_LON);
    property.city = Some("kingston".to_string());
    property.sale_price = Some(540_000.0);
    Subject {
        property,
        effective_date: Some(effective_date()),
    }
}

fn north_of_subject(km: f64) -> f64 {
    SUBJECT_LAT + km / KM_PER_DEGREE_LAT
}

/// Same structure, 0.2 km away, sold 10 days ago, same price per sqft.
fn candidate_a() -> Property {
    let mut property = subject().property;
    property.id = PropertyId::new("A");
    property.latitude = Some(north_of_subject(0.2));
    property.sale_date = Some(effective_date() - Duration::days(10));
    property
}

/// Different structure, 4 km away, sold 400 days ago.
fn candidate_b() -> Property {
    let mut property = subject().property;
    property.id = PropertyId::new("B");
    property.structure_type = Some(StructureType::Condominium);
    property.latitude = Some(north_of_subject(4.0));
    property.sale_date = Some(effective_date() - Duration::days(400));
    property.sale_price = Some(720_000.0);
    property
}

#[test]
fn close_recent_match_outranks_distant_stale_mismatch() {
    let pipeline = CompPipeline::default();
    let ranking = pipeline.rank_subject(&subject(), &[candidate_b(), candidate_a()]);

    let ids: Vec<&str> = ranking.candidate_ids().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);

    let a = &ranking.entries[0];
    assert!(
        (95.0..=100.0).contains(&a.composite),
        "A composite {}",
        a.composite
    );
    assert_eq!(a.quality, QualityLabel::Excellent);
    assert_eq!(a.features.days_since_sale, Some(10));
    assert_eq!(a.features.sold_after_effective, Some(false));
    let distance = a.features.distance_km.expect("distance recorded");
    assert!((distance - 0.2).abs() < 0.01, "distance {distance}");

    let b = &ranking.entries[1];
    assert!(b.composite < 40.0, "B composite {}", b.composite);
    assert_eq!(b.quality, QualityLabel::Poor);
    assert!(b.features.physical.value <= 20.0);

    assert_eq!(ranking.coverage, PoolCoverage::Short { available: 2 });
    assert!(ranking.is_short());
}

#[test]
fn ranking_length_is_min_of_k_and_pool() {
    let pipeline = CompPipeline::default();
    let subject = subject();

    for pool_size in 0..6 {
        let pool: Vec<Property> = (0..pool_size)
            .map(|n| {
                let mut property = candidate_a();
                property.id = PropertyId::new(format!("C-{n}"));
                property.gla_sqft = Some(1_700.0 + 50.0 * n as f64);
                property
            })
            .collect();
        let ranking = pipeline.rank_subject(&subject, &pool);
        assert_eq!(ranking.entries.len(), pool_size.min(3));
        assert_eq!(ranking.is_empty_pool(), pool_size == 0);
    }
}

#[test]
fn composites_are_stable_across_runs_and_weightings() {
    let first = CompPipeline::default().rank_subject(&subject(), &[candidate_a(), candidate_b()]);
    let second = CompPipeline::default().rank_subject(&subject(), &[candidate_a(), candidate_b()]);
    assert_eq!(
        first.entries[0].composite.to_bits(),
        second.entries[0].composite.to_bits()
    );

    let location_only = CompPipeline::new(PipelineConfig {
        weights: ScoringWeights::new(0.0, 1.0, 0.0, 0.0).expect("valid weights"),
        ..PipelineConfig::default()
    });
    let ranking = location_only.rank_subject(&subject(), &[candidate_a(), candidate_b()]);
    for entry in &ranking.entries {
        assert_eq!(entry.composite, entry.features.location.value);
    }
}

#[test]
fn missing_attributes_degrade_without_failing() {
    let mut sparse = Property::bare("sparse");
    sparse.structure_type = Some(StructureType::Detached);

    let ranking = CompPipeline::default().rank_subject(&subject(), &[sparse]);
    let entry = &ranking.entries[0];

    assert!(entry.features.is_degraded());
    assert_eq!(entry.features.temporal.value, 50.0);
    assert!(entry.features.temporal.defaulted);
    assert_eq!(entry.features.location.value, 50.0);
    assert_eq!(entry.features.market.value, 50.0);
}

#[tokio::test]
async fn csv_round_trip_through_worker_pool() {
    let dir = tempfile::tempdir().expect("temp dir");
    let subjects_path = dir.path().join("subjects.csv");
    let candidates_path = dir.path().join("candidates.csv");

    let mut subjects = std::fs::File::create(&subjects_path).expect("subjects file");
    writeln!(
        subjects,
        "id,effective_date,structure_type,gla_sqft,bedrooms,bathrooms,latitude,longitude,city,sale_price\n\
S-1,2025-03-01,Detached,1800,3,2:0,44.2312,-76.4860,Kingston,\"$540,000\"\n\
S-2,03/15/2025,Condo Apartment,900,2,1,44.2300,-76.4800,Kingston,"
    )
    .expect("write subjects");

    let mut candidates = std::fs::File::create(&candidates_path).expect("candidates file");
    writeln!(
        candidates,
        "subject_id,id,structure_type,gla_sqft,bedrooms,bathrooms,sale_date,latitude,longitude,city,sale_price\n\
S-1,A,Detached,1800,3,2,2025-02-19,44.2330,-76.4860,Kingston,540000\n\
S-1,B,Condominium,1800,3,2,2024-01-26,44.2672,-76.4860,Kingston,720000\n\
S-1,C,Detached,2100,4,3,2024-12-01,44.2400,-76.4900,Kingston,610000"
    )
    .expect("write candidates");

    let dataset =
        Arc::new(Dataset::from_paths(&subjects_path, &candidates_path).expect("dataset loads"));
    let pipeline = Arc::new(CompPipeline::default());

    let rankings = pool::rank_concurrently(Arc::clone(&pipeline), Arc::clone(&dataset), 2)
        .await
        .expect("pool ranks");
    assert_eq!(rankings, pipeline.rank_dataset(&dataset));

    assert_eq!(rankings.len(), 2);
    assert_eq!(rankings[0].candidate_ids().next().map(|id| id.as_str()), Some("A"));
    assert_eq!(rankings[0].entries.len(), 3);
    assert!(rankings[1].is_empty_pool());

    let output_path = dir.path().join("rankings.csv");
    write_rankings(
        std::fs::File::create(&output_path).expect("output file"),
        &rankings,
    )
    .expect("rankings written");
    let written = std::fs::read_to_string(&output_path).expect("read output");
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("subject_id,candidate_id,rank,composite_score,physical_score,location_score,temporal_score,market_score,quality_label")
    );
    assert!(lines
        .next()
        .is_some_and(|row| row.starts_with("S-1,A,1,") && row.ends_with(",Excellent")));
    assert_eq!(lines.count(), 2);
}

#[test]
fn candidates_must_belong_to_listed_subjects() {
    let result = Dataset::new(
        vec![subject()],
        vec![Candidate {
            subject_id: PropertyId::new("S-404"),
            property: candidate_a(),
        }],
    );
    assert!(result.is_err());
}
