use comp_engine::dedup::DedupOutcome;
use comp_engine::evaluation::{DistributionStats, EvaluationReport};
use comp_engine::ranking::{PoolCoverage, Ranking};

/// Coverage goes to stderr so piped CSV output stays parseable.
pub(crate) fn render_coverage(rankings: &[Ranking]) {
    let mut full = 0;
    let mut short = 0;
    let mut empty = 0;
    for ranking in rankings {
        match ranking.coverage {
            PoolCoverage::Full => full += 1,
            PoolCoverage::Short { .. } => short += 1,
            PoolCoverage::Empty => empty += 1,
        }
    }

    eprintln!(
        "Ranked {} subjects: {} full, {} short, {} empty",
        rankings.len(),
        full,
        short,
        empty
    );
    for ranking in rankings.iter().filter(|ranking| ranking.has_no_viable_comps()) {
        eprintln!("  - {}: every candidate scored 0", ranking.subject_id);
    }
}

pub(crate) fn render_dedup(outcome: &DedupOutcome) {
    println!("Deduplication summary");
    if outcome.merges.is_empty() {
        println!("No duplicates merged.");
    } else {
        println!("\nMerged records");
        for merge in &outcome.merges {
            println!(
                "- [{}] {} -> {} (confidence {:.3})",
                merge.subject_id, merge.removed, merge.retained, merge.confidence
            );
        }
    }

    if !outcome.protected.is_empty() {
        println!("\nProtected by candidate floor");
        for protected in &outcome.protected {
            println!(
                "- [{}] {} kept, duplicate of {} (confidence {:.3})",
                protected.subject_id, protected.kept, protected.duplicate_of, protected.confidence
            );
        }
    }

    println!("\nCandidates per subject");
    for count in &outcome.counts {
        println!("- {}: {} -> {}", count.subject_id, count.before, count.after);
    }
}

fn render_stats(name: &str, stats: Option<&DistributionStats>) {
    match stats {
        Some(stats) => println!(
            "{name}: mean {:.3}, median {:.3}, p25 {:.3}, p75 {:.3}, min {:.3}, max {:.3}, std {:.3}",
            stats.mean, stats.median, stats.p25, stats.p75, stats.min, stats.max, stats.std_dev
        ),
        None => println!("{name}: no labeled subjects"),
    }
}

pub(crate) fn render_evaluation(report: &EvaluationReport) {
    println!("Evaluation against appraiser selections");
    println!(
        "Labeled subjects: {} | Unlabeled: {}",
        report.labeled_subjects,
        report.unlabeled_count()
    );

    println!("\nPer subject");
    for metrics in &report.per_subject {
        println!(
            "- {}: precision@k {:.3}, recall {:.3} ({} of {} selections in {} ranked)",
            metrics.subject_id,
            metrics.precision_at_k,
            metrics.recall,
            metrics.hits,
            metrics.selected,
            metrics.ranked
        );
    }

    println!();
    render_stats("Precision@k", report.precision.as_ref());
    render_stats("Recall", report.recall.as_ref());
    if let Some(hit_rate) = report.hit_rate {
        println!("Hit rate: {:.1}%", hit_rate * 100.0);
    }

    println!("\nQuality labels (all ranked / hits)");
    for (all, hits) in report
        .label_distribution
        .iter()
        .zip(&report.hit_label_distribution)
    {
        println!("- {}: {} / {}", all.label_name, all.count, hits.count);
    }
}
