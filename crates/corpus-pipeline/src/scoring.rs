//! The user-facing `final_score` blend (spec §4.5): similarity, rerank
//! score, stored confidence, freshness, and a usage-derived learning term.
//! Raw rerank score is retained on the `Hit` for the execution record but
//! is never itself the public confidence (spec §9 Open Questions).

use chrono::{DateTime, Utc};
use corpus_core::config::CorpusConfig;
use corpus_core::model::Hit;

/// Saturating constant in the usage->learning-score curve
/// (`usage_count / (usage_count + k)`), per spec §4.5's example formula.
const LEARNING_SATURATION_K: f32 = 5.0;

/// Squash a provider-specific, potentially unbounded rerank score into
/// `[0,1]` via a logistic curve, so it can be blended alongside terms that
/// are already unit-interval (spec §4.5: "rerank score (normalized;
/// substitute the similarity if absent)").
fn normalized_rerank_component(hit: &Hit) -> f32 {
    match hit.rerank_score {
        Some(score) => 1.0 / (1.0 + (-score).exp()),
        None => hit.similarity,
    }
}

/// Compute the §4.5 blended score for one hit.
#[must_use]
pub fn final_score(hit: &Hit, config: &CorpusConfig, now: DateTime<Utc>) -> f32 {
    let weights = &config.score_weights;
    let rerank_component = normalized_rerank_component(hit);
    let age_days = (now - hit.entry.updated_at).num_seconds() as f32 / 86_400.0;
    let freshness = if config.freshness_max_age_days > 0.0 {
        (1.0 - age_days.max(0.0) / config.freshness_max_age_days).clamp(0.0, 1.0)
    } else {
        0.0
    };
    #[allow(clippy::cast_precision_loss)]
    let usage = hit.entry.usage_count as f32;
    let learning = usage / (usage + LEARNING_SATURATION_K);

    let score = weights.similarity * hit.similarity
        + weights.rerank * rerank_component
        + weights.confidence * hit.entry.confidence
        + weights.freshness * freshness
        + weights.learning * learning;
    score.clamp(0.0, 1.0)
}

/// Compute and attach `final_score` on every hit in `evidence`, then
/// reorder descending by it, tie-breaking on ascending `source_id` (spec
/// §4.5, P2).
pub fn apply_and_sort(evidence: &mut [Hit], config: &CorpusConfig, now: DateTime<Utc>) {
    for hit in evidence.iter_mut() {
        hit.final_score = Some(final_score(hit, config, now));
    }
    evidence.sort_by(|a, b| {
        b.final_score
            .unwrap_or(0.0)
            .partial_cmp(&a.final_score.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entry.key.source_id.cmp(&b.entry.key.source_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::model::{CorpusEntry, EntryKey, SourceKind};

    fn hit(source_id: &str, similarity: f32, confidence: f32, usage_count: u64, age_days: i64) -> Hit {
        Hit {
            entry: CorpusEntry {
                key: EntryKey::new(SourceKind::Article, source_id),
                title: "t".into(),
                content: "c".into(),
                category: None,
                module: None,
                tags: vec![],
                embedding: vec![1.0],
                confidence,
                usage_count,
                updated_at: Utc::now() - chrono::Duration::days(age_days),
            },
            similarity,
            rerank_score: None,
            final_score: None,
            detail: None,
        }
    }

    #[test]
    fn final_score_is_clamped_to_unit_interval() {
        let config = CorpusConfig::default();
        let now = Utc::now();
        let h = hit("A", 1.0, 1.0, 1_000_000, 0);
        let score = final_score(&h, &config, now);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn fresher_and_more_used_entries_score_higher_all_else_equal() {
        let config = CorpusConfig::default();
        let now = Utc::now();
        let fresh_popular = hit("A", 0.8, 0.8, 200, 1);
        let stale_unused = hit("B", 0.8, 0.8, 0, 400);
        assert!(final_score(&fresh_popular, &config, now) > final_score(&stale_unused, &config, now));
    }

    #[test]
    fn missing_rerank_score_falls_back_to_similarity() {
        let config = CorpusConfig::default();
        let now = Utc::now();
        let mut with_rerank = hit("A", 0.5, 0.5, 0, 0);
        with_rerank.rerank_score = Some(0.0);
        let without_rerank = hit("A", 0.5, 0.5, 0, 0);
        assert!((final_score(&with_rerank, &config, now) - final_score(&without_rerank, &config, now)).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_rerank_score_is_normalized_not_saturated() {
        let config = CorpusConfig::default();
        let now = Utc::now();
        let mut unbounded = hit("A", 0.5, 0.5, 0, 0);
        unbounded.rerank_score = Some(8.5);
        let score = final_score(&unbounded, &config, now);
        assert!(score < 1.0, "raw out-of-range rerank score must not saturate final_score to 1.0, got {score}");
        assert!(score > 0.5, "a large positive rerank score should still pull the blend upward");
    }

    #[test]
    fn apply_and_sort_orders_descending_with_source_id_tiebreak() {
        let config = CorpusConfig::default();
        let now = Utc::now();
        let mut evidence = vec![hit("Z", 0.5, 0.5, 0, 0), hit("A", 0.5, 0.5, 0, 0)];
        apply_and_sort(&mut evidence, &config, now);
        assert_eq!(evidence[0].entry.key.source_id, "A");
        assert_eq!(evidence[1].entry.key.source_id, "Z");
        assert!(evidence[0].final_score.is_some());
    }
}
