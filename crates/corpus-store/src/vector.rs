//! Cosine similarity over fixed-dimension embeddings.

/// Cosine similarity mapped into `[0, 1]` (`(cos + 1) / 2`), so a completely
/// unrelated pair scores `0.5` rather than `0.0` and a perfect match scores
/// `1.0`. Vectors of mismatched length are treated as maximally dissimilar
/// rather than panicking, since corpora should never mix embedding spaces
/// once [`corpus_core::CorpusConfig::assert_embedding_dim`] has run.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.5;
    }
    let cos = dot / (norm_a.sqrt() * norm_b.sqrt());
    ((cos.clamp(-1.0, 1.0)) + 1.0) / 2.0
}
