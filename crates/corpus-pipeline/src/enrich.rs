//! The Enrichment Resolver (spec §4.4): at most three batched lookups over
//! the post-rerank hit list, one per source kind. Modeled as a tagged
//! match on `source_kind` rather than runtime type inspection, per the
//! spec's own redesign note (§9).
//!
//! Enrichment failure for one source kind degrades those hits to
//! unenriched (`detail = None`) rather than failing the pipeline (spec
//! §4.3 edge policies, §7).

use crate::context::PipelineContext;
use corpus_core::model::{EnrichmentDetail, Hit, ProvenanceSourceKind, SourceKind};

/// Attach enrichment detail to every hit in `evidence`, in place. Never
/// returns an error; per-source-kind lookup failures just leave the
/// affected hits unenriched.
pub async fn enrich(ctx: &PipelineContext, evidence: &mut [Hit]) {
    enrich_articles(ctx, evidence).await;
    enrich_scripts(ctx, evidence).await;
    enrich_case_resolutions(ctx, evidence).await;
}

async fn enrich_articles(ctx: &PipelineContext, evidence: &mut [Hit]) {
    let article_ids: Vec<String> = evidence
        .iter()
        .filter(|h| h.entry.key.source_kind == SourceKind::Article)
        .map(|h| h.entry.key.source_id.clone())
        .collect();
    if article_ids.is_empty() {
        return;
    }
    match ctx.article_store.provenance_for_many(&article_ids).await {
        Ok(by_article) => {
            for hit in evidence.iter_mut() {
                if hit.entry.key.source_kind != SourceKind::Article {
                    continue;
                }
                let Some(records) = by_article.get(&hit.entry.key.source_id) else {
                    continue;
                };
                let find = |kind: ProvenanceSourceKind| {
                    records
                        .iter()
                        .find(|r| r.source_kind == kind)
                        .map(|r| r.source_id.clone())
                };
                hit.detail = Some(EnrichmentDetail::Article {
                    linked_case_id: find(ProvenanceSourceKind::Case),
                    linked_conversation_id: find(ProvenanceSourceKind::Conversation),
                    linked_script_id: find(ProvenanceSourceKind::Script),
                });
            }
        }
        Err(error) => {
            tracing::warn!(%error, "article provenance enrichment failed; leaving hits unenriched");
        }
    }
}

async fn enrich_scripts(ctx: &PipelineContext, evidence: &mut [Hit]) {
    let script_ids: Vec<String> = evidence
        .iter()
        .filter(|h| h.entry.key.source_kind == SourceKind::Script)
        .map(|h| h.entry.key.source_id.clone())
        .collect();
    if script_ids.is_empty() {
        return;
    }
    match ctx.script_catalog.details_for(&script_ids).await {
        Ok(by_script) => {
            for hit in evidence.iter_mut() {
                if hit.entry.key.source_kind != SourceKind::Script {
                    continue;
                }
                if let Some(detail) = by_script.get(&hit.entry.key.source_id) {
                    hit.detail = Some(EnrichmentDetail::Script {
                        purpose: detail.purpose.clone(),
                        required_inputs: detail.required_inputs.clone(),
                    });
                }
            }
        }
        Err(error) => {
            tracing::warn!(%error, "script enrichment failed; leaving hits unenriched");
        }
    }
}

async fn enrich_case_resolutions(ctx: &PipelineContext, evidence: &mut [Hit]) {
    let case_ids: Vec<String> = evidence
        .iter()
        .filter(|h| h.entry.key.source_kind == SourceKind::CaseResolution)
        .map(|h| h.entry.key.source_id.clone())
        .collect();
    if case_ids.is_empty() {
        return;
    }
    match ctx.case_summaries.summaries_for(&case_ids).await {
        Ok(by_case) => {
            for hit in evidence.iter_mut() {
                if hit.entry.key.source_kind != SourceKind::CaseResolution {
                    continue;
                }
                if let Some(summary) = by_case.get(&hit.entry.key.source_id) {
                    hit.detail = Some(EnrichmentDetail::CaseResolution {
                        subject: summary.subject.clone(),
                        resolution: summary.resolution.clone(),
                        root_cause: summary.root_cause.clone(),
                    });
                }
            }
        }
        Err(error) => {
            tracing::warn!(%error, "case resolution enrichment failed; leaving hits unenriched");
        }
    }
}
