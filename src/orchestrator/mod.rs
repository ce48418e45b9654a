//! Report orchestrator - the sequencing state machine
//!
//! RETRIEVE → ASSEMBLE → RESEARCH → SECTIONS (×6, fan-out) → SUMMARY → DONE
//!
//! Retrieval and research complete before any section generation begins; all
//! six middle sections complete before the executive summary begins. Section
//! failures degrade to sentinels rather than halting the run.

use crate::agents::SectionAgent;
use crate::limiter::RateLimiter;
use crate::models::{
    GeneratedReport, ReportRequest, SectionKey, SectionOutcome, MIDDLE_SECTIONS,
};
use crate::openai::TextGenerator;
use crate::reference::ADVISORY_REFERENCE;
use crate::retrieval::{build_context_from_matches, RetrievalClient};
use crate::retry::{generate_with_retry, RetryPolicy};
use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

struct RetrievalHandle {
    client: Arc<RetrievalClient>,
    top_k: usize,
}

/// Coordinates one report run end to end. Stateless across runs; all
/// collaborators are injected.
pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    retrieval: Option<RetrievalHandle>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            generator,
            retrieval: None,
            limiter,
            retry,
        }
    }

    /// Enable the vector retrieval step. Without this, retrieval is skipped
    /// with a logged degradation.
    pub fn with_retrieval(mut self, client: Arc<RetrievalClient>, top_k: usize) -> Self {
        self.retrieval = Some(RetrievalHandle { client, top_k });
        self
    }

    /// Run the full pipeline for one request.
    ///
    /// Returns all seven section outcomes; only contract errors (a template
    /// invoked with an incomplete context) surface as `Err`. Cancellation
    /// aborts remaining steps and tags unfinished sections `Cancelled`.
    pub async fn generate_report(
        &self,
        request: &ReportRequest,
        cancel: &CancellationToken,
    ) -> crate::Result<GeneratedReport> {
        info!(
            company = request.company.as_deref().unwrap_or("unknown"),
            industry = request.industry.as_deref().unwrap_or("unknown"),
            "Starting report orchestration"
        );

        // === RETRIEVE ===
        let context_snippets = match &self.retrieval {
            Some(handle) => {
                let matches = handle
                    .client
                    .retrieve(request.research_query(), handle.top_k)
                    .await;
                info!(match_count = matches.len(), "Retrieval complete");
                build_context_from_matches(&matches)
            }
            None => {
                warn!("Retrieval endpoint or index not configured. Skipping retrieval.");
                String::new()
            }
        };

        // === ASSEMBLE ===
        // Fixed order: caller-supplied document text, retrieval snippets,
        // static advisory reference.
        let mut ephemeral_context = String::new();
        if let Some(deck) = request
            .pitch_deck_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        {
            ephemeral_context.push_str(&format!("Pitch Deck Text:\n{}\n\n", deck.trim()));
        }
        if !context_snippets.trim().is_empty() {
            ephemeral_context.push_str(&context_snippets);
            ephemeral_context.push('\n');
        }
        ephemeral_context.push_str(ADVISORY_REFERENCE);

        // === RESEARCH ===
        // Single attempt, no retry; failure degrades to a warning marker.
        if !cancel.is_cancelled() {
            let researcher = SectionAgent::researcher();
            let mut research_context = request.base_context();
            research_context.insert("retrieved_context".to_string(), ephemeral_context.clone());

            let research_result = {
                let _permit = self.limiter.acquire().await;
                researcher
                    .generate(self.generator.as_ref(), &research_context)
                    .await
            };

            match research_result {
                Ok(output) => {
                    info!("Research pass complete");
                    ephemeral_context.push_str(&format!("\nRESEARCHER FINDINGS:\n{}\n", output));
                }
                Err(e) if e.is_contract_error() => return Err(e),
                Err(e) => {
                    warn!("Research pass failed, continuing without findings: {}", e);
                    ephemeral_context.push_str("\n[Warning: research stage encountered an error.]\n");
                }
            }
        } else {
            warn!("Cancellation observed before research, skipping remaining steps");
        }

        // === SECTIONS (×6, fan-out) ===
        // The six middle sections are mutually independent: generate them as
        // parallel tasks, each through the retry wrapper, each call paced by
        // the shared limiter. join_all preserves the fixed section order.
        let mut section_context = request.base_context();
        section_context.insert("retrieved_context".to_string(), ephemeral_context);

        let section_futures = MIDDLE_SECTIONS.map(|key| {
            let context = section_context.clone();
            async move {
                let agent = SectionAgent::for_section(key);
                let agent = &agent;
                let context = &context;
                let outcome = generate_with_retry(&self.retry, key, cancel, || async move {
                    let _permit = self.limiter.acquire().await;
                    agent.generate(self.generator.as_ref(), context).await
                })
                .await?;
                Ok::<(SectionKey, SectionOutcome), crate::error::ReportError>((key, outcome))
            }
        });

        let middle: Vec<(SectionKey, SectionOutcome)> = join_all(section_futures)
            .await
            .into_iter()
            .collect::<crate::Result<_>>()?;

        // === SUMMARY ===
        // Input built purely from the six section outputs, never from the
        // research context: the summary reflects what was actually produced.
        let summary_block = build_summary_context(&middle);
        let mut summary_context = request.base_context();
        summary_context.insert("retrieved_context".to_string(), summary_block);

        let summary_agent = SectionAgent::for_section(SectionKey::ExecutiveSummary);
        let summary_agent = &summary_agent;
        let summary_context = &summary_context;
        let summary_outcome = generate_with_retry(
            &self.retry,
            SectionKey::ExecutiveSummary,
            cancel,
            || async move {
                let _permit = self.limiter.acquire().await;
                summary_agent
                    .generate(self.generator.as_ref(), summary_context)
                    .await
            },
        )
        .await?;

        // === DONE ===
        let mut sections = Vec::with_capacity(7);
        sections.push((SectionKey::ExecutiveSummary, summary_outcome));
        sections.extend(middle);

        let report = GeneratedReport::new(sections);
        let statuses: Vec<String> = report
            .statuses()
            .into_iter()
            .map(|(key, status)| format!("{}={:?}", key.storage_key(), status))
            .collect();
        info!(statuses = ?statuses, "Report generation complete");

        Ok(report)
    }
}

/// Concatenate the six middle-section outputs into the executive summary's
/// input context, labeled by document position.
pub fn build_summary_context(outcomes: &[(SectionKey, SectionOutcome)]) -> String {
    let mut block = String::new();
    for (key, outcome) in outcomes {
        block.push_str(&format!(
            "SECTION {}: {}\n{}\n\n",
            key.position(),
            key.summary_label(),
            outcome.text_for(*key)
        ));
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::models::{SectionStatus, FAILURE_SENTINEL_PREFIX};
    use crate::openai::{ChatMessage, Embedder, MockTextGenerator};
    use crate::retrieval::{InMemorySnippetStore, Neighbor, VectorIndex};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every prompt it receives and answers from a script: the
    /// first call gets the first response, and so on; the last response
    /// repeats once the script runs out.
    struct ScriptedGenerator {
        responses: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: responses.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl crate::openai::TextGenerator for ScriptedGenerator {
        async fn complete(&self, messages: &[ChatMessage]) -> crate::Result<String> {
            let prompt = messages
                .iter()
                .find(|m| m.role == "user")
                .map(|m| m.content.clone())
                .unwrap_or_default();
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len().min(self.responses.len().saturating_sub(1));
            calls.push(prompt);
            Ok(self.responses[index].clone())
        }
    }

    /// Fails permanently whenever the user prompt contains `marker`.
    struct SelectiveFailureGenerator {
        marker: &'static str,
    }

    #[async_trait]
    impl crate::openai::TextGenerator for SelectiveFailureGenerator {
        async fn complete(&self, messages: &[ChatMessage]) -> crate::Result<String> {
            let prompt = messages
                .iter()
                .find(|m| m.role == "user")
                .map(|m| m.content.as_str())
                .unwrap_or_default()
                .to_string();
            if prompt.contains(self.marker) {
                Err(ReportError::LlmError("quota exhausted".to_string()))
            } else {
                Ok("generated prose".to_string())
            }
        }
    }

    fn orchestrator(generator: Arc<dyn crate::openai::TextGenerator>) -> Orchestrator {
        Orchestrator::new(
            generator,
            Arc::new(RateLimiter::unthrottled()),
            RetryPolicy::immediate(3),
        )
    }

    fn acme_request() -> ReportRequest {
        ReportRequest {
            company: Some("Acme".to_string()),
            industry: Some("Fintech".to_string()),
            funding_stage: Some("Seed".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_all_sections_generated_without_retrieval_config() {
        let orchestrator = orchestrator(Arc::new(MockTextGenerator::new("solid prose")));
        let report = orchestrator
            .generate_report(&acme_request(), &CancellationToken::new())
            .await
            .unwrap();

        let map = report.section_map();
        assert_eq!(map.len(), 7);
        for (_, text) in &map {
            assert!(!text.contains(FAILURE_SENTINEL_PREFIX));
        }
        assert!(report.fully_generated());
    }

    #[tokio::test]
    async fn test_single_section_failure_leaves_other_six_intact() {
        // Only Section 3's prompt carries this heading.
        let generator = Arc::new(SelectiveFailureGenerator {
            marker: "Section 3: Financial Performance",
        });
        let orchestrator = orchestrator(generator);
        let report = orchestrator
            .generate_report(&acme_request(), &CancellationToken::new())
            .await
            .unwrap();

        let map = report.section_map();
        assert_eq!(map.len(), 7);
        assert_eq!(report.failed_count(), 1);

        let failed = map
            .get("financial_performance_investment_readiness")
            .unwrap();
        assert!(failed.contains(FAILURE_SENTINEL_PREFIX));
        assert!(failed.contains("Financial Performance & Investment Readiness"));

        for (key, text) in &map {
            if key != "financial_performance_investment_readiness" {
                assert!(!text.contains(FAILURE_SENTINEL_PREFIX), "section {} failed", key);
            }
        }
    }

    #[tokio::test]
    async fn test_summary_context_built_purely_from_section_outputs() {
        // Call order: research, six sections (any interleaving), summary last.
        let generator = Arc::new(ScriptedGenerator::new(&[
            "distinctive-research-findings",
            "section-prose",
            "section-prose",
            "section-prose",
            "section-prose",
            "section-prose",
            "section-prose",
            "summary-prose",
        ]));
        let orchestrator = orchestrator(generator.clone());
        let report = orchestrator
            .generate_report(&acme_request(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(report.fully_generated());

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 8);

        let summary_prompt = prompts.last().unwrap();
        assert!(summary_prompt.contains("SECTION 2: Market Opportunity"));
        assert!(summary_prompt.contains("SECTION 7: Final Recommendations"));
        assert!(summary_prompt.contains("section-prose"));
        // The raw research context never reaches the summary input.
        assert!(!summary_prompt.contains("distinctive-research-findings"));

        // Every middle-section prompt saw the research findings.
        for prompt in &prompts[1..7] {
            assert!(prompt.contains("RESEARCHER FINDINGS"));
            assert!(prompt.contains("distinctive-research-findings"));
        }
    }

    #[tokio::test]
    async fn test_research_failure_degrades_to_warning_marker() {
        let generator = Arc::new(SelectiveFailureGenerator {
            marker: "Research Objectives",
        });
        let orchestrator = orchestrator(generator);
        let report = orchestrator
            .generate_report(&acme_request(), &CancellationToken::new())
            .await
            .unwrap();

        // Research failing never fails the run; all seven still generate.
        assert!(report.fully_generated());
    }

    #[tokio::test]
    async fn test_retrieval_with_zero_matches_still_completes() {
        struct EmptyIndex;

        #[async_trait]
        impl VectorIndex for EmptyIndex {
            async fn find_neighbors(
                &self,
                _vector: &[f32],
                _top_k: usize,
            ) -> crate::Result<Vec<Neighbor>> {
                Ok(Vec::new())
            }
        }

        struct FixedEmbedder;

        #[async_trait]
        impl Embedder for FixedEmbedder {
            async fn embed(&self, _text: &str) -> crate::Result<Vec<f32>> {
                Ok(vec![0.0; 8])
            }
        }

        let retrieval = Arc::new(RetrievalClient::new(
            Arc::new(FixedEmbedder),
            Arc::new(EmptyIndex),
            Arc::new(InMemorySnippetStore::new()),
        ));

        let orchestrator = Orchestrator::new(
            Arc::new(MockTextGenerator::new("prose")),
            Arc::new(RateLimiter::unthrottled()),
            RetryPolicy::immediate(3),
        )
        .with_retrieval(retrieval, 5);

        let report = orchestrator
            .generate_report(&acme_request(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(report.fully_generated());
    }

    #[tokio::test]
    async fn test_cancellation_tags_sections_cancelled_not_failed() {
        let token = CancellationToken::new();
        token.cancel();

        let orchestrator = orchestrator(Arc::new(MockTextGenerator::new("prose")));
        let report = orchestrator
            .generate_report(&acme_request(), &token)
            .await
            .unwrap();

        for (key, status) in report.statuses() {
            assert_eq!(status, SectionStatus::Cancelled, "section {}", key);
        }
        for (_, text) in report.section_map() {
            assert!(!text.contains(FAILURE_SENTINEL_PREFIX));
        }
    }

    #[test]
    fn test_build_summary_context_labels_by_position() {
        let outcomes = vec![
            (
                SectionKey::MarketOpportunity,
                SectionOutcome::Generated {
                    text: "market text".to_string(),
                    attempts: 1,
                },
            ),
            (
                SectionKey::Recommendations,
                SectionOutcome::Failed {
                    sentinel: SectionKey::Recommendations.failure_sentinel(),
                    attempts: 3,
                },
            ),
        ];

        let block = build_summary_context(&outcomes);
        assert!(block.contains("SECTION 2: Market Opportunity\nmarket text"));
        // Failed sections contribute their sentinel, not nothing.
        assert!(block.contains("SECTION 7: Final Recommendations"));
        assert!(block.contains(FAILURE_SENTINEL_PREFIX));
    }
}
