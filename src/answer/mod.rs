//! Answer orchestration.
//!
//! Drives the end-to-end question path: enhance and search, assemble the
//! context window, evaluate safety, pick a prompt template, and invoke
//! the LLM collaborator. The streaming variant yields content increments
//! and completes exactly once with either a final response or an error.

mod history;
mod prompts;

pub use history::{ConversationHistory, Exchange, HISTORY_CAPACITY};
pub use prompts::{PromptKind, render, select_prompt};

use crate::context::{AssembledContext, ContextAssembler};
use crate::core::Jurisdiction;
use crate::error::{CollaboratorError, Result};
use crate::llm::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, LanguageModel};
use crate::safety::{SafetyEvaluator, SafetyFlags};
use crate::search::{DEFAULT_TOP_K, HybridSearcher, RelevanceFactors, SearchOutcome, SearchResult};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// Source-document summary attached to answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// 1-based rank among the returned sources.
    pub source_number: usize,
    /// Composite relevance score of the underlying chunk.
    pub relevance_score: f32,
    /// Chunk class name.
    pub document_type: String,
    /// Jurisdiction tag.
    pub jurisdiction: Jurisdiction,
    /// Law-status tag.
    pub law_status: crate::core::LawStatus,
    /// Leading content excerpt.
    pub content_preview: String,
    /// Citations extracted from the chunk.
    pub citations: Vec<String>,
    /// Dates extracted from the chunk.
    pub dates: Vec<String>,
    /// Original file name, when recorded.
    pub file_name: Option<String>,
    /// Section identifier (policy number, section type, or module).
    pub section: Option<String>,
}

/// Search-quality metadata included on request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerMetadata {
    /// Top composite score.
    pub top_score: f32,
    /// Number of retrieved results.
    pub total_results: usize,
    /// Length of the assembled context in characters.
    pub context_length: usize,
    /// Jurisdiction preference the search ran with.
    pub jurisdiction: Jurisdiction,
}

/// A complete answer with its retrieval provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    /// The question asked.
    pub question: String,
    /// Generated answer text; empty when the collaborator failed.
    pub answer: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Safety flags.
    pub flags: SafetyFlags,
    /// The enhanced query the search ran with.
    pub enhanced_query: String,
    /// Citation chain of the admitted context.
    pub citation_chain: Vec<String>,
    /// Average per-factor relevance across results.
    pub relevance_breakdown: RelevanceFactors,
    /// Source documents backing the answer.
    pub source_documents: Vec<SourceDocument>,
    /// Template the answer was generated with.
    pub prompt_kind: PromptKind,
    /// Collaborator error, when generation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    /// Search-quality metadata, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnswerMetadata>,
}

/// One event of a streaming answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerEvent {
    /// A text increment from the generator.
    Content {
        /// The appended text.
        delta: String,
    },
    /// Terminal event: the full response.
    Complete {
        /// The finished answer.
        response: Box<AnswerResponse>,
    },
    /// Terminal event: generation failed.
    Error {
        /// The collaborator's error.
        message: String,
    },
}

/// Drives the end-to-end question path.
pub struct AnswerOrchestrator {
    searcher: Arc<HybridSearcher>,
    assembler: Arc<ContextAssembler>,
    evaluator: SafetyEvaluator,
    model: Arc<dyn LanguageModel>,
    history: Arc<Mutex<ConversationHistory>>,
    max_tokens: u32,
    temperature: f32,
    call_timeout: Duration,
}

impl AnswerOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    #[must_use]
    pub fn new(
        searcher: Arc<HybridSearcher>,
        assembler: Arc<ContextAssembler>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            searcher,
            assembler,
            evaluator: SafetyEvaluator::new(),
            model,
            history: Arc::new(Mutex::new(ConversationHistory::new())),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            call_timeout: crate::search::DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Overrides the safety evaluator (fixed reference year in tests).
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: SafetyEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Overrides generation parameters.
    #[must_use]
    pub fn with_generation(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Answers a question.
    ///
    /// Retrieval failures are returned as errors; a generation failure
    /// produces a successful response with an empty answer, zero
    /// confidence, the low-confidence flag, and the collaborator error
    /// in the diagnostic field.
    ///
    /// # Errors
    ///
    /// Returns an error when retrieval (enhancement, embedding, index)
    /// fails.
    pub async fn ask(
        &self,
        question: &str,
        jurisdiction: Jurisdiction,
        include_metadata: bool,
    ) -> Result<AnswerResponse> {
        let prepared = self.prepare(question, jurisdiction).await?;

        let completion = tokio::time::timeout(
            self.call_timeout,
            self.model
                .complete(&prepared.prompt, self.max_tokens, self.temperature),
        )
        .await
        .map_err(|_| {
            crate::error::Error::from(CollaboratorError::Timeout {
                operation: "completion".to_string(),
            })
        })
        .and_then(|r| r);

        let response = match completion {
            Ok(answer) => {
                if let Ok(mut history) = self.history.lock() {
                    history.push(question, &answer);
                }
                prepared.into_response(answer, None, include_metadata)
            }
            Err(err) => {
                warn!(error = %err, "generation failed");
                prepared.into_response(String::new(), Some(err.to_string()), include_metadata)
            }
        };

        Ok(response)
    }

    /// Answers a question as a stream of events.
    ///
    /// The stream yields zero or more `Content` increments and then
    /// exactly one terminal event, `Complete` or `Error`. Dropping the
    /// stream cancels generation; no event follows cancellation.
    ///
    /// # Errors
    ///
    /// Returns an error when retrieval fails before streaming starts.
    pub async fn ask_stream(
        &self,
        question: &str,
        jurisdiction: Jurisdiction,
        include_metadata: bool,
    ) -> Result<ReceiverStream<AnswerEvent>> {
        let prepared = self.prepare(question, jurisdiction).await?;

        let (tx, rx) = tokio::sync::mpsc::channel::<AnswerEvent>(16);
        let model = Arc::clone(&self.model);
        let history = Arc::clone(&self.history);
        let max_tokens = self.max_tokens;
        let temperature = self.temperature;
        let question_owned = question.to_string();

        tokio::spawn(async move {
            let stream = model
                .complete_stream(&prepared.prompt, max_tokens, temperature)
                .await;

            let mut stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    let _ = tx
                        .send(AnswerEvent::Error {
                            message: err.to_string(),
                        })
                        .await;
                    return;
                }
            };

            let mut answer = String::new();
            while let Some(piece) = stream.next().await {
                match piece {
                    Ok(delta) => {
                        answer.push_str(&delta);
                        if tx.send(AnswerEvent::Content { delta }).await.is_err() {
                            // Caller cancelled; emit nothing further.
                            return;
                        }
                    }
                    Err(err) => {
                        let _ = tx
                            .send(AnswerEvent::Error {
                                message: err.to_string(),
                            })
                            .await;
                        return;
                    }
                }
            }

            if let Ok(mut history) = history.lock() {
                history.push(&question_owned, &answer);
            }
            let response = prepared.into_response(answer, None, include_metadata);
            let _ = tx
                .send(AnswerEvent::Complete {
                    response: Box::new(response),
                })
                .await;
        });

        Ok(ReceiverStream::new(rx))
    }

    /// Returns a snapshot of the conversation history.
    #[must_use]
    pub fn history(&self) -> Vec<Exchange> {
        self.history.lock().map_or_else(|_| Vec::new(), |h| h.snapshot())
    }

    /// Clears the conversation history.
    pub fn clear_history(&self) {
        if let Ok(mut history) = self.history.lock() {
            history.clear();
        }
    }

    /// Runs retrieval, assembly, safety, and prompt construction.
    async fn prepare(&self, question: &str, jurisdiction: Jurisdiction) -> Result<PreparedAnswer> {
        let outcome = self
            .searcher
            .search(question, jurisdiction, DEFAULT_TOP_K)
            .await?;
        let context = self.assembler.assemble(&outcome.results);
        let assessment = self.evaluator.evaluate(question, &outcome);

        let has_history = self.history.lock().map_or(false, |h| !h.is_empty());
        let kind = select_prompt(question, has_history);
        let chat_history = if kind == PromptKind::FollowUp {
            self.history
                .lock()
                .map_or_else(|_| String::new(), |h| h.render_recent())
        } else {
            String::new()
        };

        let metrics = search_metrics(&outcome);
        let prompt = render(kind, &context.text, &metrics, &chat_history, question);
        debug!(prompt_kind = kind.as_str(), context_chars = context.len(), "prompt prepared");

        Ok(PreparedAnswer {
            question: question.to_string(),
            jurisdiction,
            outcome,
            context,
            assessment: (assessment.confidence, assessment.flags),
            kind,
            prompt,
        })
    }
}

/// Everything computed before the LLM call.
struct PreparedAnswer {
    question: String,
    jurisdiction: Jurisdiction,
    outcome: SearchOutcome,
    context: AssembledContext,
    assessment: (f32, SafetyFlags),
    kind: PromptKind,
    prompt: String,
}

impl PreparedAnswer {
    fn into_response(
        self,
        answer: String,
        diagnostic: Option<String>,
        include_metadata: bool,
    ) -> AnswerResponse {
        let (mut confidence, mut flags) = self.assessment;
        if diagnostic.is_some() {
            confidence = 0.0;
            flags.low_confidence = true;
        }

        let source_documents = source_documents(&self.outcome.results);
        let metadata = include_metadata.then(|| AnswerMetadata {
            top_score: self.outcome.results.first().map_or(0.0, |r| r.score),
            total_results: self.outcome.results.len(),
            context_length: self.context.len(),
            jurisdiction: self.jurisdiction,
        });

        AnswerResponse {
            question: self.question,
            answer,
            confidence,
            flags,
            enhanced_query: self.outcome.enhancement.enhanced.clone(),
            citation_chain: self.context.citation_chain.clone(),
            relevance_breakdown: self.outcome.relevance_breakdown(),
            source_documents,
            prompt_kind: self.kind,
            diagnostic,
            metadata,
        }
    }
}

/// Formats the search-quality metrics block for prompts.
fn search_metrics(outcome: &SearchOutcome) -> String {
    let breakdown = outcome.relevance_breakdown();
    let top_score = outcome.results.first().map_or(0.0, |r| r.score);
    format!(
        "- semantic: {:.3}\n- keyword: {:.3}\n- jurisdiction: {:.3}\n- law_status: {:.3}\n- document_type: {:.3}\n- top score: {top_score:.3}\n- total results: {}",
        breakdown.semantic,
        breakdown.keyword,
        breakdown.jurisdiction,
        breakdown.law_status,
        breakdown.document_type,
        outcome.results.len(),
    )
}

/// Builds the source-document summaries from the scored results.
fn source_documents(results: &[SearchResult]) -> Vec<SourceDocument> {
    results
        .iter()
        .take(DEFAULT_TOP_K)
        .enumerate()
        .map(|(i, result)| {
            let preview: String = result.content.chars().take(200).collect();
            let section = result
                .metadata
                .get("section_number")
                .or_else(|| result.metadata.get("section_type"))
                .or_else(|| result.metadata.get("module_title"))
                .and_then(|v| v.as_str())
                .map(ToString::to_string);
            let dates = result
                .metadata
                .get("dates")
                .and_then(crate::core::MetaValue::as_list)
                .map(<[String]>::to_vec)
                .unwrap_or_default();
            let file_name = result
                .metadata
                .get("file_name")
                .and_then(|v| v.as_str())
                .map(ToString::to_string);

            SourceDocument {
                source_number: i + 1,
                relevance_score: result.score,
                document_type: result.chunk_class.as_str().to_string(),
                jurisdiction: result.jurisdiction,
                law_status: result.law_status,
                content_preview: preview,
                citations: result.citation_chain.clone(),
                dates,
                file_name,
                section,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CitationGraph;
    use crate::core::{Chunk, ChunkClass, MetaValue};
    use crate::embedding::{DEFAULT_DIMENSIONS, EmbeddingClient, HashEmbedder};
    use crate::index::{MemoryIndex, VectorIndex, VectorRecord};
    use crate::llm::ScriptedModel;
    use crate::safety::SafetyEvaluator;

    async fn orchestrator_with(
        model: Arc<dyn LanguageModel>,
        chunks: Vec<(&str, &str)>,
    ) -> AnswerOrchestrator {
        let embedder = Arc::new(HashEmbedder::new(DEFAULT_DIMENSIONS));
        let index = Arc::new(MemoryIndex::new(DEFAULT_DIMENSIONS));

        for (id, content) in chunks {
            let chunk = Chunk::new("doc", 0, content.to_string(), 0..content.len(), ChunkClass::General);
            let mut metadata = chunk.metadata.flatten();
            metadata.insert("content".to_string(), MetaValue::from(content));
            metadata.insert("chunk_type".to_string(), MetaValue::from("general"));
            let vector = embedder.encode_one(content).await.unwrap();
            index
                .upsert(vec![VectorRecord {
                    id: id.to_string(),
                    vector,
                    metadata,
                }])
                .await
                .unwrap();
        }

        let searcher = Arc::new(HybridSearcher::new(index, embedder));
        let assembler = Arc::new(ContextAssembler::new(Arc::new(CitationGraph::new())));
        AnswerOrchestrator::new(searcher, assembler, model)
            .with_evaluator(SafetyEvaluator::with_reference_year(2026))
    }

    #[tokio::test]
    async fn test_ask_returns_answer_with_provenance() {
        let orchestrator = orchestrator_with(
            Arc::new(ScriptedModel::new("The statute requires a warrant.")),
            vec![("doc_0", "A warrant is required under 18 U.S.C. 2703.")],
        )
        .await;

        let response = orchestrator
            .ask("Is a warrant required?", Jurisdiction::Federal, true)
            .await
            .unwrap();

        assert_eq!(response.answer, "The statute requires a warrant.");
        assert!(response.confidence > 0.0);
        assert!(!response.source_documents.is_empty());
        assert!(response.metadata.is_some());
        assert!(response.diagnostic.is_none());
        assert_eq!(orchestrator.history().len(), 1);
    }

    #[tokio::test]
    async fn test_llm_failure_yields_low_confidence_response() {
        let orchestrator = orchestrator_with(
            Arc::new(ScriptedModel::failing("quota exhausted")),
            vec![("doc_0", "Some legal text.")],
        )
        .await;

        let response = orchestrator
            .ask("Any question?", Jurisdiction::Federal, false)
            .await
            .unwrap();

        assert!(response.answer.is_empty());
        assert!(response.confidence.abs() < 1e-6);
        assert!(response.flags.low_confidence);
        assert!(response.diagnostic.as_deref().unwrap_or("").contains("quota"));
        // Failed generations do not enter the history.
        assert!(orchestrator.history().is_empty());
    }

    #[tokio::test]
    async fn test_use_of_force_flag_set_regardless_of_content() {
        let orchestrator = orchestrator_with(
            Arc::new(ScriptedModel::new("answer")),
            vec![("doc_0", "Cafeteria menu for spring.")],
        )
        .await;

        let response = orchestrator
            .ask(
                "What are the legal requirements for use of force?",
                Jurisdiction::Federal,
                false,
            )
            .await
            .unwrap();
        assert!(response.flags.use_of_force);
    }

    #[tokio::test]
    async fn test_follow_up_template_used_with_history() {
        let orchestrator = orchestrator_with(
            Arc::new(ScriptedModel::new("first answer")),
            vec![("doc_0", "Relevant legal text about warrants.")],
        )
        .await;

        orchestrator
            .ask("What about warrants?", Jurisdiction::Federal, false)
            .await
            .unwrap();
        let response = orchestrator
            .ask("Also for vehicles?", Jurisdiction::Federal, false)
            .await
            .unwrap();
        assert_eq!(response.prompt_kind, PromptKind::FollowUp);
    }

    #[tokio::test]
    async fn test_ask_stream_yields_content_then_complete() {
        let orchestrator = orchestrator_with(
            Arc::new(ScriptedModel::new("streamed answer text")),
            vec![("doc_0", "Some indexed text.")],
        )
        .await;

        let mut stream = orchestrator
            .ask_stream("A question?", Jurisdiction::Federal, false)
            .await
            .unwrap();

        let mut content = String::new();
        let mut completions = 0;
        let mut errors = 0;
        while let Some(event) = stream.next().await {
            match event {
                AnswerEvent::Content { delta } => content.push_str(&delta),
                AnswerEvent::Complete { response } => {
                    completions += 1;
                    assert_eq!(response.answer, "streamed answer text");
                }
                AnswerEvent::Error { .. } => errors += 1,
            }
        }

        assert_eq!(content, "streamed answer text");
        assert_eq!(completions, 1);
        assert_eq!(errors, 0);
        assert_eq!(orchestrator.history().len(), 1);
    }

    #[tokio::test]
    async fn test_ask_stream_error_terminal() {
        let orchestrator = orchestrator_with(
            Arc::new(ScriptedModel::failing("model offline")),
            vec![("doc_0", "Some indexed text.")],
        )
        .await;

        let mut stream = orchestrator
            .ask_stream("A question?", Jurisdiction::Federal, false)
            .await
            .unwrap();

        let mut terminal_events = 0;
        while let Some(event) = stream.next().await {
            match event {
                AnswerEvent::Content { .. } => {}
                AnswerEvent::Complete { .. } => terminal_events += 1,
                AnswerEvent::Error { message } => {
                    terminal_events += 1;
                    assert!(message.contains("model offline"));
                }
            }
        }
        assert_eq!(terminal_events, 1);
    }

    #[tokio::test]
    async fn test_clear_history() {
        let orchestrator = orchestrator_with(
            Arc::new(ScriptedModel::new("a")),
            vec![("doc_0", "text")],
        )
        .await;
        orchestrator.ask("q?", Jurisdiction::Federal, false).await.unwrap();
        assert_eq!(orchestrator.history().len(), 1);
        orchestrator.clear_history();
        assert!(orchestrator.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_capped_at_ten() {
        let orchestrator = orchestrator_with(
            Arc::new(ScriptedModel::new("a")),
            vec![("doc_0", "text")],
        )
        .await;
        for i in 0..12 {
            orchestrator
                .ask(&format!("question {i}?"), Jurisdiction::Federal, false)
                .await
                .unwrap();
        }
        assert_eq!(orchestrator.history().len(), HISTORY_CAPACITY);
    }
}
