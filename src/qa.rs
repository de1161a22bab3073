//! Retrieval-augmented answering over a loaded index.

use std::sync::Arc;

use generate::{GenerationRequest, Generator, Mcq, ResponseSchema, mcq_schema, parse_mcqs};
use index::{SearchHit, VectorIndex};
use semantic::Embedder;
use serde::Serialize;
use tracing::{debug, warn};

use crate::prompt::{PromptTemplate, mcq_question};
use crate::{MetricsSpan, PipelineError, RagConfig};

/// Returned in place of an empty generation.
pub const NO_ANSWER: &str = "No answer found";

/// Upper bound on MCQs per request.
pub const MAX_MCQS: usize = 20;

const DEFAULT_K: usize = 2;

/// Generated answer and the chunks it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SearchHit>,
}

/// Structured quiz produced for a topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McqAnswer {
    /// Question sent through retrieval, e.g. "prepare a 5 MCQs on optics".
    pub question: String,
    pub mcqs: Vec<Mcq>,
    /// Candidate items dropped for not having four options and an answer.
    pub skipped: usize,
    /// Raw model output.
    pub answer: String,
    pub sources: Vec<SearchHit>,
}

/// Question answering over a read-only [`VectorIndex`].
///
/// Cheap to share: every component sits behind an `Arc` and no method takes `&mut self`.
pub struct RetrievalQa {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    prompt: PromptTemplate,
    k: usize,
}

impl RetrievalQa {
    /// Fails if `index` was built with a different embedding model than `embedder`.
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, PipelineError> {
        index.ensure_model(embedder.model_id())?;
        Ok(Self {
            index,
            embedder,
            generator,
            prompt: PromptTemplate::default(),
            k: DEFAULT_K,
        })
    }

    /// [`RetrievalQa::new`] with `k` and the prompt taken from `cfg`.
    pub fn from_config(
        cfg: &RagConfig,
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, PipelineError> {
        Ok(Self::new(index, embedder, generator)?
            .with_k(cfg.retrieval.k)
            .with_prompt(cfg.prompt()?))
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k.max(1);
        self
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// The `min(k, len)` chunks closest to `question`.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchHit>, PipelineError> {
        let span = MetricsSpan::start();
        let query = self.embedder.embed_query(question).await?;
        let hits = self.index.search(&query, self.k)?;
        if let Some(span) = span {
            span.record_retrieval(hits.len());
        }
        debug!(
            k = self.k,
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "retrieval_completed"
        );
        Ok(hits)
    }

    /// Answers `question` from the retrieved context.
    pub async fn ask(&self, question: &str) -> Result<Answer, PipelineError> {
        let question = non_blank(question, "query")?;
        let sources = self.retrieve(question).await?;
        let answer = self.complete(GenerationRequest::new(self.render(question, &sources))).await?;
        let answer = if answer.is_empty() {
            NO_ANSWER.to_string()
        } else {
            answer
        };
        Ok(Answer { answer, sources })
    }

    /// Asks for `count` MCQs on `topic` and parses them.
    pub async fn generate_mcqs(&self, topic: &str, count: usize) -> Result<McqAnswer, PipelineError> {
        let topic = non_blank(topic, "topic")?;
        if !(1..=MAX_MCQS).contains(&count) {
            return Err(PipelineError::InvalidRequest(format!(
                "count must be between 1 and {MAX_MCQS}"
            )));
        }
        let question = mcq_question(count, topic);
        let sources = self.retrieve(&question).await?;

        let mut request = GenerationRequest::new(self.render(&question, &sources));
        if self.generator.supports_json_schema() {
            request = request.with_schema(ResponseSchema::new("mcq_set", mcq_schema()));
        }
        let answer = self.complete(request).await?;

        let parsed = parse_mcqs(&answer);
        if parsed.skipped > 0 {
            warn!(
                skipped = parsed.skipped,
                parsed = parsed.mcqs.len(),
                "mcq_items_dropped"
            );
        }
        Ok(McqAnswer {
            question,
            mcqs: parsed.mcqs,
            skipped: parsed.skipped,
            answer,
            sources,
        })
    }

    fn render(&self, question: &str, sources: &[SearchHit]) -> String {
        self.prompt
            .render_chunks(sources.iter().map(|hit| hit.chunk.text.as_str()), question)
    }

    async fn complete(&self, request: GenerationRequest) -> Result<String, PipelineError> {
        let span = MetricsSpan::start();
        let result = self.generator.generate(&request).await;
        if let Some(span) = span {
            span.record_generation(result.as_ref().map(|_| ()));
        }
        Ok(result?)
    }
}

fn non_blank<'a>(value: &'a str, field: &str) -> Result<&'a str, PipelineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InvalidRequest(format!(
            "{field} must not be blank"
        )));
    }
    Ok(trimmed)
}
