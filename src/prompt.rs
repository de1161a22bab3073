//! Prompt construction for the answer pipeline.

use thiserror::Error;

pub const CONTEXT_SLOT: &str = "{context}";
pub const QUESTION_SLOT: &str = "{question}";

/// Reply the model is told to give when the context does not cover the question.
pub const UNKNOWN_ANSWER: &str = "I don't know the answer";

/// Built-in template for the quiz bot.
pub const DEFAULT_TEMPLATE: &str = "\
You are Quick MCQ, an assistant that answers questions and writes multiple-choice quizzes \
from study material.
Answer only from the context below. If the context does not cover the question, reply \
exactly \"I don't know the answer\" instead of guessing.
When asked for MCQs, number every question, put each option on its own line as a), b), c) \
and d), and close each question with a line of the form \"Answer: <option>\".
Write complete sentences and keep the reply short but complete.

Context: {context}
Question: {question}

Reply only with material that addresses the question. Leave out speculation and unrelated detail.
Helpful answer:";

/// Separator placed between retrieved chunks.
pub const CHUNK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// A template with `{context}` and `{question}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let template = template.into();
        for slot in [CONTEXT_SLOT, QUESTION_SLOT] {
            if !template.contains(slot) {
                return Err(PromptError::MissingPlaceholder(slot));
            }
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fills both slots in one pass, so braces inside the context or question are left alone.
    pub fn render(&self, context: &str, question: &str) -> String {
        self.template
            .split(CONTEXT_SLOT)
            .map(|piece| piece.replace(QUESTION_SLOT, question))
            .collect::<Vec<_>>()
            .join(context)
    }

    /// Joins chunk texts in retrieval order and renders the prompt.
    pub fn render_chunks<'a, I>(&self, chunks: I, question: &str) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let context = chunks.into_iter().collect::<Vec<_>>().join(CHUNK_SEPARATOR);
        self.render(&context, question)
    }
}

/// The question the quiz page asks for `count` MCQs on `topic`.
pub fn mcq_question(count: usize, topic: &str) -> String {
    format!("prepare a {count} MCQs on {}", topic.trim())
}
