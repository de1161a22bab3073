//! Multiple-choice questions as structured data.
//!
//! Endpoints that honour a JSON schema are asked for [`mcq_schema`] directly. Everything else is
//! run through [`parse_mcqs`], which accepts JSON when the model produced it and otherwise reads
//! the plain-text layout the prompt asks for:
//!
//! ```text
//! 1. What is the capital of France?
//! a) Berlin
//! b) Paris
//! c) Rome
//! d) Madrid
//! Answer: b) Paris
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Options per question.
pub const OPTION_COUNT: usize = 4;

const OPTION_LETTERS: [char; OPTION_COUNT] = ['a', 'b', 'c', 'd'];
const ANSWER_MARKER: &str = "answer:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mcq {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl Mcq {
    /// Non-blank question and answer with exactly four non-blank options.
    pub fn is_well_formed(&self) -> bool {
        !self.question.trim().is_empty()
            && !self.answer.trim().is_empty()
            && self.options.len() == OPTION_COUNT
            && self.options.iter().all(|o| !o.trim().is_empty())
    }
}

/// Parsed questions plus how many candidates had to be dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct McqSet {
    pub mcqs: Vec<Mcq>,
    pub skipped: usize,
}

impl McqSet {
    fn push(&mut self, candidate: Option<Mcq>) {
        match candidate.filter(Mcq::is_well_formed) {
            Some(mcq) => self.mcqs.push(mcq),
            None => self.skipped += 1,
        }
    }
}

/// JSON schema for `{"mcqs": [{question, options[4], answer}]}`.
pub fn mcq_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "mcqs": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": { "type": "string" },
                        "options": {
                            "type": "array",
                            "items": { "type": "string" },
                            "minItems": OPTION_COUNT,
                            "maxItems": OPTION_COUNT
                        },
                        "answer": { "type": "string" }
                    },
                    "required": ["question", "options", "answer"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["mcqs"],
        "additionalProperties": false
    })
}

/// Reads MCQs out of raw model output, JSON first, then the numbered text layout.
pub fn parse_mcqs(output: &str) -> McqSet {
    if let Some(value) = extract_json(output) {
        if let Some(set) = from_json(value) {
            return set;
        }
    }
    from_text(output)
}

fn extract_json(output: &str) -> Option<Value> {
    let mut body = output.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // drop the language tag line
        body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
        body = body.trim_end().strip_suffix("```").unwrap_or(body).trim();
    }
    if let Ok(value) = serde_json::from_str(body) {
        return Some(value);
    }
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&body[start..=end]).ok()
}

fn from_json(value: Value) -> Option<McqSet> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("mcqs") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };
    let mut set = McqSet::default();
    for item in items {
        set.push(serde_json::from_value::<Mcq>(item).ok());
    }
    Some(set)
}

fn from_text(output: &str) -> McqSet {
    let starts = item_starts(output);
    // text before the first item number is preamble
    let mut blocks: Vec<&str> = starts
        .iter()
        .enumerate()
        .map(|(i, &(_, body))| {
            let end = starts.get(i + 1).map_or(output.len(), |&(at, _)| at);
            output[body..end].trim()
        })
        .collect();
    if blocks.is_empty() && output.to_ascii_lowercase().contains(ANSWER_MARKER) {
        blocks.push(output);
    }

    let mut set = McqSet::default();
    for block in blocks {
        set.push(parse_block(block));
    }
    set
}

/// `(number_at, text_at)` for every item number in `output`.
///
/// A number opens an item at the start of a line, or inline once the current item has a
/// non-empty answer (`... Answer: b 2. Next question?`).
fn item_starts(output: &str) -> Vec<(usize, usize)> {
    let lower = output.to_ascii_lowercase();
    let bytes = output.as_bytes();
    let mut starts: Vec<(usize, usize)> = Vec::new();

    for (at, byte) in bytes.iter().enumerate() {
        if !byte.is_ascii_digit() || (at > 0 && !bytes[at - 1].is_ascii_whitespace()) {
            continue;
        }
        let Some(len) = item_number_len(&output[at..]) else {
            continue;
        };
        let line_begin = output[..at].rfind('\n').map_or(0, |i| i + 1);
        let opens_item = output[line_begin..at].trim().is_empty()
            || starts
                .last()
                .is_some_and(|&(_, body)| has_answer(&lower[body..at]));
        if opens_item {
            starts.push((at, at + len));
        }
    }
    starts
}

/// Length of a leading `"12."` or `"12)"` followed by whitespace or the end.
fn item_number_len(text: &str) -> Option<usize> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &text[digits..];
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(digits + 1)
}

fn has_answer(lower_block: &str) -> bool {
    find_marker(lower_block, ANSWER_MARKER, 0)
        .is_some_and(|at| !lower_block[at + ANSWER_MARKER.len()..].trim().is_empty())
}

fn parse_block(block: &str) -> Option<Mcq> {
    // ASCII lowercasing keeps byte offsets aligned with `block`.
    let lower = block.to_ascii_lowercase();
    let answer_at = find_marker(&lower, ANSWER_MARKER, 0)?;
    let head = &lower[..answer_at];

    let mut cuts = Vec::with_capacity(OPTION_COUNT);
    let mut from = 0;
    for letter in OPTION_LETTERS {
        let at = find_marker(head, &format!("{letter})"), from)?;
        cuts.push(at);
        from = at + 2;
    }

    let question = block[..cuts[0]].trim().to_string();
    let options = (0..OPTION_COUNT)
        .map(|i| {
            let end = cuts.get(i + 1).copied().unwrap_or(answer_at);
            block[cuts[i] + 2..end].trim().to_string()
        })
        .collect();
    let answer = block[answer_at + ANSWER_MARKER.len()..]
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string();

    Some(Mcq {
        question,
        options,
        answer,
    })
}

/// First `marker` at or after `from` that starts the text or follows whitespace.
fn find_marker(haystack: &str, marker: &str, from: usize) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let mut offset = from;
    while offset <= haystack.len() {
        let at = offset + haystack.get(offset..)?.find(marker)?;
        if at == 0 || bytes[at - 1].is_ascii_whitespace() {
            return Some(at);
        }
        offset = at + marker.len();
    }
    None
}
