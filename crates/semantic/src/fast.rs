use fxhash::hash64;

/// Deterministic hashed bag-of-words embedding.
///
/// Every lower-cased alphanumeric token is hashed into one of `dim` buckets with a hash-derived
/// sign, so texts sharing words land close together under cosine similarity. Needs no model
/// files and produces identical vectors on every run.
pub(crate) fn hashed_embedding(text: &str, dim: usize) -> Vec<f32> {
    let mut v = vec![0f32; dim];
    if dim == 0 {
        return v;
    }
    for token in tokens(text) {
        let h = hash64(token.as_bytes());
        let idx = (h % dim as u64) as usize;
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        v[idx] += sign;
    }
    v
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{cosine, l2_normalize_in_place};

    fn embed(text: &str) -> Vec<f32> {
        let mut v = hashed_embedding(text, 384);
        l2_normalize_in_place(&mut v);
        v
    }

    #[test]
    fn same_text_same_vector() {
        assert_eq!(embed("Paris is the capital"), embed("Paris is the capital"));
    }

    #[test]
    fn case_and_punctuation_are_ignored() {
        assert_eq!(embed("Paris, France!"), embed("paris france"));
    }

    #[test]
    fn shared_words_score_higher() {
        let query = embed("What is the capital of France?");
        let related = embed("Paris is the capital of France.");
        let unrelated = embed("Photosynthesis converts light into chemical energy.");
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let v = hashed_embedding("  ... ", 16);
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
