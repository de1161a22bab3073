/// Scales `v` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

/// Cosine similarity; `0.0` when either side is a zero vector or the lengths differ.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0f32, 0f32, 0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

/// Averages token embeddings of shape `[batch, seq, hidden]` over positions whose attention mask
/// is set, producing one `hidden`-sized vector per batch row.
pub(crate) fn mean_pool(
    token_embeddings: &[f32],
    attention_mask: &[i64],
    batch: usize,
    seq: usize,
    hidden: usize,
) -> Vec<Vec<f32>> {
    let mut pooled = Vec::with_capacity(batch);
    for b in 0..batch {
        let mut acc = vec![0f32; hidden];
        let mut count = 0usize;
        for s in 0..seq {
            if attention_mask.get(b * seq + s).copied().unwrap_or(0) == 0 {
                continue;
            }
            let offset = (b * seq + s) * hidden;
            if let Some(row) = token_embeddings.get(offset..offset + hidden) {
                for (a, x) in acc.iter_mut().zip(row) {
                    *a += x;
                }
                count += 1;
            }
        }
        if count > 0 {
            let inv = 1.0 / count as f32;
            acc.iter_mut().for_each(|a| *a *= inv);
        }
        pooled.push(acc);
    }
    pooled
}
