//! Approximate Nearest Neighbor (ANN) search using HNSW graphs.
//!
//! Exact search over a dense matrix is what the retrieval pipeline uses by default; an HNSW graph
//! is only built once the index crosses [`AnnConfig::min_vectors_for_ann`] records.
//!
//! ## Trade-offs
//!
//! - **Speed**: sub-linear query time on large corpora
//! - **Recall**: typically 95-99%, so a few true neighbours can be missed
//! - **Build time**: the graph is rebuilt every time an index is loaded

use hnsw_rs::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for ANN index construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnConfig {
    /// Number of neighbors per node (higher = better recall, slower build).
    /// Default: 16
    pub m: usize,
    /// Size of dynamic candidate list during construction.
    /// Default: 200
    pub ef_construction: usize,
    /// Size of dynamic candidate list during search.
    /// Default: 64
    pub ef_search: usize,
    /// Default: true
    pub enabled: bool,
    /// Below this many vectors exact search is used even if enabled.
    /// Default: 5000
    pub min_vectors_for_ann: usize,
}

impl Default for AnnConfig {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 64,
            enabled: true,
            min_vectors_for_ann: 5000,
        }
    }
}

impl AnnConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_min_vectors_for_ann(mut self, min: usize) -> Self {
        self.min_vectors_for_ann = min;
        self
    }

    pub fn with_ef_search(mut self, ef: usize) -> Self {
        self.ef_search = ef;
        self
    }

    /// Check if ANN should be used given the current dataset size.
    pub fn should_use_ann(&self, num_vectors: usize) -> bool {
        self.enabled && num_vectors >= self.min_vectors_for_ann
    }
}

/// One neighbour returned by the graph.
#[derive(Debug, Clone, Copy)]
pub struct AnnResult {
    /// Position of the vector in the index.
    pub position: usize,
    /// Cosine distance to the query (lower = closer).
    pub distance: f32,
}

/// HNSW graph over the index vectors, keyed by record position.
pub struct AnnIndex {
    config: AnnConfig,
    hnsw: Hnsw<'static, f32, DistCosine>,
    len: usize,
}

impl AnnIndex {
    /// Builds the graph, or returns `None` when `vectors` is too small for ANN to pay off.
    pub fn build(vectors: &[Vec<f32>], config: AnnConfig) -> Option<Self> {
        let nb_elem = vectors.len();
        // HNSW needs a handful of points to form layers at all.
        if !config.should_use_ann(nb_elem) || nb_elem < 10 {
            return None;
        }

        let nb_layer = 16.min((nb_elem as f32).ln().trunc() as usize).max(1);
        let hnsw = Hnsw::<f32, DistCosine>::new(
            config.m,
            nb_elem,
            nb_layer,
            config.ef_construction,
            DistCosine {},
        );
        let data: Vec<(&Vec<f32>, usize)> = vectors
            .iter()
            .enumerate()
            .map(|(idx, vec)| (vec, idx))
            .collect();
        hnsw.parallel_insert(&data);

        Some(Self {
            config,
            hnsw,
            len: nb_elem,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Up to `k` approximate neighbours, closest first.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<AnnResult> {
        let ef = self.config.ef_search.max(k);
        let mut results: Vec<AnnResult> = self
            .hnsw
            .search(query, k, ef)
            .into_iter()
            .map(|neighbour| AnnResult {
                position: neighbour.get_origin_id(),
                distance: neighbour.distance,
            })
            .collect();
        results.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| {
                let angle = i as f32 * 0.05;
                vec![angle.cos(), angle.sin(), 0.1]
            })
            .collect()
    }

    #[test]
    fn config_defaults() {
        let cfg = AnnConfig::default();
        assert_eq!(cfg.m, 16);
        assert!(cfg.enabled);
        assert!(!cfg.should_use_ann(10));
        assert!(cfg.should_use_ann(5000));
        assert!(!cfg.with_enabled(false).should_use_ann(1_000_000));
    }

    #[test]
    fn small_sets_skip_the_graph() {
        let cfg = AnnConfig::default().with_min_vectors_for_ann(1);
        assert!(AnnIndex::build(&grid(5), cfg).is_none());
        assert!(AnnIndex::build(&grid(100), AnnConfig::default()).is_none());
    }

    #[test]
    fn graph_finds_the_exact_match() {
        let vectors = grid(200);
        let ann = AnnIndex::build(&vectors, AnnConfig::default().with_min_vectors_for_ann(50))
            .expect("graph should be built");
        assert_eq!(ann.len(), 200);

        let hits = ann.search(&vectors[42], 3);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].position, 42);
        assert!(hits[0].distance < 1e-4);
    }
}
