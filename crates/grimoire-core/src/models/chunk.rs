use serde::{Deserialize, Serialize};

/// A retrieved document fragment.
///
/// `score` is rewritten at every pipeline stage (lexical, graph-boosted,
/// reranked); each stage works on its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocChunk {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub source: String,
    /// Relevance score in [0.0, 1.0] after normalization.
    pub score: f64,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl DocChunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source: source.into(),
            score: 0.0,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Look up a string metadata field.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Sort chunks best-first: score descending, then id for a stable order.
pub fn sort_best_first(chunks: &mut [DocChunk]) {
    chunks.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
}

/// Clamp a score into `[0, 1]`; NaN and infinities become 0.
pub fn sanitize_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Rescale scores so the maximum is at most 1.0. Scores already in range are
/// untouched; non-finite scores become 0.
pub fn normalize_scores(chunks: &mut [DocChunk]) {
    for chunk in chunks.iter_mut().filter(|c| !c.score.is_finite()) {
        chunk.score = 0.0;
    }
    let max = chunks.iter().map(|c| c.score).fold(0.0_f64, f64::max);
    if max > 1.0 {
        for chunk in chunks.iter_mut() {
            chunk.score /= max;
        }
    }
    for chunk in chunks.iter_mut() {
        chunk.score = chunk.score.clamp(0.0, 1.0);
    }
}
