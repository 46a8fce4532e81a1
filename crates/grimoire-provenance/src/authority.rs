//! Source reliability over the fixed authority table.

use crate::model::SourceAttribution;

/// Relevance-weighted mean authority of the attributed sources.
///
/// Falls back to the plain mean when every score is zero, and to 0.0 when
/// nothing was attributed.
pub fn source_reliability(sources: &[SourceAttribution]) -> f64 {
    if sources.is_empty() {
        return 0.0;
    }
    let weight_of = |s: &SourceAttribution| if s.score.is_finite() { s.score.max(0.0) } else { 0.0 };
    let total: f64 = sources.iter().map(weight_of).sum();
    if total <= 0.0 {
        return sources.iter().map(|s| s.authority).sum::<f64>() / sources.len() as f64;
    }
    sources.iter().map(|s| s.authority * weight_of(s)).sum::<f64>() / total
}
