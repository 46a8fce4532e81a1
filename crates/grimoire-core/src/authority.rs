//! Fixed source-authority table keyed by source identifier.

/// Authority weights, most specific identifiers first.
pub const SOURCE_AUTHORITY: &[(&str, f64)] = &[
    ("unearthed_arcana", 0.5),
    ("homebrew", 0.3),
    ("errata", 0.9),
    ("supplement", 0.6),
    ("phb", 1.0),
    ("dmg", 0.95),
    ("mm", 0.9),
    ("xge", 0.85),
    ("tce", 0.85),
    ("srd", 0.8),
];

/// Weight for sources not in the table.
pub const DEFAULT_SOURCE_AUTHORITY: f64 = 0.5;

/// Authority of a source identifier. Matches whole `_`-delimited segments, so
/// `"phb-2024"` is `phb` but `"summary"` is not `mm`.
pub fn source_authority(source: &str) -> f64 {
    let normalized: String = source
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let padded = format!("_{normalized}_");
    SOURCE_AUTHORITY
        .iter()
        .find(|(key, _)| padded.contains(&format!("_{key}_")))
        .map_or(DEFAULT_SOURCE_AUTHORITY, |(_, weight)| *weight)
}
