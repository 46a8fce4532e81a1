// Single source of truth for all default values.

// --- Paths ---
pub const DEFAULT_ENVIRONMENT: &str = "dev";
pub const DEFAULT_INGEST_ROOT: &str = "artifacts/ingest";
pub const DEFAULT_STATE_ROOT: &str = ".";

// --- Planner ---
pub const DEFAULT_PLAN_CACHE_TTL_SECS: u64 = 3_600; // 1 hour
pub const DEFAULT_RULES_TTL_MULTIPLIER: u64 = 4;
pub const DEFAULT_VOLATILE_TTL_DIVISOR: u64 = 2;
pub const DEFAULT_PLAN_CACHE_BACKEND: &str = "file";
pub const DEFAULT_SMALL_MODEL: &str = "small-instruct";
pub const DEFAULT_MEDIUM_MODEL: &str = "medium-instruct";
pub const DEFAULT_LARGE_MODEL: &str = "large-reasoning";
pub const DEFAULT_CODE_MODEL: &str = "code-instruct";

// --- Graph ---
pub const DEFAULT_GRAPH_ENABLED: bool = true;
pub const DEFAULT_GRAPH_CACHE_TTL_SECS: u64 = 3_600; // 1 hour
pub const DEFAULT_GRAPH_CACHE_CAPACITY: u64 = 16;
pub const DEFAULT_MAX_EXPANSIONS: usize = 10;
pub const DEFAULT_MIN_EXPANSION_CONFIDENCE: f64 = 0.5;

// --- Retrieval ---
pub const DEFAULT_TOP_K: usize = 8;
pub const DEFAULT_LEXICAL_SCAN_LIMIT: usize = 5_000;
pub const DEFAULT_VECTOR_OVERFETCH_MIN: usize = 10;
pub const DEFAULT_MAX_GRAPH_BOOST: f64 = 2.0;
pub const DEFAULT_DEDUP_SIGNATURE_TOKENS: usize = 24;

// --- Reranking ---
pub const DEFAULT_RERANKING_ENABLED: bool = true;
pub const DEFAULT_MAX_RESULTS_TO_RERANK: usize = 20;
pub const DEFAULT_RERANK_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_SIGNAL_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_SIGNAL_CACHE_TTL_SECS: u64 = 900; // 15 minutes

// --- Evaluation ---
pub const DEFAULT_EVALUATION_ENABLED: bool = true;
pub const DEFAULT_MIN_ACCURACY: f64 = 0.7;
pub const DEFAULT_MIN_OVERALL: f64 = 0.6;
pub const DEFAULT_MIN_RULES_ACCURACY: f64 = 0.8;
pub const DEFAULT_MAX_EVALUATION_TIME_MS: u64 = 1_500;
pub const DEFAULT_FALLBACK_ON_TIMEOUT: bool = true;
pub const DEFAULT_EVAL_CACHE_TTL_SECS: u64 = 1_800; // 30 minutes
pub const DEFAULT_EVAL_CACHE_CAPACITY: u64 = 2_000;
pub const DEFAULT_FAST_PATH_MAX_ANSWER_WORDS: usize = 40;

// --- Provenance ---
pub const DEFAULT_PROVENANCE_ENABLED: bool = true;
pub const DEFAULT_CONFIDENCE_VARIATION_WARNING: f64 = 0.5;

// --- Pipeline ---
pub const DEFAULT_REQUEST_DEADLINE_MS: u64 = 10_000;
pub const DEFAULT_QUERY_LOG_CAPACITY: usize = 1_000;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
