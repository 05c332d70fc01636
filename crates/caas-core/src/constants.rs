/// Characters per estimated token. Token costs round up, so the estimate never undercounts.
pub const CHARS_PER_TOKEN: usize = 4;

/// Starting weight for a section that does not carry its own.
pub const DEFAULT_BASE_WEIGHT: f64 = 1.0;

/// Body contains a fenced or indented code block.
pub const CODE_BLOCK_BONUS: f64 = 0.20;

/// Body contains a "Definitions"-style heading line.
pub const DEFINITIONS_HEADING_BONUS: f64 = 0.30;

/// Body contains an importance marker ("critical", "must", "required").
pub const IMPORTANCE_MARKER_BONUS: f64 = 0.15;

/// Body is longer than [`LONG_BODY_THRESHOLD_CHARS`].
pub const LONG_BODY_BONUS: f64 = 0.10;

/// Strictly-greater-than threshold for [`LONG_BODY_BONUS`], in characters.
pub const LONG_BODY_THRESHOLD_CHARS: usize = 500;

/// Section at position index 0.
pub const FIRST_POSITION_BONUS: f64 = 0.15;

/// Section at the last position index (when it is not also the first).
pub const LAST_POSITION_BONUS: f64 = 0.10;

/// Any query token matched the section text. Applied at most once.
pub const QUERY_MATCH_BONUS: f64 = 0.50;

/// Seconds in one day, for half-lives configured in days.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Minimum length of a term considered significant for topic overlap.
pub const MIN_SIGNIFICANT_TERM_LEN: usize = 4;

/// Minimum length of a query token. Shorter fragments (the "e" of "e-mail")
/// would substring-match nearly every section.
pub const MIN_QUERY_TERM_LEN: usize = 3;

/// Conflict: minimum number of shared significant terms.
pub const CONFLICT_MIN_SHARED_TERMS: usize = 2;

/// Conflict: minimum overlap coefficient `|A ∩ B| / min(|A|, |B|)`.
pub const CONFLICT_MIN_OVERLAP: f64 = 0.3;

/// Conflict: a contradiction marker must start within this many tokens of a shared term.
pub const CONFLICT_MARKER_WINDOW: usize = 8;
