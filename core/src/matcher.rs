//! Fuzzy matching for context names.
//!
//! A query matches when every one of its characters appears in the
//! candidate text in order, not necessarily contiguously. The score only
//! ranks candidates against each other for one query; it has no absolute
//! meaning beyond "higher is better, 0 is no match".

/// Scores how well `query` fuzzy-matches `text`.
///
/// Returns 0 when the query is not a subsequence of the text. An empty
/// query matches everything with a uniform score of 1. Comparison is
/// case-insensitive and operates on code points, never bytes.
pub fn fuzzy_score(text: &str, query: &str) -> u32 {
    if query.is_empty() {
        return 1;
    }

    let text_lower = text.to_lowercase();
    let query_lower = query.to_lowercase();
    let chars: Vec<char> = text_lower.chars().collect();
    let pattern: Vec<char> = query_lower.chars().collect();

    // Hard gate: every pattern char must appear in order.
    let mut pi = 0;
    for c in &chars {
        if pi < pattern.len() && *c == pattern[pi] {
            pi += 1;
        }
    }
    if pi < pattern.len() {
        return 0;
    }

    // Single left-to-right scan. Consecutive runs are rewarded per
    // matched character, matches after a path separator and matches
    // near the start of the string get flat bonuses.
    let mut score: u32 = 0;
    let mut pi = 0;
    let mut consecutive: u32 = 0;
    for (si, c) in chars.iter().enumerate() {
        if pi >= pattern.len() {
            break;
        }
        if *c == pattern[pi] {
            pi += 1;
            consecutive += 1;
            score += 10 + consecutive * 5;

            // Word boundary bonus (after /, -, _, or start).
            if si == 0 || matches!(chars[si - 1], '/' | '-' | '_') {
                score += 20;
            }
            // Early match bonus.
            score += 5u32.saturating_sub(si as u32);
        } else {
            consecutive = 0;
        }
    }

    // Exact substring bonus.
    if text_lower.contains(&query_lower) {
        score += 50;
    }

    score
}
