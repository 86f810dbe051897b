//! Fuzzy matching of command-line terms against component names.

/// How a fuzzy term matched a component name.
///
/// Variants are ordered by priority: an exact match beats a substring
/// match, which beats a subsequence match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// Name equals the term.
    Exact,
    /// Term occurs contiguously inside the name.
    Substring,
    /// Term's characters occur in order inside the name.
    Subsequence,
}

/// Match `term` against `candidate`, case-insensitively.
///
/// # Examples
///
/// ```
/// use dotstate::config::matcher::{MatchKind, match_kind};
///
/// assert_eq!(match_kind("tools.ripgrep", "tools.ripgrep"), Some(MatchKind::Exact));
/// assert_eq!(match_kind("tools.ripgrep", "RIP"), Some(MatchKind::Substring));
/// assert_eq!(match_kind("tools.ripgrep", "trg"), Some(MatchKind::Subsequence));
/// assert_eq!(match_kind("tools.ripgrep", "fzf"), None);
/// ```
#[must_use]
pub fn match_kind(candidate: &str, term: &str) -> Option<MatchKind> {
    let candidate = candidate.to_lowercase();
    let term = term.to_lowercase();
    if term.is_empty() {
        return None;
    }
    if candidate == term {
        Some(MatchKind::Exact)
    } else if candidate.contains(&term) {
        Some(MatchKind::Substring)
    } else if is_subsequence(&term, &candidate) {
        Some(MatchKind::Subsequence)
    } else {
        None
    }
}

/// Best match of `candidate` against any of `terms`, with the index of the
/// term that produced it.  Ties go to the earliest term.
#[must_use]
pub fn best_match(candidate: &str, terms: &[String]) -> Option<(usize, MatchKind)> {
    terms
        .iter()
        .enumerate()
        .filter_map(|(i, term)| match_kind(candidate, term).map(|kind| (i, kind)))
        .min_by_key(|&(i, kind)| (kind, i))
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut rest = haystack.chars();
    needle.chars().all(|c| rest.any(|h| h == c))
}
