// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Query normalization and candidate scoring.
//!
//! ## Scores
//!
//! | relation                                   | score |
//! |--------------------------------------------|-------|
//! | either side empty                          | `-∞`  |
//! | candidate equals query                     | 1000  |
//! | candidate starts with query                | 800   |
//! | otherwise, per query token (best match)    | exact 60, prefix 40, substring 10 |
//! | plus, whole query is a substring           | +120  |
//!
//! Exact and prefix relationships dominate by construction. This is not a fuzzy
//! matcher: a typo scores nothing for that token.

use alloc::string::String;

/// Score for a candidate equal to the query.
pub const EXACT: f64 = 1000.0;
/// Score for a candidate that starts with the query.
pub const PREFIX: f64 = 800.0;
/// Per-token score for an identical token.
pub const TOKEN_EXACT: f64 = 60.0;
/// Per-token score for a candidate token starting with the query token.
pub const TOKEN_PREFIX: f64 = 40.0;
/// Per-token score for a candidate token containing the query token.
pub const TOKEN_CONTAINS: f64 = 10.0;
/// Bonus when the whole query appears inside the candidate.
pub const SUBSTRING_BONUS: f64 = 120.0;

/// Normalize free text for matching.
///
/// ASCII uppercase, periods and commas removed, whitespace runs collapsed to a
/// single space, ends trimmed. Non-ASCII characters pass through unchanged.
///
/// ```
/// use parcelview_search::normalize;
/// assert_eq!(normalize("  123 main st.,  apt 4 "), "123 MAIN ST APT 4");
/// ```
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        let start = out.len();
        if start > 0 {
            out.push(' ');
        }
        let mut pushed = false;
        for c in word.chars().filter(|c| !matches!(c, '.' | ',')) {
            out.push(c.to_ascii_uppercase());
            pushed = true;
        }
        // A word made only of punctuation leaves no token behind.
        if !pushed {
            out.truncate(start);
        }
    }
    out
}

/// Score a normalized candidate against a normalized query.
///
/// Both inputs must already be [`normalize`]d. Returns `f64::NEG_INFINITY` if
/// either is empty.
pub fn score(query_norm: &str, candidate_norm: &str) -> f64 {
    if query_norm.is_empty() || candidate_norm.is_empty() {
        return f64::NEG_INFINITY;
    }
    if query_norm == candidate_norm {
        return EXACT;
    }
    if candidate_norm.starts_with(query_norm) {
        return PREFIX;
    }
    let mut total: f64 = query_norm
        .split_whitespace()
        .map(|q| {
            candidate_norm
                .split_whitespace()
                .map(|c| token_score(q, c))
                .fold(0.0, f64::max)
        })
        .sum();
    if candidate_norm.contains(query_norm) {
        total += SUBSTRING_BONUS;
    }
    total
}

fn token_score(query_token: &str, candidate_token: &str) -> f64 {
    if candidate_token == query_token {
        TOKEN_EXACT
    } else if candidate_token.starts_with(query_token) {
        TOKEN_PREFIX
    } else if candidate_token.contains(query_token) {
        TOKEN_CONTAINS
    } else {
        0.0
    }
}
