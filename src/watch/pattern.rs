// src/watch/pattern.rs

//! Shell-style pattern matching used by every ignore rule.
//!
//! Supported syntax:
//! - `*` matches zero or more arbitrary characters, including `/`
//! - `?` matches exactly one character (a multi-byte character counts once)
//! - a leading `!` negates the rest of the pattern
//!
//! Everything else is a literal, compared case-sensitively. There are no
//! character classes and no escapes; rule files written for this matcher
//! don't need them.

use tracing::trace;

/// Returns true if `candidate` matches `pattern`.
pub fn matches(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix('!') {
        Some(rest) => !glob_match(rest, candidate),
        None => glob_match(pattern, candidate),
    }
}

/// First-match-wins test of `candidate` against a set of patterns.
pub fn matches_any<I, S>(patterns: I, candidate: &str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for pattern in patterns {
        let pattern = pattern.as_ref();
        if matches(pattern, candidate) {
            trace!(pattern, candidate, "pattern matched");
            return true;
        }
    }
    false
}

fn glob_match(mut pattern: &str, mut name: &str) -> bool {
    'pattern: while !pattern.is_empty() {
        let (star, chunk, rest) = scan_chunk(pattern);
        pattern = rest;

        if star && chunk.is_empty() {
            // Trailing star swallows whatever is left.
            return true;
        }

        // Try the chunk at the current position. A final chunk only counts
        // if it consumes the whole remainder.
        if let Some(remaining) = match_chunk(chunk, name) {
            if remaining.is_empty() || !pattern.is_empty() {
                name = remaining;
                continue;
            }
        }

        if star {
            // Let the star absorb one more character at a time.
            for (idx, c) in name.char_indices() {
                let skipped = &name[idx + c.len_utf8()..];
                if let Some(remaining) = match_chunk(chunk, skipped) {
                    if pattern.is_empty() && !remaining.is_empty() {
                        continue;
                    }
                    name = remaining;
                    continue 'pattern;
                }
            }
        }

        return false;
    }

    name.is_empty()
}

/// Split off the next chunk: leading stars (collapsed) plus the run of
/// non-star characters after them.
fn scan_chunk(pattern: &str) -> (bool, &str, &str) {
    let trimmed = pattern.trim_start_matches('*');
    let star = trimmed.len() != pattern.len();
    let end = trimmed.find('*').unwrap_or(trimmed.len());
    (star, &trimmed[..end], &trimmed[end..])
}

/// Match a star-free chunk against the start of `s`, returning the rest.
fn match_chunk<'a>(chunk: &str, s: &'a str) -> Option<&'a str> {
    let mut rest = s;
    for expected in chunk.chars() {
        let mut chars = rest.chars();
        let actual = chars.next()?;
        if expected != '?' && expected != actual {
            return None;
        }
        rest = chars.as_str();
    }
    Some(rest)
}
