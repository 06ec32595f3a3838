//! Detection rules. Order matters: earlier rules win overlapping spans.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Phone formats, from the most specific to the most permissive.
pub const PHONE_PATTERNS: [&str; 5] = [
    // +1-555-0101, +1 555 0101
    r"\+\d{1,3}[-.\s]?\d{3}[-.\s]?\d{4}",
    // +1-555-123-4567, +1 (555) 123-4567
    r"\+\d{1,3}[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}",
    // (555) 123-4567
    r"\(\d{3}\)\s*\d{3}[-.\s]?\d{4}",
    // 555-123-4567, 555.123.4567
    r"\d{3}[-.\s]\d{3}[-.\s]\d{4}",
    // 5551234567; also hits any bare 10-digit run, order ids included
    r"\b\d{10}\b",
];

pub const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b";

/// Anything shaped like a placeholder this crate hands out.
const PLACEHOLDER_PATTERN: &str = r"\[(?:PHONE|EMAIL)_\d+\]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PiiCategory {
    Phone,
    Email,
}

impl PiiCategory {
    pub fn label(self) -> &'static str {
        match self {
            PiiCategory::Phone => "PHONE",
            PiiCategory::Email => "EMAIL",
        }
    }

    pub fn placeholder(self, n: usize) -> String {
        format!("[{}_{}]", self.label(), n)
    }
}

impl fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub(crate) struct Rules {
    pub phones: Vec<Regex>,
    pub email: Option<Regex>,
    pub placeholder: Option<Regex>,
}

/// Compiled once per process. A rule that fails to compile is dropped, which
/// only ever widens the set of undetected formats.
pub(crate) fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| Rules {
        phones: PHONE_PATTERNS.iter().filter_map(|p| compile(p)).collect(),
        email: compile(EMAIL_PATTERN),
        placeholder: compile(PLACEHOLDER_PATTERN),
    })
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!("invalid detection pattern {pattern}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_rules_compile() {
        let r = rules();
        assert_eq!(r.phones.len(), PHONE_PATTERNS.len());
        assert!(r.email.is_some());
        assert!(r.placeholder.is_some());
    }

    #[test]
    fn placeholders_are_not_pii() {
        let r = rules();
        for token in ["[PHONE_1]", "[EMAIL_12]"] {
            assert!(r.phones.iter().all(|p| !p.is_match(token)));
            assert!(!r.email.as_ref().is_some_and(|e| e.is_match(token)));
        }
    }
}
