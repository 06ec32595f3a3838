use std::collections::HashSet;
use std::fmt;

use crate::patterns::PiiCategory;

/// Placeholder → original literal, in insertion order.
///
/// Owned by a single turn: built while masking, consumed when unmasking the
/// reply, then dropped. `Debug` lists placeholders only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SubstitutionTable {
    entries: Vec<(String, String)>,
    /// Placeholder-shaped strings already present in masked input; never handed out.
    reserved: HashSet<String>,
}

impl SubstitutionTable {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Literal behind `placeholder`.
    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.entries.iter().find(|(p, _)| p == placeholder).map(|(_, v)| v.as_str())
    }

    /// Placeholder already assigned to `literal`, if any.
    pub fn placeholder_for(&self, literal: &str) -> Option<&str> {
        self.entries.iter().find(|(_, v)| v == literal).map(|(p, _)| p.as_str())
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    pub(crate) fn reserve(&mut self, token: &str) {
        self.reserved.insert(token.to_string());
    }

    /// Existing placeholder for `literal`, or a fresh `[CATEGORY_N]` with the
    /// smallest N past every number already issued for that category.
    pub(crate) fn assign(&mut self, category: PiiCategory, literal: &str) -> String {
        if let Some(existing) = self.placeholder_for(literal) {
            return existing.to_string();
        }
        let prefix = format!("[{}_", category.label());
        let issued = self.entries.iter().filter(|(p, _)| p.starts_with(&prefix)).count();
        let mut n = issued + 1;
        let placeholder = loop {
            let candidate = category.placeholder(n);
            if self.get(&candidate).is_none() && !self.reserved.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.entries.push((placeholder.clone(), literal.to_string()));
        placeholder
    }
}

impl fmt::Debug for SubstitutionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubstitutionTable")
            .field("placeholders", &self.placeholders().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_reuses_and_skips_reserved() {
        let mut t = SubstitutionTable::new();
        t.reserve("[PHONE_1]");
        assert_eq!(t.assign(PiiCategory::Phone, "555-123-4567"), "[PHONE_2]");
        assert_eq!(t.assign(PiiCategory::Phone, "555-123-4567"), "[PHONE_2]");
        assert_eq!(t.assign(PiiCategory::Email, "a@b.co"), "[EMAIL_1]");
        assert_eq!(t.assign(PiiCategory::Phone, "555-000-1111"), "[PHONE_3]");
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn debug_hides_literals() {
        let mut t = SubstitutionTable::new();
        t.assign(PiiCategory::Email, "alice@example.com");
        let shown = format!("{t:?}");
        assert!(shown.contains("[EMAIL_1]"));
        assert!(!shown.contains("alice"));
    }
}
