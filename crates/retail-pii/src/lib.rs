//! Reversible masking of phone numbers and email addresses.
//!
//! `mask` swaps every detected literal for a `[PHONE_N]` / `[EMAIL_N]`
//! placeholder and returns the table needed to undo it; `unmask` restores the
//! literals in a reply. Only these two categories are detected. Names,
//! addresses and payment data pass through untouched.
//!
//! Each rule only searches the text earlier rules left unclaimed, so an earlier
//! rule wins any overlap, and the text is rewritten in one left-to-right pass.
//! Phone placeholders are numbered in rule order, then position; email
//! placeholders by first appearance.

#![deny(unused_variables)]

pub mod patterns;
pub mod table;

pub use patterns::PiiCategory;
pub use table::SubstitutionTable;

use retail_core::types::CustomerRecord;

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    category: PiiCategory,
}

/// Run one rule over every stretch of `text` not yet claimed by an earlier
/// rule. Each stretch is matched on its own, as if the claimed spans were
/// already replaced by placeholders. New literals get placeholders in
/// discovery order, so numbering follows rule order, then position.
fn scan_gaps(
    text: &str,
    re: &regex::Regex,
    category: PiiCategory,
    spans: &mut Vec<Span>,
    table: &mut SubstitutionTable,
) {
    let mut claimed: Vec<(usize, usize)> = spans.iter().map(|s| (s.start, s.end)).collect();
    claimed.sort_unstable();

    let mut gaps = Vec::with_capacity(claimed.len() + 1);
    let mut cursor = 0;
    for (start, end) in claimed {
        if start > cursor {
            gaps.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if cursor < text.len() {
        gaps.push((cursor, text.len()));
    }

    for (gap_start, gap_end) in gaps {
        for m in re.find_iter(&text[gap_start..gap_end]) {
            if m.as_str().trim().is_empty() {
                continue;
            }
            let (start, end) = (gap_start + m.start(), gap_start + m.end());
            spans.push(Span { start, end, category });
            table.assign(category, &text[start..end]);
        }
    }
}

/// Mask `text` into a fresh table.
pub fn mask(text: &str) -> (String, SubstitutionTable) {
    let mut table = SubstitutionTable::new();
    let masked = mask_into(text, &mut table);
    (masked, table)
}

/// Mask `text`, recording new literals in `table`.
///
/// Literals the table already knows keep their placeholder, and numbering
/// continues where the table left off, so several sources masked into one
/// table never collide.
pub fn mask_into(text: &str, table: &mut SubstitutionTable) -> String {
    let rules = patterns::rules();

    if let Some(re) = &rules.placeholder {
        for m in re.find_iter(text) {
            table.reserve(m.as_str());
        }
    }

    let mut spans: Vec<Span> = Vec::new();
    for re in &rules.phones {
        scan_gaps(text, re, PiiCategory::Phone, &mut spans, table);
    }
    if let Some(re) = &rules.email {
        scan_gaps(text, re, PiiCategory::Email, &mut spans, table);
    }

    if spans.is_empty() {
        return text.to_string();
    }
    spans.sort_by_key(|s| s.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in &spans {
        out.push_str(&text[cursor..span.start]);
        let literal = &text[span.start..span.end];
        match table.placeholder_for(literal) {
            Some(p) => out.push_str(p),
            None => out.push_str(&table.assign(span.category, literal)),
        }
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);

    tracing::debug!("masked {} span(s) ({} table entries)", spans.len(), table.len());
    out
}

/// Replace every placeholder from `table` found in `text` with its literal.
///
/// Must run on the complete reply: a placeholder split across stream
/// fragments would otherwise survive.
pub fn unmask(text: &str, table: &SubstitutionTable) -> String {
    table
        .iter()
        .fold(text.to_string(), |acc, (placeholder, literal)| acc.replace(placeholder, literal))
}

/// Mask the `phone` and `email` fields of a customer; every other field is
/// copied unchanged.
pub fn mask_record(record: &CustomerRecord) -> (CustomerRecord, SubstitutionTable) {
    let mut table = SubstitutionTable::new();
    let masked = mask_record_into(record, &mut table);
    (masked, table)
}

pub fn mask_record_into(record: &CustomerRecord, table: &mut SubstitutionTable) -> CustomerRecord {
    let mut masked = record.clone();
    masked.phone = mask_into(&record.phone, table);
    masked.email = record.email.as_deref().map(|e| mask_into(e, table));
    masked
}
