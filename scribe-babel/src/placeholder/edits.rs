//! Two-phase text substitution
//!
//! Passes first collect `(span, replacement)` edits against an immutable text and
//! then apply them highest offset first, so earlier offsets stay valid.

use std::ops::Range;

#[derive(Debug, Clone, Default)]
pub struct EditList {
    edits: Vec<(Range<usize>, String)>,
}

impl EditList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an edit. Returns `false` (and queues nothing) if the span overlaps an
    /// edit already queued.
    pub fn push(&mut self, range: Range<usize>, replacement: impl Into<String>) -> bool {
        if self.overlaps(&range) {
            return false;
        }
        self.edits.push((range, replacement.into()));
        true
    }

    /// Whether `range` intersects a queued edit.
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.edits
            .iter()
            .any(|(queued, _)| range.start < queued.end && queued.start < range.end)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply every queued edit to `text`.
    pub fn apply(mut self, text: &str) -> String {
        self.edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
        let mut out = text.to_string();
        for (range, replacement) in self.edits {
            if range.end <= out.len() && range.start <= range.end {
                out.replace_range(range, &replacement);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_in_reverse_offset_order() {
        let text = "aaa bbb ccc";
        let mut edits = EditList::new();
        assert!(edits.push(0..3, "X"));
        assert!(edits.push(8..11, "ZZZZZ"));
        assert!(edits.push(4..7, ""));
        assert_eq!(edits.apply(text), "X  ZZZZZ");
    }

    #[test]
    fn rejects_overlapping_edits() {
        let mut edits = EditList::new();
        assert!(edits.push(2..6, "x"));
        assert!(!edits.push(5..8, "y"));
        assert!(!edits.push(0..3, "y"));
        assert!(edits.push(6..8, "y"));
        assert_eq!(edits.len(), 2);
    }

    #[test]
    fn empty_list_is_identity() {
        assert_eq!(EditList::new().apply("unchanged"), "unchanged");
    }
}
