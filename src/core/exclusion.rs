//! Exclusion-aware substring search.
//!
//! Finds a needle in a haystack while skipping occurrences that sit inside a
//! quoted string literal, as recognized by the string pattern. The literal
//! spans are recomputed on every call since callers mutate the text between
//! searches.
//!
//! Boundaries are exclusive on both ends: an occurrence starting exactly at a
//! literal's first byte (the opening quote) or at its end offset is not
//! excluded. Close-marker detection right after an opening quote depends on
//! this.

use std::ops::Range;

use memchr::memmem;
use regex::Regex;

/// Where literal spans are collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Literals are scanned starting at the search offset
    Start,
    /// Literals are scanned over the whole haystack
    Whole,
}

#[derive(Debug, Clone, Copy)]
pub struct ExclusionIndex<'p> {
    literals: &'p Regex,
}

impl<'p> ExclusionIndex<'p> {
    pub fn new(literals: &'p Regex) -> Self {
        Self { literals }
    }

    /// Offset of the first occurrence of `needle` at or after `start` that is
    /// not strictly inside a string literal, or `None`.
    pub fn index_of(
        &self,
        needle: &str,
        haystack: &str,
        start: usize,
        anchor: Anchor,
    ) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }

        let finder = memmem::Finder::new(needle.as_bytes());
        let bytes = haystack.as_bytes();
        let mut from = start;

        // Whole-haystack spans do not depend on `from`
        let mut spans = match anchor {
            Anchor::Whole => self.literal_spans(haystack, 0),
            Anchor::Start => Vec::new(),
        };

        loop {
            if from > bytes.len() {
                return None;
            }

            let found = from + finder.find(&bytes[from..])?;

            if anchor == Anchor::Start {
                spans = self.literal_spans(haystack, from);
            }

            if !is_excluded(&spans, found) {
                return Some(found);
            }

            from = found + 1;
        }
    }

    /// Spans of every literal match found scanning from `from`.
    pub fn literal_spans(&self, haystack: &str, from: usize) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut at = from;

        while at <= haystack.len() {
            let Some(m) = self.literals.find_at(haystack, at) else {
                break;
            };

            spans.push(m.range());

            at = if m.is_empty() {
                // Step over one char so an empty match cannot stall the scan
                m.end()
                    + haystack[m.end()..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8)
            } else {
                m.end()
            };
        }

        spans
    }
}

/// Strictly inside: `start < offset < end`.
fn is_excluded(spans: &[Range<usize>], offset: usize) -> bool {
    spans
        .iter()
        .any(|s| s.start < offset && offset < s.end)
}
