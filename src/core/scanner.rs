//! Code region discovery.
//!
//! A file alternates between markup and code regions. A region starts right
//! after an open marker (`<?php` or `<?`) and ends right before the next
//! close marker (`?>`) that is not inside a string literal. An open marker
//! without a following close marker ends the scan; the rest of the file is
//! left as it is.

use std::ops::Range;

use memchr::memmem;

use crate::core::exclusion::{Anchor, ExclusionIndex};

pub const OPEN_MARKER: &str = "<?";
pub const OPEN_MARKER_LONG: &str = "<?php";
pub const CLOSE_MARKER: &str = "?>";

/// Span of one code region, exclusive of its markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeRegion {
    pub start: usize,
    pub len: usize,
}

impl CodeRegion {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range()]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CodeBlockScanner<'p> {
    exclusions: ExclusionIndex<'p>,
}

impl<'p> CodeBlockScanner<'p> {
    pub fn new(exclusions: ExclusionIndex<'p>) -> Self {
        Self { exclusions }
    }

    /// The first complete region whose open marker is at or after `from`.
    pub fn next_region(&self, text: &str, from: usize) -> Option<CodeRegion> {
        let bytes = text.as_bytes();
        if from > bytes.len() {
            return None;
        }

        let marker = from + memmem::find(&bytes[from..], OPEN_MARKER.as_bytes())?;

        // Both markers share a prefix, so the long one wins a tie at the same offset
        let marker_len = if has_long_marker(bytes, marker) {
            OPEN_MARKER_LONG.len()
        } else {
            OPEN_MARKER.len()
        };
        let start = marker + marker_len;

        let end = self
            .exclusions
            .index_of(CLOSE_MARKER, text, start, Anchor::Start)?;

        Some(CodeRegion { start, len: end - start })
    }

    /// Lazy iterator over the regions of an unchanging text.
    pub fn regions<'t>(&self, text: &'t str) -> Regions<'p, 't> {
        Regions { scanner: *self, text, cursor: 0 }
    }

    /// Rewrite every region of `text` in place, left to right.
    ///
    /// Scanning resumes right after the *rewritten* text, so `rewrite` may
    /// grow or shrink a region freely. Returns the number of regions visited.
    pub fn splice_regions<F>(&self, text: &mut String, mut rewrite: F) -> usize
    where
        F: FnMut(&str) -> String,
    {
        let mut cursor = 0;
        let mut visited = 0;

        while let Some(region) = self.next_region(text, cursor) {
            let rewritten = rewrite(region.text(text));
            text.replace_range(region.range(), &rewritten);

            cursor = region.start + rewritten.len();
            visited += 1;
        }

        visited
    }
}

/// `<?php`, case-insensitive on the `php` part.
fn has_long_marker(bytes: &[u8], marker: usize) -> bool {
    bytes
        .get(marker..marker + OPEN_MARKER_LONG.len())
        .is_some_and(|m| m.eq_ignore_ascii_case(OPEN_MARKER_LONG.as_bytes()))
}

/// Restartable region sequence; see [`CodeBlockScanner::regions`].
#[derive(Debug, Clone)]
pub struct Regions<'p, 't> {
    scanner: CodeBlockScanner<'p>,
    text: &'t str,
    cursor: usize,
}

impl<'t> Iterator for Regions<'_, 't> {
    type Item = (CodeRegion, &'t str);

    fn next(&mut self) -> Option<Self::Item> {
        let region = self
            .scanner
            .next_region(self.text, self.cursor)?;
        self.cursor = region.start + region.len;
        Some((region, region.text(self.text)))
    }
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;
    use crate::core::patterns::PatternConfig;

    fn with_scanner<R>(f: impl FnOnce(CodeBlockScanner<'_>) -> R) -> R {
        let re = Regex::new(&PatternConfig::default().string).unwrap();
        f(CodeBlockScanner::new(ExclusionIndex::new(&re)))
    }

    fn region_texts(text: &str) -> Vec<String> {
        with_scanner(|s| {
            s.regions(text)
                .map(|(_, t)| t.to_string())
                .collect()
        })
    }

    #[test]
    fn test_long_and_short_markers() {
        let text = "<p><?php echo 1; ?></p><? echo 2; ?>";

        assert_eq!(region_texts(text), vec![" echo 1; ", " echo 2; "]);
    }

    #[test]
    fn test_uppercase_long_marker() {
        assert_eq!(region_texts("<?PHP $a; ?>"), vec![" $a; "]);
    }

    #[test]
    fn test_close_marker_inside_literal_is_ignored() {
        let text = r#"<?php echo "?>"; ?>after"#;

        assert_eq!(region_texts(text), vec![r#" echo "?>"; "#]);
    }

    #[test]
    fn test_unterminated_region_ends_scan() {
        let text = "<?php $a = 1; ?> html <?php $b = 2;";
        let regions = with_scanner(|s| s.regions(text).map(|(r, _)| r).collect::<Vec<_>>());

        assert_eq!(regions, vec![CodeRegion { start: 5, len: 9 }]);
    }

    #[test]
    fn test_no_regions_in_plain_markup() {
        assert!(region_texts("<html><body>hi</body></html>").is_empty());
    }

    #[test]
    fn test_scan_is_deterministic() {
        let text = "a<?x?>b<?php y ?>c<??>d";
        let first = region_texts(text);
        let second = region_texts(text);

        assert_eq!(first, vec!["x", " y ", ""]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_splice_resumes_after_rewritten_text() {
        let mut text = "<?php a ?>|<?php b ?>|<?php c ?>".to_string();
        let visited = with_scanner(|s| {
            s.splice_regions(&mut text, |block| {
                // Grow the first region and shrink the others
                if block.contains('a') {
                    " aaaaaaaaaa <?php ".to_string()
                } else {
                    block.trim().to_string()
                }
            })
        });

        assert_eq!(visited, 3);
        assert_eq!(text, "<?php aaaaaaaaaa <?php ?>|<?phpb?>|<?phpc?>");
    }
}
