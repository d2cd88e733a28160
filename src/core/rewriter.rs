//! First-pass rewriting of a single code region.
//!
//! Steps run in a fixed order: block comments, line comments, variable
//! renaming, whitespace collapsing, then harvesting of declared function and
//! class names into the [`SymbolLedger`]. Offset-based edits are applied
//! last-match-first so pending match offsets stay valid.

use std::collections::HashSet;

use memchr::memmem;
use tracing::trace;

use crate::core::exclusion::{Anchor, ExclusionIndex};
use crate::core::hasher::{NameHasher, Role};
use crate::core::ledger::SymbolLedger;
use crate::core::patterns::{PatternKind, PatternSet};
use crate::core::reserved;
use crate::core::scanner::CLOSE_MARKER;

const BLOCK_OPEN: &str = "/*";
const BLOCK_CLOSE: &str = "*/";
const LINE_COMMENTS: [&str; 2] = ["//", "#"];

/// Which rewrites are enabled for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    pub remove_whitespace: bool,
    pub rename_variables: bool,
    pub rename_functions: bool,
}

/// User exclusions applied on top of the built-in denylist.
#[derive(Debug, Clone, Default)]
pub struct NameRules {
    excluded_variables: HashSet<String>,
    excluded_functions: HashSet<String>,
}

impl NameRules {
    /// Variable names are stored with their `$`; a bare `name` becomes `$name`.
    pub fn new<V, F>(excluded_variables: V, excluded_functions: F) -> Self
    where
        V: IntoIterator,
        V::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        let excluded_variables = excluded_variables
            .into_iter()
            .map(|v| {
                let v = v.as_ref().trim();
                if v.starts_with('$') {
                    v.to_string()
                } else {
                    format!("${v}")
                }
            })
            .collect();

        let excluded_functions = excluded_functions
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .collect();

        Self { excluded_variables, excluded_functions }
    }

    pub fn keeps_variable(&self, name: &str) -> bool {
        self.excluded_variables.contains(name)
    }

    /// Excluded by the user or a PHP built-in.
    pub fn keeps_function(&self, name: &str) -> bool {
        self.excluded_functions.contains(name) || reserved::is_reserved(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BlockRewriter<'a> {
    patterns: &'a PatternSet,
    exclusions: ExclusionIndex<'a>,
    hasher: NameHasher,
    options: RewriteOptions,
    rules: &'a NameRules,
}

impl<'a> BlockRewriter<'a> {
    pub fn new(
        patterns: &'a PatternSet,
        hasher: NameHasher,
        options: RewriteOptions,
        rules: &'a NameRules,
    ) -> Self {
        Self {
            patterns,
            exclusions: ExclusionIndex::new(patterns.regex(PatternKind::String)),
            hasher,
            options,
            rules,
        }
    }

    /// Rewrite one region's text. The result may be longer or shorter.
    pub fn rewrite(&self, block: &str, ledger: &mut SymbolLedger) -> String {
        let mut code = block.to_string();

        self.strip_block_comments(&mut code);

        if self.options.remove_whitespace {
            for form in LINE_COMMENTS {
                self.strip_line_comments(&mut code, form);
            }
        }

        if self.options.rename_variables {
            self.rename_variables(&mut code);
        }

        if self.options.remove_whitespace {
            code = collapse_whitespace(&code);
        }

        if self.options.rename_functions {
            self.harvest(&code, ledger);
        }

        code
    }

    /// Remove `/* ... */` comments whose opener is outside a literal.
    /// The body is not code, so quotes in it never hide the closer.
    /// An opener without a closer is left alone.
    fn strip_block_comments(&self, code: &mut String) {
        let mut from = 0;

        while let Some(start) = self
            .exclusions
            .index_of(BLOCK_OPEN, code, from, Anchor::Whole)
        {
            let body = start + BLOCK_OPEN.len();
            let Some(close) = memmem::find(&code.as_bytes()[body..], BLOCK_CLOSE.as_bytes())
            else {
                break;
            };

            code.replace_range(start..body + close + BLOCK_CLOSE.len(), "");
            from = start;
        }
    }

    /// Remove `form` comments up to the nearest close marker (consumed),
    /// newline (kept) or end of text.
    fn strip_line_comments(&self, code: &mut String, form: &str) {
        let mut from = 0;

        while let Some(start) = self
            .exclusions
            .index_of(form, code, from, Anchor::Whole)
        {
            let rest = &code.as_bytes()[start..];
            let close = memmem::find(rest, CLOSE_MARKER.as_bytes());
            let newline = memchr::memchr(b'\n', rest);

            let end = match (close, newline) {
                (Some(c), Some(n)) if c < n => start + c + CLOSE_MARKER.len(),
                (Some(c), None) => start + c + CLOSE_MARKER.len(),
                (_, Some(n)) => start + n,
                (None, None) => code.len(),
            };

            code.replace_range(start..end, "");
            from = start;
        }
    }

    fn rename_variables(&self, code: &mut String) {
        let matches = self
            .patterns
            .matches(PatternKind::Variable, code);
        let mut renamed = 0usize;

        for m in matches.iter().rev() {
            if self.rules.keeps_variable(&m.text) {
                continue;
            }

            let token = self.hasher.token(Role::Variable, &m.text);
            code.replace_range(m.range(), &format!("${token}"));
            renamed += 1;
        }

        trace!(found = matches.len(), renamed, "variables renamed");
    }

    /// Record declared classes, then declared functions that are neither
    /// constructors of a known class nor protected names.
    fn harvest(&self, code: &str, ledger: &mut SymbolLedger) {
        for m in self
            .patterns
            .matches(PatternKind::ClassDeclaration, code)
        {
            ledger.record_class(&m.text);
        }

        for m in self
            .patterns
            .matches(PatternKind::FunctionDeclaration, code)
        {
            if ledger.is_class(&m.text) || self.rules.keeps_function(&m.text) {
                continue;
            }
            ledger.record_function(&m.text);
        }
    }
}

/// Every tab, newline and carriage return becomes one space.
fn collapse_whitespace(code: &str) -> String {
    code.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::patterns::PatternConfig;

    const HASH_A: &str = "52D5B5E885B21331CFD2304BE571DE0B";
    const HASH_B: &str = "DA3E61414E50AEE968132F03D265E0CF";

    fn patterns() -> PatternSet {
        PatternSet::compile(&PatternConfig::default()).unwrap()
    }

    fn rewrite_with(options: RewriteOptions, rules: &NameRules, block: &str) -> (String, SymbolLedger) {
        let set = patterns();
        let rewriter = BlockRewriter::new(&set, NameHasher::default(), options, rules);
        let mut ledger = SymbolLedger::new();
        let out = rewriter.rewrite(block, &mut ledger);
        (out, ledger)
    }

    fn all_on() -> RewriteOptions {
        RewriteOptions {
            remove_whitespace: true,
            rename_variables: true,
            rename_functions: true,
        }
    }

    #[test]
    fn test_variables_and_trailing_comment() {
        let options = RewriteOptions {
            remove_whitespace: true,
            rename_variables: true,
            rename_functions: false,
        };
        let (out, _) = rewrite_with(options, &NameRules::default(), "$a = $b + 1; // add");

        assert_eq!(out, format!("$R{HASH_A} = $R{HASH_B} + 1; "));
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_line_comments_keep_newline_then_collapse() {
        let options = RewriteOptions {
            remove_whitespace: true,
            ..RewriteOptions::default()
        };
        let (out, _) = rewrite_with(
            options,
            &NameRules::default(),
            " $x = 1; // one\n$y = 2; # two\n\t$z;",
        );

        assert_eq!(out, " $x = 1;  $y = 2;   $z;");
    }

    #[test]
    fn test_close_marker_ends_line_comment() {
        let options = RewriteOptions {
            remove_whitespace: true,
            ..RewriteOptions::default()
        };
        let (out, _) = rewrite_with(options, &NameRules::default(), "$a; // x \"?>\" y\n$b;");

        assert_eq!(out, "$a; \" y $b;");
    }

    #[test]
    fn test_comment_markers_inside_literals_survive() {
        let (out, _) = rewrite_with(
            all_on(),
            &NameRules::new(["s", "t"], Vec::<String>::new()),
            r#"$s = "not /* a */ comment"; /* real */ $t = 'http://x#y';"#,
        );

        assert_eq!(out, r#"$s = "not /* a */ comment";  $t = 'http://x#y';"#);
    }

    #[test]
    fn test_block_comments_stripped_without_whitespace_removal() {
        let (out, _) = rewrite_with(
            RewriteOptions::default(),
            &NameRules::default(),
            "a /* one */ b /* two\n */ c // kept",
        );

        assert_eq!(out, "a  b  c // kept");
    }

    #[test]
    fn test_quote_inside_block_comment_keeps_following_code() {
        let (out, _) = rewrite_with(
            RewriteOptions::default(),
            &NameRules::default(),
            " /* don't */ echo 'kept'; /* b */ echo 2; ",
        );

        assert_eq!(out, "  echo 'kept';  echo 2; ");
    }

    #[test]
    fn test_unterminated_block_comment_is_left_alone() {
        let (out, _) = rewrite_with(RewriteOptions::default(), &NameRules::default(), "$a; /* open");

        assert_eq!(out, "$a; /* open");
    }

    #[test]
    fn test_excluded_variables_are_untouched() {
        let rules = NameRules::new(["$this", "_GET"], Vec::<String>::new());
        let options = RewriteOptions {
            rename_variables: true,
            ..RewriteOptions::default()
        };
        let (out, _) = rewrite_with(options, &rules, "$this->x = $_GET['a'] . $a;");

        assert_eq!(out, format!("$this->x = $_GET['a'] . $R{HASH_A};"));
    }

    #[test]
    fn test_constructor_is_recorded_only_as_class() {
        let (_, ledger) = rewrite_with(
            all_on(),
            &NameRules::default(),
            " class Bar { function Bar() {} function baz() {} function strlen() {} } ",
        );

        assert!(ledger.is_class("Bar"));
        assert!(!ledger.is_function("Bar"));
        assert!(ledger.is_function("baz"));
        assert!(!ledger.is_function("strlen"));
        assert_eq!(ledger.function_count(), 1);
    }

    #[test]
    fn test_excluded_functions_are_not_harvested() {
        let rules = NameRules::new(Vec::<String>::new(), ["foo"]);
        let (_, ledger) = rewrite_with(
            all_on(),
            &rules,
            " function foo() { return 1; } function bar() {} ",
        );

        assert!(!ledger.is_function("foo"));
        assert!(ledger.is_function("bar"));
    }

    #[test]
    fn test_harvest_disabled_leaves_ledger_empty() {
        let options = RewriteOptions {
            rename_functions: false,
            ..all_on()
        };
        let (_, ledger) = rewrite_with(options, &NameRules::default(), " function foo() {} class A {} ");

        assert_eq!(ledger.function_count(), 0);
        assert_eq!(ledger.class_count(), 0);
    }
}
