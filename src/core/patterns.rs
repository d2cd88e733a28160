//! Filepath: src/core/patterns.rs
//! The five recognizer patterns the engine scans with.
//!
//! Pattern strings are supplied by configuration; this module only compiles
//! them and turns regex hits into [`Match`] triples. When a pattern defines a
//! capture group named `name` (or `name_<suffix>`), the first such group that
//! took part in a hit is the reported match. This is how declaration patterns
//! can require surrounding context (`function foo(`) while yielding only the
//! identifier, since the `regex` crate has no look-around. Group names must
//! be unique, so alternatives that each capture an identifier use suffixes.

use std::ops::Range;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Capture group that narrows a hit down to the identifier.
pub const NAME_GROUP: &str = "name";

/// Raw pattern strings, as read from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Quoted string literals; their spans are excluded from marker searches
    pub string: String,
    /// Variable references (`$name`)
    pub variable: String,
    /// Function declarations; should capture the declared name
    pub function_declaration: String,
    /// Function calls and other name uses
    pub function: String,
    /// Class declarations; should capture the declared name
    pub class_declaration: String,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            string: r#"(?s)"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#.to_string(),
            variable: r"\$[A-Za-z_][A-Za-z0-9_]*".to_string(),
            function_declaration: r"\bfunction\s+&?\s*(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\("
                .to_string(),
            // `new X`, `extends X` and friends; `x(` and `X::`; type hints `X $v`
            function: concat!(
                r"\b(?:new|extends|implements|instanceof|insteadof)\s+(?P<name_ctx>[A-Za-z_][A-Za-z0-9_]*)",
                r"|(?P<name>\$?[A-Za-z_][A-Za-z0-9_]*)\s*(?:\(|::)",
                r"|(?P<name_hint>\$?[A-Za-z_][A-Za-z0-9_]*)\s+&?(?:\.\.\.)?\$",
            )
            .to_string(),
            class_declaration: r"\bclass\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)".to_string(),
        }
    }
}

/// Which of the five recognizers a pattern is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    String,
    Variable,
    FunctionDeclaration,
    Function,
    ClassDeclaration,
}

impl PatternKind {
    pub const ALL: [PatternKind; 5] = [
        PatternKind::FunctionDeclaration,
        PatternKind::Function,
        PatternKind::ClassDeclaration,
        PatternKind::Variable,
        PatternKind::String,
    ];

    /// Configuration key of the pattern
    pub fn key(self) -> &'static str {
        match self {
            PatternKind::String => "string",
            PatternKind::Variable => "variable",
            PatternKind::FunctionDeclaration => "function_declaration",
            PatternKind::Function => "function",
            PatternKind::ClassDeclaration => "class_declaration",
        }
    }

    /// Human label used when reporting the active patterns
    pub fn label(self) -> &'static str {
        match self {
            PatternKind::String => "strings",
            PatternKind::Variable => "variables",
            PatternKind::FunctionDeclaration => "function declarations",
            PatternKind::Function => "function calls",
            PatternKind::ClassDeclaration => "class declarations",
        }
    }
}

/// A configured pattern failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid {} pattern `{pattern}`", kind.key())]
pub struct PatternError {
    pub kind: PatternKind,
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// One occurrence of a recognized token inside a haystack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Byte offset into the haystack
    pub offset: usize,
    /// Byte length of the matched text
    pub len: usize,
    /// The matched text itself
    pub text: String,
}

impl Match {
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Compiled recognizers, immutable for the whole run.
#[derive(Debug, Clone)]
pub struct PatternSet {
    string: Regex,
    variable: Regex,
    function_declaration: Regex,
    function: Regex,
    class_declaration: Regex,
}

impl PatternSet {
    pub fn compile(config: &PatternConfig) -> Result<Self, PatternError> {
        let build = |kind: PatternKind, pattern: &str| {
            Regex::new(pattern).map_err(|source| PatternError {
                kind,
                pattern: pattern.to_string(),
                source,
            })
        };

        Ok(Self {
            string: build(PatternKind::String, &config.string)?,
            variable: build(PatternKind::Variable, &config.variable)?,
            function_declaration: build(
                PatternKind::FunctionDeclaration,
                &config.function_declaration,
            )?,
            function: build(PatternKind::Function, &config.function)?,
            class_declaration: build(PatternKind::ClassDeclaration, &config.class_declaration)?,
        })
    }

    pub fn regex(&self, kind: PatternKind) -> &Regex {
        match kind {
            PatternKind::String => &self.string,
            PatternKind::Variable => &self.variable,
            PatternKind::FunctionDeclaration => &self.function_declaration,
            PatternKind::Function => &self.function,
            PatternKind::ClassDeclaration => &self.class_declaration,
        }
    }

    /// All non-overlapping matches of `kind` in `haystack`, ascending by offset.
    pub fn matches(&self, kind: PatternKind, haystack: &str) -> Vec<Match> {
        let re = self.regex(kind);
        let groups: Vec<usize> = re
            .capture_names()
            .enumerate()
            .filter_map(|(i, n)| n.filter(|n| is_name_group(n)).map(|_| i))
            .collect();

        if groups.is_empty() {
            return re
                .find_iter(haystack)
                .map(|m| Match {
                    offset: m.start(),
                    len: m.len(),
                    text: m.as_str().to_string(),
                })
                .collect();
        }

        re.captures_iter(haystack)
            .filter_map(|caps| {
                // Optional name groups that did not participate yield nothing
                let m = groups
                    .iter()
                    .find_map(|&i| caps.get(i))?;
                Some(Match {
                    offset: m.start(),
                    len: m.len(),
                    text: m.as_str().to_string(),
                })
            })
            .collect()
    }
}

/// `name`, or `name_` followed by anything.
fn is_name_group(group: &str) -> bool {
    group
        .strip_prefix(NAME_GROUP)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> PatternSet {
        PatternSet::compile(&PatternConfig::default()).unwrap()
    }

    fn texts(matches: &[Match]) -> Vec<&str> {
        matches
            .iter()
            .map(|m| m.text.as_str())
            .collect()
    }

    #[test]
    fn test_named_group_narrows_declarations() {
        let set = defaults();
        let code = "function foo($a) {} function &bar() {}";
        let found = set.matches(PatternKind::FunctionDeclaration, code);

        assert_eq!(texts(&found), vec!["foo", "bar"]);
        assert_eq!(&code[found[0].range()], "foo");
    }

    #[test]
    fn test_function_usage_keeps_dollar_prefix() {
        let set = defaults();
        let found = set.matches(PatternKind::Function, "$cb(1); foo(2); Bar::make();");

        assert_eq!(texts(&found), vec!["$cb", "foo", "Bar", "make"]);
    }

    #[test]
    fn test_function_usage_covers_class_references() {
        let set = defaults();
        let code = "class C extends Base implements Shape { function f(Base $b, Opt ...$r) { return new Child; } } $x instanceof Base;";
        let found = set.matches(PatternKind::Function, code);

        assert_eq!(texts(&found), vec!["Base", "Shape", "f", "Base", "Opt", "Child", "Base"]);
    }

    #[test]
    fn test_first_participating_name_group_wins() {
        let config = PatternConfig {
            variable: r"@(?P<name_at>\w+)|%(?P<name>\w+)|(?P<other>#\w+)".to_string(),
            ..PatternConfig::default()
        };
        let set = PatternSet::compile(&config).unwrap();
        let found = set.matches(PatternKind::Variable, "@a %b #c");

        assert_eq!(texts(&found), vec!["a", "b"]);
        assert!(!is_name_group("names"));
    }

    #[test]
    fn test_unnamed_pattern_reports_whole_match() {
        let set = defaults();
        let found = set.matches(PatternKind::Variable, "$a = $b_2 + 1;");

        assert_eq!(texts(&found), vec!["$a", "$b_2"]);
        assert_eq!(found[1].offset, 5);
    }

    #[test]
    fn test_string_pattern_handles_escapes() {
        let set = defaults();
        let code = r#"echo "a \" b" . 'c\'d';"#;
        let found = set.matches(PatternKind::String, code);

        assert_eq!(texts(&found), vec![r#""a \" b""#, r"'c\'d'"]);
    }

    #[test]
    fn test_invalid_pattern_names_its_kind() {
        let config = PatternConfig {
            variable: "(".to_string(),
            ..PatternConfig::default()
        };
        let err = PatternSet::compile(&config).unwrap_err();

        assert_eq!(err.kind, PatternKind::Variable);
        assert!(err.to_string().contains("variable"));
    }
}
