//! Second pass: function and class renaming.
//!
//! Runs over every targeted file once the first pass has sealed the ledger.
//! Function uses are renamed as functions when the ledger knows the name as
//! a function and as classes otherwise (constructor-style calls). Class
//! declarations are renamed afterwards.

use tracing::trace;

use crate::core::hasher::{NameHasher, Role};
use crate::core::ledger::SealedLedger;
use crate::core::patterns::{PatternKind, PatternSet};
use crate::core::scanner::CodeBlockScanner;

#[derive(Debug, Clone, Copy)]
pub struct FunctionRenamePass<'a> {
    patterns: &'a PatternSet,
    hasher: NameHasher,
    ledger: &'a SealedLedger,
}

impl<'a> FunctionRenamePass<'a> {
    pub fn new(patterns: &'a PatternSet, hasher: NameHasher, ledger: &'a SealedLedger) -> Self {
        Self { patterns, hasher, ledger }
    }

    /// Rename every region of a whole file in place; returns regions visited.
    pub fn apply(&self, scanner: &CodeBlockScanner<'_>, text: &mut String) -> usize {
        scanner.splice_regions(text, |block| self.rewrite(block))
    }

    /// Rename ledger names inside one region's text.
    pub fn rewrite(&self, block: &str) -> String {
        let mut code = block.to_string();

        let uses = self
            .patterns
            .matches(PatternKind::Function, &code);
        for m in uses.iter().rev() {
            let role = if self.ledger.is_function(&m.text) {
                Role::Function
            } else if self.ledger.is_class(&m.text) {
                Role::Class
            } else {
                continue;
            };
            code.replace_range(m.range(), &self.hasher.token(role, &m.text));
        }

        let declarations = self
            .patterns
            .matches(PatternKind::ClassDeclaration, &code);
        for m in declarations.iter().rev() {
            if self.ledger.is_class(&m.text) {
                code.replace_range(m.range(), &self.hasher.token(Role::Class, &m.text));
            }
        }

        trace!(uses = uses.len(), classes = declarations.len(), "region renamed");
        code
    }
}
