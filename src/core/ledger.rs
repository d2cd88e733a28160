//! Function and class names harvested by the first pass.
//!
//! The ledger is append-only while the first pass runs and is sealed before
//! the second pass starts. Only a [`SealedLedger`] can drive function
//! renaming, so a partially filled ledger cannot reach the second pass.

use indexmap::IndexSet;

#[derive(Debug, Default)]
pub struct SymbolLedger {
    functions: IndexSet<String>,
    classes: IndexSet<String>,
}

impl SymbolLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the name was already recorded.
    pub fn record_function(&mut self, name: &str) -> bool {
        if self.functions.contains(name) {
            return false;
        }
        self.functions.insert(name.to_string())
    }

    /// Returns false when the name was already recorded.
    pub fn record_class(&mut self, name: &str) -> bool {
        if self.classes.contains(name) {
            return false;
        }
        self.classes.insert(name.to_string())
    }

    pub fn is_class(&self, name: &str) -> bool {
        self.classes.contains(name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Close the ledger; no first-pass writer may run after this.
    pub fn seal(self) -> SealedLedger {
        SealedLedger {
            functions: self.functions,
            classes: self.classes,
        }
    }
}

/// Read-only ledger consumed by the second pass.
#[derive(Debug, Default)]
pub struct SealedLedger {
    functions: IndexSet<String>,
    classes: IndexSet<String>,
}

impl SealedLedger {
    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    pub fn is_class(&self, name: &str) -> bool {
        self.classes.contains(name)
    }

    /// Function names in discovery order
    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.functions
            .iter()
            .map(String::as_str)
    }

    /// Class names in discovery order
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes
            .iter()
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_ordered() {
        let mut ledger = SymbolLedger::new();

        assert!(ledger.record_function("b"));
        assert!(ledger.record_function("a"));
        assert!(!ledger.record_function("b"));
        assert!(ledger.record_class("Bar"));
        assert!(!ledger.record_class("Bar"));

        assert_eq!(ledger.function_count(), 2);
        assert_eq!(ledger.class_count(), 1);

        let sealed = ledger.seal();
        assert_eq!(sealed.functions().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(sealed.classes().collect::<Vec<_>>(), vec!["Bar"]);
    }

    #[test]
    fn test_roles_are_kept_apart() {
        let mut ledger = SymbolLedger::new();
        ledger.record_class("Bar");

        let sealed = ledger.seal();
        assert!(sealed.is_class("Bar"));
        assert!(!sealed.is_function("Bar"));
        assert!(!sealed.is_empty());
        assert!(SealedLedger::default().is_empty());
    }
}
