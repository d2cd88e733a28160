//! Deterministic identifier hashing.
//!
//! A replacement token is a role letter followed by a 32-character uppercase
//! hex digest of the original name. The role letter keeps variables,
//! functions and classes in separate namespaces even when two names collide
//! on the digest.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Digest algorithm behind every token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DigestKind {
    /// MD5, matching trees produced by earlier releases
    #[default]
    Md5,
    /// 128-bit XXH3
    Xxh3,
}

/// What kind of identifier a token replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Variable,
    Function,
    Class,
}

impl Role {
    pub fn prefix(self) -> char {
        match self {
            Role::Variable => 'R',
            Role::Function => 'F',
            Role::Class => 'C',
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NameHasher {
    kind: DigestKind,
}

impl NameHasher {
    pub fn new(kind: DigestKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> DigestKind {
        self.kind
    }

    /// Uppercase hex digest of `name`; identical for identical input across runs.
    pub fn digest(&self, name: &str) -> String {
        match self.kind {
            DigestKind::Md5 => {
                let bytes = Md5::digest(name.as_bytes());
                let mut out = String::with_capacity(32);
                for b in bytes.iter() {
                    out.push_str(&format!("{b:02X}"));
                }
                out
            }
            DigestKind::Xxh3 => {
                format!("{:032X}", xxhash_rust::xxh3::xxh3_128(name.as_bytes()))
            }
        }
    }

    /// Role letter plus digest, e.g. `F` + digest("foo").
    pub fn token(&self, role: Role, name: &str) -> String {
        let mut out = String::with_capacity(33);
        out.push(role.prefix());
        out.push_str(&self.digest(name));
        out
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_md5_known_answers() {
        let h = NameHasher::default();

        assert_eq!(h.digest("foo"), "ACBD18DB4CC2F85CEDEF654FCCC4A4D8");
        assert_eq!(h.token(Role::Variable, "$a"), "R52D5B5E885B21331CFD2304BE571DE0B");
        assert_eq!(h.token(Role::Class, "Bar"), "CDDC35F88FA71B6EF142AE61F35364653");
    }

    #[test]
    fn test_xxh3_is_fixed_width_hex() {
        let h = NameHasher::new(DigestKind::Xxh3);
        let d = h.digest("");

        assert_eq!(d.len(), 32);
        assert!(
            d.chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase())
        );
    }

    proptest! {
        #[test]
        fn prop_digest_is_deterministic(name in "\\PC{0,24}") {
            for kind in [DigestKind::Md5, DigestKind::Xxh3] {
                let a = NameHasher::new(kind).digest(&name);
                let b = NameHasher::new(kind).digest(&name);
                prop_assert_eq!(a.len(), 32);
                prop_assert_eq!(a, b);
            }
        }

        #[test]
        fn prop_roles_never_share_tokens(name in "[A-Za-z_][A-Za-z0-9_]{0,16}") {
            let h = NameHasher::default();
            let v = h.token(Role::Variable, &name);
            let f = h.token(Role::Function, &name);
            let c = h.token(Role::Class, &name);
            prop_assert_ne!(&v, &f);
            prop_assert_ne!(&f, &c);
            prop_assert_ne!(&v, &c);
            prop_assert_eq!(&v[1..], &f[1..]);
        }
    }
}
