//! Alias Table
//!
//! The scanner only ever reads aliases, so any string map works as a table.

use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// A read-only name → replacement-text lookup.
pub trait Aliases {
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> Aliases for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<S: BuildHasher> Aliases for IndexMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Aliases for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Whether `value` ends in a blank, which makes the word after the alias
/// eligible for substitution as well.
pub fn chains(value: &str) -> bool {
    value.ends_with([' ', '\t'])
}

/// The text scanned in place of an alias: trailing blanks trimmed, then one
/// blank appended so the last word of the replacement ends inside it.
pub fn replacement_text(value: &str) -> String {
    format!("{} ", value.trim_end_matches([' ', '\t']))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_hashmap() {
        let mut table = HashMap::new();
        table.insert("ll".to_string(), "ls -l".to_string());
        assert_eq!(table.lookup("ll"), Some("ls -l"));
        assert_eq!(table.lookup("la"), None);
    }

    #[test]
    fn test_replacement_text() {
        assert_eq!(replacement_text("ls -l"), "ls -l ");
        assert_eq!(replacement_text("sudo \t "), "sudo ");
        assert!(chains("sudo "));
        assert!(!chains("ls -l"));
    }
}
