//! Hand-curated name corrections applied around the geocoder call.

use serde::Deserialize;
use std::collections::HashMap;

/// A single `from -> to` rewrite
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

impl Substitution {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Source-name overrides plus the string fixes applied to localized names
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    /// Raw source name -> geocoder query
    aliases: HashMap<String, String>,
    /// Applied in order to every localized name
    normalizations: Vec<Substitution>,
}

impl AliasTable {
    pub fn new(aliases: &[Substitution], normalizations: &[Substitution]) -> Self {
        Self {
            aliases: aliases
                .iter()
                .map(|s| (s.from.clone(), s.to.clone()))
                .collect(),
            normalizations: normalizations.to_vec(),
        }
    }

    /// Geocoder query for a raw source name; unknown names pass through unchanged.
    pub fn query_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Apply every normalization, each over the output of the previous one.
    pub fn normalize(&self, localized: &str) -> String {
        self.normalizations
            .iter()
            .fold(localized.to_string(), |acc, sub| acc.replace(&sub.from, &sub.to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        AliasTable::new(
            &[Substitution::new("Sachnin", "Sakhnin"), Substitution::new("Maghar", "מר'אר")],
            &[
                Substitution::new("מועצה אזורית ", ""),
                Substitution::new("מר'אר", "מגאר"),
            ],
        )
    }

    #[test]
    fn test_alias_lookup() {
        let table = table();
        assert_eq!(table.query_for("Sachnin"), "Sakhnin");
        assert_eq!(table.query_for("Haifa"), "Haifa");
    }

    #[test]
    fn test_normalizations_apply_in_order() {
        let table = table();
        assert_eq!(table.normalize("מועצה אזורית גליל עליון"), "גליל עליון");
        assert_eq!(table.normalize("מר'אר"), "מגאר");
        assert_eq!(table.normalize("סח'נין"), "סח'נין");
    }

    #[test]
    fn test_empty_table_is_identity() {
        let table = AliasTable::default();
        assert_eq!(table.query_for("x"), "x");
        assert_eq!(table.normalize("y"), "y");
    }
}
