//! Compound catalog: named categories of `{name, formula}` entries.
//!
//! Two source formats are accepted:
//!
//! - JSON, `{ "Salze": [{ "name": "Natriumchlorid", "formula": "NaCl" }, ...], ... }`
//! - delimited text, one `category;name;formula` per line, `#` starts a comment
//!
//! A malformed entry never aborts the load. It is logged, skipped, and
//! reported in [`CatalogLoad::errors`]. Only a document that cannot be read
//! at all (I/O, invalid JSON, wrong top-level shape) fails the whole load.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CatalogError;

/// One quiz compound. Immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Compound {
    pub name: String,
    pub formula: String,
}

impl Compound {
    pub fn new(name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formula: formula.into(),
        }
    }

    /// Trim both fields and reject blanks.
    fn validated(name: &str, formula: &str) -> Result<Self, String> {
        let name = name.trim();
        let formula = formula.trim();
        if name.is_empty() {
            return Err("empty name".to_string());
        }
        if formula.is_empty() {
            return Err(format!("empty formula for {name:?}"));
        }
        Ok(Self::new(name, formula))
    }
}

#[derive(Deserialize)]
struct RawCompound {
    name: String,
    formula: String,
}

/// Category name → ordered compounds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    categories: BTreeMap<String, Vec<Compound>>,
}

/// Result of a load that got far enough to produce a catalog.
#[derive(Debug)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    /// Entries that were skipped: category order, then entry order for JSON;
    /// line order for delimited text.
    pub errors: Vec<CatalogError>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON catalog format.
    pub fn from_json_str(text: &str) -> Result<CatalogLoad, CatalogError> {
        let doc: Value = serde_json::from_str(text)?;
        let object = match doc {
            Value::Object(map) => map,
            Value::Array(_) => return Err(CatalogError::Shape("an array")),
            Value::Null => return Err(CatalogError::Shape("null")),
            _ => return Err(CatalogError::Shape("a scalar")),
        };

        let mut catalog = Catalog::new();
        let mut errors = Vec::new();
        for (category, entries) in object {
            let Value::Array(entries) = entries else {
                let err = CatalogError::entry(&category, 0, "expected a list of compounds");
                skip(&mut errors, err);
                continue;
            };
            for (index, entry) in entries.into_iter().enumerate() {
                let parsed = serde_json::from_value::<RawCompound>(entry)
                    .map_err(|e| e.to_string())
                    .and_then(|raw| Compound::validated(&raw.name, &raw.formula));
                match parsed {
                    Ok(compound) => catalog.push(&category, compound),
                    Err(reason) => skip(&mut errors, CatalogError::entry(&category, index, reason)),
                }
            }
        }

        log::info!(
            "[CATALOG] loaded {} compounds in {} categories ({} skipped)",
            catalog.len(),
            catalog.categories.len(),
            errors.len()
        );
        Ok(CatalogLoad { catalog, errors })
    }

    /// Parse the delimited format. Never fails as a whole; bad lines are
    /// reported with their 1-based line number as the entry index.
    pub fn from_delimited_str(text: &str) -> CatalogLoad {
        let mut catalog = Catalog::new();
        let mut errors = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.splitn(3, ';').collect();
            let [category, name, formula] = fields[..] else {
                let reason = format!("expected category;name;formula, got {line:?}");
                skip(&mut errors, CatalogError::entry("", i + 1, reason));
                continue;
            };
            let category = category.trim();
            if category.is_empty() {
                skip(&mut errors, CatalogError::entry("", i + 1, "empty category"));
                continue;
            }
            match Compound::validated(name, formula) {
                Ok(compound) => catalog.push(category, compound),
                Err(reason) => skip(&mut errors, CatalogError::entry(category, i + 1, reason)),
            }
        }
        log::info!(
            "[CATALOG] loaded {} compounds in {} categories ({} skipped)",
            catalog.len(),
            catalog.categories.len(),
            errors.len()
        );
        CatalogLoad { catalog, errors }
    }

    /// Parse by file extension: `.json` is JSON, anything else is delimited.
    pub fn parse_for_path(path: &Path, text: &str) -> Result<CatalogLoad, CatalogError> {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(text)
        } else {
            Ok(Self::from_delimited_str(text))
        }
    }

    /// Blocking load from disk. See [`crate::runtime::load_catalog_file`] for
    /// the async variant used by the driver.
    pub fn load(path: impl AsRef<Path>) -> Result<CatalogLoad, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_for_path(path, &text)
    }

    pub fn push(&mut self, category: &str, compound: Compound) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .push(compound);
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn compounds(&self, category: &str) -> Option<&[Compound]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    /// Every compound of every category, category order then entry order.
    pub fn all_compounds(&self) -> impl Iterator<Item = &Compound> {
        self.categories.values().flatten()
    }

    /// Total number of compounds across categories.
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct compounds of the named categories, in selection order.
    /// Repeated names count once, a compound listed under two selected
    /// categories appears once. Unknown names are logged and skipped.
    pub fn union_of<S: AsRef<str>>(&self, selected: &[S]) -> Vec<Compound> {
        let mut names = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut active = Vec::new();
        for name in selected {
            let name = name.as_ref();
            if !names.insert(name) {
                log::debug!("[CATALOG] category {name:?} selected twice");
                continue;
            }
            let Some(compounds) = self.categories.get(name) else {
                log::warn!("[CATALOG] unknown category {name:?} ignored");
                continue;
            };
            for compound in compounds {
                if seen.insert(compound) {
                    active.push(compound.clone());
                }
            }
        }
        active
    }
}

fn skip(errors: &mut Vec<CatalogError>, err: CatalogError) {
    log::warn!("[CATALOG] skipping entry: {err}");
    errors.push(err);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_categories() {
        let load = Catalog::from_json_str(
            r#"{"Salze": [{"name": "Natriumchlorid", "formula": "NaCl"}],
                "Säuren": [{"name": "Salzsäure", "formula": "HCl"},
                           {"name": "Schwefelsäure", "formula": "H₂SO₄"}]}"#,
        )
        .unwrap();
        assert!(load.errors.is_empty());
        assert_eq!(load.catalog.len(), 3);
        assert_eq!(load.catalog.compounds("Säuren").unwrap().len(), 2);
        assert_eq!(
            load.catalog.compounds("Salze").unwrap()[0],
            Compound::new("Natriumchlorid", "NaCl")
        );
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let load = Catalog::from_json_str(
            r#"{"Salze": [{"name": "Natriumchlorid", "formula": "NaCl"},
                          {"name": "ohne Formel"},
                          {"name": "  ", "formula": "KCl"},
                          42,
                          {"name": "Kaliumchlorid", "formula": " KCl "}],
                "Kaputt": "kein Array"}"#,
        )
        .unwrap();
        assert_eq!(load.catalog.len(), 2);
        assert_eq!(load.errors.len(), 4);
        assert_eq!(load.catalog.compounds("Salze").unwrap()[1].formula, "KCl");
        assert!(load.catalog.compounds("Kaputt").is_none());
        // object keys iterate sorted, so "Kaputt" is reported before "Salze"
        match &load.errors[0] {
            CatalogError::Entry { category, index, .. } => {
                assert_eq!(category, "Kaputt");
                assert_eq!(*index, 0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_whole_document_failures() {
        assert!(matches!(
            Catalog::from_json_str("{not json"),
            Err(CatalogError::Json(_))
        ));
        assert!(matches!(
            Catalog::from_json_str("[1, 2]"),
            Err(CatalogError::Shape(_))
        ));
    }

    #[test]
    fn test_delimited_format() {
        let load = Catalog::from_delimited_str(
            "# Kategorie;Name;Formel\n\
             Salze;Natriumchlorid;NaCl\n\
             \n\
             Salze;Kaliumchlorid;KCl\n\
             Oxide;Wasser\n\
             Oxide;Kohlenstoffdioxid;CO₂\n",
        );
        assert_eq!(load.catalog.len(), 3);
        assert_eq!(load.errors.len(), 1);
        assert!(matches!(load.errors[0], CatalogError::Entry { index: 5, .. }));
    }

    #[test]
    fn test_union_skips_unknown_categories() {
        let mut catalog = Catalog::new();
        catalog.push("Salze", Compound::new("Natriumchlorid", "NaCl"));
        catalog.push("Oxide", Compound::new("Wasser", "H₂O"));
        let union = catalog.union_of(&["Oxide", "Gibt es nicht", "Salze"]);
        assert_eq!(union.len(), 2);
        assert_eq!(union[0].name, "Wasser");
    }

    #[test]
    fn test_union_counts_each_compound_once() {
        let mut catalog = Catalog::new();
        catalog.push("Basen", Compound::new("Natriumhydroxid", "NaOH"));
        catalog.push("Basen", Compound::new("Ammoniak", "NH₃"));
        catalog.push("Gase", Compound::new("Ammoniak", "NH₃"));
        catalog.push("Gase", Compound::new("Sauerstoff", "O₂"));

        let repeated = catalog.union_of(&["Basen", "Basen", "Basen"]);
        assert_eq!(repeated.len(), 2);

        let overlapping = catalog.union_of(&["Basen", "Gase"]);
        let names: Vec<&str> = overlapping.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Natriumhydroxid", "Ammoniak", "Sauerstoff"]);
    }

    #[test]
    fn test_shipped_catalog_parses() {
        let load = Catalog::from_json_str(include_str!("../data/compounds.json")).unwrap();
        assert!(load.errors.is_empty());
        assert_eq!(load.catalog.compounds("Salze").unwrap().len(), 10);
        assert!(load.catalog.len() >= 20);
    }
}
