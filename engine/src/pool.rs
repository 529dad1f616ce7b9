//! Formula pool: every formula the game may show as a distractor.
//!
//! Union of all catalog formulas (first-seen order) followed by the
//! [`DECOY_FORMULAS`], with duplicates removed. The decoys guarantee a
//! minimum pool size even when the catalog itself is sparse.

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::constants::DECOY_FORMULAS;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormulaPool {
    formulas: Vec<String>,
}

impl FormulaPool {
    pub fn build(catalog: &Catalog) -> Self {
        let catalog_formulas = catalog.all_compounds().map(|c| c.formula.as_str());
        Self::from_formulas(catalog_formulas.chain(DECOY_FORMULAS))
    }

    /// Deduplicate an arbitrary formula list, keeping first occurrences.
    pub fn from_formulas<I, S>(formulas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for f in formulas {
            let f = f.as_ref();
            if seen.insert(f.to_string()) {
                out.push(f.to_string());
            }
        }
        Self { formulas: out }
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    pub fn contains(&self, formula: &str) -> bool {
        self.formulas.iter().any(|f| f == formula)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.formulas
    }

    /// The pool without `target`: the candidates for a round's distractors.
    pub fn distractors_for(&self, target: &str) -> Vec<&str> {
        self.formulas
            .iter()
            .map(String::as_str)
            .filter(|f| *f != target)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Compound;

    #[test]
    fn test_decoys_always_present() {
        let pool = FormulaPool::build(&Catalog::new());
        assert_eq!(pool.len(), DECOY_FORMULAS.len());
        for decoy in DECOY_FORMULAS {
            assert!(pool.contains(decoy));
        }
    }

    #[test]
    fn test_dedup_across_catalog_and_decoys() {
        let mut catalog = Catalog::new();
        catalog.push("Salze", Compound::new("Silbernitrat", "AgNO₃"));
        catalog.push("Salze", Compound::new("Natriumchlorid", "NaCl"));
        catalog.push("Oxide", Compound::new("Schwefeldioxid", "SO₂"));
        catalog.push("Mehr Salze", Compound::new("Kochsalz", "NaCl"));
        let pool = FormulaPool::build(&catalog);
        // NaCl is the only formula not among the decoys
        assert_eq!(pool.len(), DECOY_FORMULAS.len() + 1);
        assert_eq!(pool.as_slice().iter().filter(|f| *f == "NaCl").count(), 1);
    }

    #[test]
    fn test_distractors_exclude_target() {
        let pool = FormulaPool::from_formulas(["NaCl", "KCl", "HCl"]);
        assert_eq!(pool.distractors_for("KCl"), vec!["NaCl", "HCl"]);
        assert_eq!(pool.distractors_for("CO₂").len(), 3);
    }
}
