//! Classification predicates: coarse energy categories and the area →
//! continent lookup. Pure functions of a row's text fields, no ambient state.

/// Coarse category for an energy row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnergyKind {
    Renewable,
    Fossil,
}

/// Canonical keyword table. A variable or subcategory containing any of
/// these substrings (case-insensitive) classifies the row.
pub const RENEWABLE_KEYWORDS: &[&str] = &["clean", "hydro", "wind", "solar", "bio", "renew"];
pub const FOSSIL_KEYWORDS: &[&str] = &["fossil", "coal", "gas", "oil"];

/// Keyword-based classifier over a row's text fields.
///
/// Rules are mutually exclusive and ordered: the renewable rule is tested
/// first, so "biogas" lands in renewable even though it also contains "gas".
/// A row matching neither rule classifies to `None`; such rows stay out of
/// category sums but still count toward category-agnostic aggregates.
#[derive(Debug, Clone)]
pub struct Classifier {
    renewable: Vec<String>,
    fossil: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(RENEWABLE_KEYWORDS, FOSSIL_KEYWORDS)
    }
}

impl Classifier {
    pub fn new(renewable: &[&str], fossil: &[&str]) -> Self {
        let lower = |kws: &[&str]| kws.iter().map(|k| k.to_lowercase()).collect();
        Self { renewable: lower(renewable), fossil: lower(fossil) }
    }

    pub fn classify(&self, variable: &str, subcategory: &str) -> Option<EnergyKind> {
        let v = variable.to_lowercase();
        let s = subcategory.to_lowercase();
        let hits = |kws: &[String]| kws.iter().any(|k| v.contains(k) || s.contains(k));
        if hits(&self.renewable) {
            Some(EnergyKind::Renewable)
        } else if hits(&self.fossil) {
            Some(EnergyKind::Fossil)
        } else {
            None
        }
    }
}

/// Canonical area → continent table (World Bank country spellings).
/// Areas outside the table map to `None` and drop out of continent-grouped
/// series only.
pub fn continent_of(area: &str) -> Option<&'static str> {
    let continent = match area {
        "United States" | "Canada" | "Mexico" | "Brazil" | "Argentina" | "Chile"
        | "Colombia" | "Peru" => "Americas",
        "Germany" | "France" | "United Kingdom" | "Italy" | "Spain" | "Poland"
        | "Netherlands" | "Sweden" => "Europe",
        "China" | "India" | "Japan" | "Korea, Rep." | "Indonesia" | "Thailand"
        | "Viet Nam" | "Malaysia" => "Asia",
        "Egypt, Arab Rep." | "Nigeria" | "Kenya" | "South Africa" => "Africa",
        "Australia" | "New Zealand" => "Oceania",
        _ => return None,
    };
    Some(continent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_insensitive() {
        let c = Classifier::default();
        assert_eq!(c.classify("Solar", ""), Some(EnergyKind::Renewable));
        assert_eq!(c.classify("COAL", ""), Some(EnergyKind::Fossil));
        assert_eq!(c.classify("Nuclear", ""), None);
    }

    #[test]
    fn renewable_rule_wins_on_ambiguity() {
        let c = Classifier::default();
        // "biogas" contains both "bio" and "gas"; first rule wins.
        assert_eq!(c.classify("Biogas", ""), Some(EnergyKind::Renewable));
    }

    #[test]
    fn subcategory_is_consulted_too() {
        let c = Classifier::default();
        assert_eq!(c.classify("Electricity", "Hydro"), Some(EnergyKind::Renewable));
    }

    #[test]
    fn continent_table_covers_world_bank_spellings() {
        assert_eq!(continent_of("Korea, Rep."), Some("Asia"));
        assert_eq!(continent_of("Egypt, Arab Rep."), Some("Africa"));
        assert_eq!(continent_of("Atlantis"), None);
    }
}
