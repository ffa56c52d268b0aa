//! FILENAME: core/pivot-engine/src/classify.rs
//! Column Classifier - splits host columns into dimensions and measures.
//!
//! The host hands over a flat table with no role metadata, so roles are
//! inferred from column names. A name is a measure when, after
//! normalization, it:
//! 1. contains an aggregation verb as a whole word ("sum", "avg", ...),
//! 2. contains one of the extended keywords anywhere ("suma", "prom", ...),
//! 3. or contains a parenthesized expression ("SUM(Sales)", "AGG(x)").
//!
//! Everything else is a dimension. The rule table is data, so tests and
//! localized deployments can inject their own vocabulary.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::definition::{Column, ColumnRole, FieldIndex};
use crate::text::normalize;

/// Aggregation verbs matched as whole words.
pub const AGGREGATION_VERBS: &[&str] = &[
    "sum", "avg", "count", "min", "max", "median", "stdev", "std", "var",
];

/// Keywords matched as substrings anywhere in the name, localized variants
/// included. Substring matching is broad: "Country" and "Discount" count as
/// measures. Pass `STRICT_KEYWORDS` to `ClassifierRules::new` to limit
/// short verbs to whole words.
pub const EXTENDED_KEYWORDS: &[&str] = &[
    "sum", "suma", "avg", "average", "prom", "min", "max", "count", "conteo", "cnt", "median",
    "var", "stdev", "std", "agg",
];

/// Substring keywords without the short English verbs.
pub const STRICT_KEYWORDS: &[&str] = &["suma", "average", "prom", "conteo", "cnt", "agg"];

/// Compiled classification rules.
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    whole_word: Option<Regex>,
    keywords: Vec<String>,
    parenthesized: Regex,
}

impl ClassifierRules {
    /// Builds rules from a vocabulary (whole-word) and keyword list
    /// (substring). Both are normalized the same way column names are.
    pub fn new<V, K>(vocabulary: &[V], keywords: &[K]) -> Result<Self, regex::Error>
    where
        V: AsRef<str>,
        K: AsRef<str>,
    {
        let words: Vec<String> = vocabulary
            .iter()
            .map(|w| normalize(w.as_ref()))
            .filter(|w| !w.is_empty())
            .map(|w| regex::escape(&w))
            .collect();

        let whole_word = if words.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"\b(?:{})\b", words.join("|")))?)
        };

        let keywords = keywords
            .iter()
            .map(|k| normalize(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();

        Ok(ClassifierRules {
            whole_word,
            keywords,
            parenthesized: Regex::new(r"\(.+\)")?,
        })
    }

    /// Returns true when the column name looks like an aggregate.
    pub fn is_measure(&self, name: &str) -> bool {
        let normalized = normalize(name);

        if let Some(ref re) = self.whole_word {
            if re.is_match(&normalized) {
                return true;
            }
        }

        if self.keywords.iter().any(|k| normalized.contains(k.as_str())) {
            return true;
        }

        self.parenthesized.is_match(&normalized)
    }

    pub fn role_of(&self, name: &str) -> ColumnRole {
        if self.is_measure(name) {
            ColumnRole::Measure
        } else {
            ColumnRole::Dimension
        }
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        ClassifierRules::new(AGGREGATION_VERBS, EXTENDED_KEYWORDS)
            .expect("built-in classifier vocabulary is a valid pattern")
    }
}

/// Column indices split by role, each list in table column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPartition {
    pub dimensions: Vec<FieldIndex>,
    pub measures: Vec<FieldIndex>,
}

/// Partitions column names into dimension and measure indices.
pub fn classify_columns<S: AsRef<str>>(names: &[S], rules: &ClassifierRules) -> ColumnPartition {
    let mut partition = ColumnPartition::default();

    for (i, name) in names.iter().enumerate() {
        match rules.role_of(name.as_ref()) {
            ColumnRole::Dimension => partition.dimensions.push(i),
            ColumnRole::Measure => partition.measures.push(i),
        }
    }

    partition
}

/// Materializes `Column` records for a classified name list.
pub fn build_columns<S: AsRef<str>>(names: &[S], partition: &ColumnPartition) -> Vec<Column> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| Column {
            index,
            name: name.as_ref().to_string(),
            role: if partition.measures.contains(&index) {
                ColumnRole::Measure
            } else {
                ColumnRole::Dimension
            },
        })
        .collect()
}
