//! Effort lookup: how costly it is to improve a dimension
//!
//! | Dimension | Default effort |
//! |-----------|----------------|
//! | seo | low |
//! | structured-data | low |
//! | aeo | medium |
//! | content | medium |
//! | technical | medium |
//! | link-profile | high |
//!
//! Every entry can be overridden from `[analysis.effort]`.

use crate::model::{Dimension, Effort};
use std::collections::BTreeMap;

/// Dimension to effort table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffortPolicy {
    table: BTreeMap<Dimension, Effort>,
}

impl EffortPolicy {
    /// Applies overrides keyed by dimension name; unknown names are ignored
    /// (configuration validation rejects them earlier)
    pub fn with_overrides(overrides: &BTreeMap<String, Effort>) -> Self {
        let mut policy = Self::default();
        for (name, effort) in overrides {
            if let Some(dimension) = Dimension::from_name(name) {
                policy.table.insert(dimension, *effort);
            }
        }
        policy
    }

    pub fn effort_for(&self, dimension: Dimension) -> Effort {
        self.table
            .get(&dimension)
            .copied()
            .unwrap_or(Effort::Medium)
    }
}

impl Default for EffortPolicy {
    fn default() -> Self {
        let table = BTreeMap::from([
            (Dimension::Seo, Effort::Low),
            (Dimension::StructuredData, Effort::Low),
            (Dimension::Aeo, Effort::Medium),
            (Dimension::Content, Effort::Medium),
            (Dimension::Technical, Effort::Medium),
            (Dimension::LinkProfile, Effort::High),
        ]);
        Self { table }
    }
}
