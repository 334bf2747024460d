use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DataSourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Category {
    Compound,
    Reaction,
    ReactionRule,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Compound, Category::Reaction, Category::ReactionRule];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Compound => "compound",
            Category::Reaction => "reaction",
            Category::ReactionRule => "reaction_rule",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = DataSourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compound" => Ok(Category::Compound),
            "reaction" => Ok(Category::Reaction),
            "reaction_rule" => Ok(Category::ReactionRule),
            _ => Err(DataSourceError::InvalidCategory(value.to_string())),
        }
    }
}

/// Every upstream archive the crate knows how to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSourceId {
    ChemblCompound,
    MiscellaneousCompound,
    Zinc20Compound,
    CrdReaction,
    MiscellaneousReaction,
    OrdReaction,
    RheaReaction,
    UsptoReaction,
    MiscellaneousReactionRule,
    RetroRulesReactionRule,
}

const REGISTRY: [(Category, &str, DataSourceId); 10] = [
    (Category::Compound, "chembl", DataSourceId::ChemblCompound),
    (Category::Compound, "miscellaneous", DataSourceId::MiscellaneousCompound),
    (Category::Compound, "zinc20", DataSourceId::Zinc20Compound),
    (Category::Reaction, "crd", DataSourceId::CrdReaction),
    (Category::Reaction, "miscellaneous", DataSourceId::MiscellaneousReaction),
    (Category::Reaction, "ord", DataSourceId::OrdReaction),
    (Category::Reaction, "rhea", DataSourceId::RheaReaction),
    (Category::Reaction, "uspto", DataSourceId::UsptoReaction),
    (Category::ReactionRule, "miscellaneous", DataSourceId::MiscellaneousReactionRule),
    (Category::ReactionRule, "retro_rules", DataSourceId::RetroRulesReactionRule),
];

impl DataSourceId {
    pub fn resolve(category: Category, name: &str) -> Result<Self, DataSourceError> {
        let normalized = name.trim().to_ascii_lowercase();
        REGISTRY
            .iter()
            .find(|(entry_category, entry_name, _)| {
                *entry_category == category && *entry_name == normalized
            })
            .map(|(_, _, id)| *id)
            .ok_or_else(|| DataSourceError::UnknownDataSource {
                category: category.to_string(),
                name: name.to_string(),
            })
    }

    pub fn names_in(category: Category) -> Vec<&'static str> {
        REGISTRY
            .iter()
            .filter(|(entry_category, _, _)| *entry_category == category)
            .map(|(_, name, _)| *name)
            .collect()
    }

    pub fn category(&self) -> Category {
        REGISTRY
            .iter()
            .find(|(_, _, id)| id == self)
            .map(|(category, _, _)| *category)
            .unwrap_or(Category::Compound)
    }

    pub fn name(&self) -> &'static str {
        REGISTRY
            .iter()
            .find(|(_, _, id)| id == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("miscellaneous")
    }

    /// Slug used in output file names.
    pub fn slug(&self) -> &'static str {
        self.name()
    }

    pub fn label(&self) -> &'static str {
        match self {
            DataSourceId::ChemblCompound => "ChEMBL chemical compound database",
            DataSourceId::MiscellaneousCompound => "miscellaneous chemical compound data source",
            DataSourceId::Zinc20Compound => "ZINC20 chemical compound database",
            DataSourceId::CrdReaction => "Chemical Reaction Database (CRD)",
            DataSourceId::MiscellaneousReaction => "miscellaneous chemical reaction data source",
            DataSourceId::OrdReaction => "Open Reaction Database (ORD)",
            DataSourceId::RheaReaction => "Rhea chemical reaction database",
            DataSourceId::UsptoReaction => {
                "United States Patent and Trademark Office (USPTO) chemical reaction dataset"
            }
            DataSourceId::MiscellaneousReactionRule => {
                "miscellaneous chemical reaction rule data source"
            }
            DataSourceId::RetroRulesReactionRule => "RetroRules chemical reaction rule database",
        }
    }
}

impl fmt::Display for DataSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category(), self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Download,
    Extract,
    Format,
}

impl Stage {
    pub fn noun(&self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::Extract => "extraction",
            Stage::Format => "formatting",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.noun())
    }
}

/// Version descriptor to citation URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VersionCatalog(BTreeMap<String, String>);

impl VersionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, version: impl Into<String>, citation: impl Into<String>) {
        self.0.insert(version.into(), citation.into());
    }

    pub fn contains(&self, version: &str) -> bool {
        self.0.contains_key(version)
    }

    pub fn citation(&self, version: &str) -> Option<&str> {
        self.0.get(version).map(String::as_str)
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VersionCatalog {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
