//! Per-archive version tables.
//!
//! Each data source maps version strings to citations and recipes. The
//! version set of ChEMBL, Rhea and ZINC20 is discovered over the network.

mod chembl;
mod compound_misc;
mod crd;
mod ord;
mod reaction_misc;
mod reaction_rule_misc;
mod retro_rules;
mod rhea;
mod uspto;
mod zinc20;

pub use chembl::Chembl;
pub use compound_misc::CompoundMiscellaneous;
pub use crd::Crd;
pub use ord::Ord;
pub use reaction_misc::ReactionMiscellaneous;
pub use reaction_rule_misc::ReactionRuleMiscellaneous;
pub use retro_rules::RetroRules;
pub use rhea::Rhea;
pub use uspto::Uspto;
pub use zinc20::Zinc20;

use regex::Regex;

use crate::domain::{DataSourceId, VersionCatalog};
use crate::error::DataSourceError;
use crate::recipe::Recipe;
use crate::transfer::Transfer;

pub trait DataSource: Send + Sync {
    fn id(&self) -> DataSourceId;

    fn supported_versions(&self, transfer: &dyn Transfer) -> Result<VersionCatalog, DataSourceError>;

    /// The recipe of a version, or `None` when the version is unknown.
    fn recipe(&self, version: &str) -> Option<Recipe>;
}

pub fn data_source_for(id: DataSourceId) -> Box<dyn DataSource> {
    match id {
        DataSourceId::ChemblCompound => Box::new(Chembl),
        DataSourceId::MiscellaneousCompound => Box::new(CompoundMiscellaneous),
        DataSourceId::Zinc20Compound => Box::new(Zinc20),
        DataSourceId::CrdReaction => Box::new(Crd),
        DataSourceId::MiscellaneousReaction => Box::new(ReactionMiscellaneous),
        DataSourceId::OrdReaction => Box::new(Ord),
        DataSourceId::RheaReaction => Box::new(Rhea),
        DataSourceId::UsptoReaction => Box::new(Uspto),
        DataSourceId::MiscellaneousReactionRule => Box::new(ReactionRuleMiscellaneous),
        DataSourceId::RetroRulesReactionRule => Box::new(RetroRules),
    }
}

pub(crate) fn doi(suffix: &str) -> String {
    format!("https://doi.org/{suffix}")
}

pub(crate) fn zenodo_doi(record: &str) -> String {
    format!("https://zenodo.org/doi/10.5281/zenodo.{record}")
}

pub(crate) fn figshare_file(file_id: &str) -> String {
    format!("https://figshare.com/ndownloader/files/{file_id}")
}

pub(crate) fn catalog(entries: &[(&str, String)]) -> VersionCatalog {
    entries
        .iter()
        .map(|(version, citation)| (version.to_string(), citation.clone()))
        .collect()
}

/// Every first capture group of `pattern` in `text`, in order of appearance.
pub(crate) fn captures(pattern: &str, text: &str) -> Result<Vec<String>, DataSourceError> {
    let regex = Regex::new(pattern).map_err(|err| DataSourceError::Resolution(err.to_string()))?;
    Ok(regex
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|found| found.as_str().to_string())
        .collect())
}

/// The number in a `Release: chembl_36` style marker.
pub(crate) fn release_number(
    pattern: &str,
    text: &str,
    what: &str,
) -> Result<u32, DataSourceError> {
    captures(pattern, text)?
        .first()
        .and_then(|number| number.parse().ok())
        .ok_or_else(|| DataSourceError::Resolution(format!("no release number found in {what}")))
}

/// `v_release_{n}` back to `n`.
pub(crate) fn parse_release(version: &str) -> Option<u32> {
    version.strip_prefix("v_release_")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;

    #[test]
    fn every_identifier_has_a_source() {
        for category in Category::ALL {
            for name in DataSourceId::names_in(category) {
                let id = DataSourceId::resolve(category, name).unwrap();
                assert_eq!(data_source_for(id).id(), id);
            }
        }
    }

    #[test]
    fn release_numbers_parse() {
        assert_eq!(parse_release("v_release_33"), Some(33));
        assert_eq!(parse_release("v_release_main"), None);
        assert_eq!(
            release_number(r"rhea\.release\.number=(\d+)", "rhea.release.number=135\n", "x").unwrap(),
            135
        );
        assert!(release_number(r"rhea\.release\.number=(\d+)", "", "x").is_err());
    }
}
