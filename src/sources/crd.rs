use crate::domain::{DataSourceId, VersionCatalog};
use crate::error::DataSourceError;
use crate::recipe::{Fetch, FormatSpec, Recipe, TableInput};
use crate::table::ReadOptions;
use crate::transfer::Transfer;

use super::{DataSource, doi, figshare_file};

/// (version, citation DOI, figshare file id, file name)
const RELEASES: [(&str, &str, &str, &str); 3] = [
    (
        "v_reaction_smiles_2001_to_2021",
        "10.6084/m9.figshare.20279733.v1",
        "36222051",
        "reactionSmilesFigShare.txt",
    ),
    (
        "v_reaction_smiles_2001_to_2023",
        "10.6084/m9.figshare.22491730.v1",
        "39944236",
        "reactionSmilesFigShare2023.txt",
    ),
    (
        "v_reaction_smiles_2023",
        "10.6084/m9.figshare.24921555.v1",
        "43858050",
        "reactionSmilesFigShareUSPTO2023.txt",
    ),
];

/// Chemical Reaction Database reaction SMILES dumps.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crd;

impl DataSource for Crd {
    fn id(&self) -> DataSourceId {
        DataSourceId::CrdReaction
    }

    fn supported_versions(&self, _transfer: &dyn Transfer) -> Result<VersionCatalog, DataSourceError> {
        Ok(RELEASES
            .iter()
            .map(|(version, citation, _, _)| (*version, doi(citation)))
            .collect())
    }

    fn recipe(&self, version: &str) -> Option<Recipe> {
        let (_, _, file_id, file_name) = RELEASES.iter().find(|(name, ..)| *name == version)?;
        Some(Recipe::new(
            version,
            vec![Fetch::url(figshare_file(file_id), *file_name)],
            FormatSpec::Tables {
                inputs: vec![TableInput::new(*file_name, ReadOptions::csv().no_header())],
                provenance: None,
                rename: vec![("0", "reaction_smiles")],
                post: Vec::new(),
            },
        ))
    }
}
