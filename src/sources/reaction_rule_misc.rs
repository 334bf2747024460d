use crate::domain::{DataSourceId, VersionCatalog};
use crate::error::DataSourceError;
use crate::recipe::{Fetch, FormatSpec, PostStep, Recipe, TableInput};
use crate::table::ReadOptions;
use crate::transfer::Transfer;

use super::{DataSource, catalog, doi, zenodo_doi};

pub(crate) const RETRO_TRANSFORM_DB: &str = "v_retro_transform_db_by_20180421_avramova_s_et_al";
pub(crate) const DINGOS: &str = "v_dingos_by_20190701_button_a_et_al";

#[derive(Debug, Clone, Copy, Default)]
pub struct ReactionRuleMiscellaneous;

impl DataSource for ReactionRuleMiscellaneous {
    fn id(&self) -> DataSourceId {
        DataSourceId::MiscellaneousReactionRule
    }

    fn supported_versions(&self, _transfer: &dyn Transfer) -> Result<VersionCatalog, DataSourceError> {
        Ok(catalog(&[
            (RETRO_TRANSFORM_DB, zenodo_doi("1209312")),
            (DINGOS, doi("10.24433/CO.6930970.v1")),
        ]))
    }

    fn recipe(&self, version: &str) -> Option<Recipe> {
        match version {
            RETRO_TRANSFORM_DB => Some(retro_transform_db_recipe()),
            DINGOS => Some(dingos_recipe()),
            _ => None,
        }
    }
}

/// Tab separated rule table; blank lines dropped and `ID` kept integral.
pub(crate) fn retro_transform_db_recipe() -> Recipe {
    Recipe::new(
        RETRO_TRANSFORM_DB,
        vec![Fetch::named("https://zenodo.org/records/1209313/files/RetroTransformDB-v-1-0.txt")],
        FormatSpec::Tables {
            inputs: vec![TableInput::new("RetroTransformDB-v-1-0.txt", ReadOptions::tsv())],
            provenance: None,
            rename: Vec::new(),
            post: vec![PostStep::DropEmptyRows, PostStep::IntegerColumn("ID")],
        },
    )
}

pub(crate) fn dingos_recipe() -> Recipe {
    Recipe::new(
        DINGOS,
        vec![Fetch::named(
            "https://raw.githubusercontent.com/neo-chem-synth-wave/data-source/main/data/reaction_rule/miscellaneous_v_dingos_by_20190701_button_a_et_al/rxn_set.txt",
        )],
        FormatSpec::Tables {
            inputs: vec![TableInput::new("rxn_set.txt", ReadOptions::delimited(b'|').no_header())],
            provenance: None,
            rename: vec![
                ("0", "reaction_name"),
                ("1", "reaction_smarts"),
                ("2", "reaction_label"),
            ],
            post: Vec::new(),
        },
    )
}
