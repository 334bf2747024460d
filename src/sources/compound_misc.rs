use crate::domain::{DataSourceId, VersionCatalog};
use crate::error::DataSourceError;
use crate::recipe::{Fetch, FormatSpec, Recipe};
use crate::table::ReadOptions;
use crate::transfer::Transfer;

use super::{DataSource, catalog, doi};

const MOSES: &str = "v_moses_by_20201218_polykovskiy_d_et_al";

#[derive(Debug, Clone, Copy, Default)]
pub struct CompoundMiscellaneous;

impl DataSource for CompoundMiscellaneous {
    fn id(&self) -> DataSourceId {
        DataSourceId::MiscellaneousCompound
    }

    fn supported_versions(&self, _transfer: &dyn Transfer) -> Result<VersionCatalog, DataSourceError> {
        Ok(catalog(&[(MOSES, doi("10.3389/fphar.2020.565644"))]))
    }

    fn recipe(&self, version: &str) -> Option<Recipe> {
        match version {
            MOSES => Some(Recipe::new(
                version,
                vec![Fetch::named(
                    "https://media.githubusercontent.com/media/molecularsets/moses/master/data/dataset_v1.csv",
                )],
                FormatSpec::passthrough("dataset_v1.csv", ReadOptions::csv()),
            )),
            _ => None,
        }
    }
}
