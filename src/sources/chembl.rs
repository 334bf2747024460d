use crate::domain::{DataSourceId, VersionCatalog};
use crate::error::DataSourceError;
use crate::recipe::{ExtractStep, Fetch, FormatSpec, Recipe};
use crate::table::ReadOptions;
use crate::transfer::Transfer;

use super::{DataSource, doi, parse_release, release_number};

const README_URL: &str = "https://ftp.ebi.ac.uk/pub/databases/chembl/ChEMBLdb/latest/README";
const RELEASES_URL: &str = "https://ftp.ebi.ac.uk/pub/databases/chembl/ChEMBLdb/releases";
const RELEASE_PATTERN: &str = r"Release:\s*chembl_(\d+)";
const FIRST_RELEASE: u32 = 25;

/// ChEMBL chemical representations, one release per version.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chembl;

impl Chembl {
    pub fn catalog_up_to(latest: u32) -> VersionCatalog {
        (FIRST_RELEASE..=latest)
            .map(|release| {
                (
                    format!("v_release_{release}"),
                    doi(&format!("10.6019/CHEMBL.database.{release}")),
                )
            })
            .collect()
    }
}

impl DataSource for Chembl {
    fn id(&self) -> DataSourceId {
        DataSourceId::ChemblCompound
    }

    fn supported_versions(&self, transfer: &dyn Transfer) -> Result<VersionCatalog, DataSourceError> {
        let readme = transfer.fetch_text(README_URL)?;
        let latest = release_number(RELEASE_PATTERN, &readme, "the ChEMBL README")?;
        Ok(Self::catalog_up_to(latest))
    }

    fn recipe(&self, version: &str) -> Option<Recipe> {
        let release = parse_release(version)?;
        let archive = format!("chembl_{release}_chemreps.txt.gz");
        let table = format!("chembl_{release}_chemreps.txt");
        Some(
            Recipe::new(
                version,
                vec![Fetch::url(
                    format!("{RELEASES_URL}/chembl_{release}/{archive}"),
                    archive.clone(),
                )],
                FormatSpec::passthrough(table.clone(), ReadOptions::tsv()),
            )
            .with_extracts(vec![ExtractStep::gunzip(archive, table)]),
        )
    }
}
