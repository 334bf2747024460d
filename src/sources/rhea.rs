use crate::archive::TarCompression;
use crate::domain::{DataSourceId, VersionCatalog};
use crate::error::DataSourceError;
use crate::recipe::{ExtractStep, Fetch, FormatSpec, Recipe, TableInput};
use crate::table::ReadOptions;
use crate::transfer::Transfer;

use super::{DataSource, doi, parse_release, release_number};

const PROPERTIES_URL: &str = "https://ftp.expasy.org/databases/rhea/rhea-release.properties";
const OLD_RELEASES_URL: &str = "https://ftp.expasy.org/databases/rhea/old_releases";
const RELEASE_PATTERN: &str = r"rhea\.release\.number=(\d+)";
const FIRST_RELEASE: u32 = 126;
const CITATION: &str = "10.1021/acs.jcim.0c00675";
const SMILES_FILE: &str = "rhea-reaction-smiles.tsv";

/// Rhea reaction SMILES, one archived release per version.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rhea;

impl Rhea {
    pub fn catalog_up_to(latest: u32) -> VersionCatalog {
        (FIRST_RELEASE..=latest)
            .map(|release| (format!("v_release_{release}"), doi(CITATION)))
            .collect()
    }
}

impl DataSource for Rhea {
    fn id(&self) -> DataSourceId {
        DataSourceId::RheaReaction
    }

    fn supported_versions(&self, transfer: &dyn Transfer) -> Result<VersionCatalog, DataSourceError> {
        let properties = transfer.fetch_text(PROPERTIES_URL)?;
        let latest = release_number(RELEASE_PATTERN, &properties, "the Rhea release properties")?;
        Ok(Self::catalog_up_to(latest))
    }

    fn recipe(&self, version: &str) -> Option<Recipe> {
        let release = parse_release(version)?;
        let archive = format!("{release}.tar.bz2");
        Some(
            Recipe::new(
                version,
                vec![Fetch::url(format!("{OLD_RELEASES_URL}/{archive}"), archive.clone())],
                FormatSpec::Tables {
                    inputs: vec![TableInput::new(SMILES_FILE, ReadOptions::tsv().no_header())],
                    provenance: None,
                    rename: vec![("0", "id"), ("1", "reaction_smiles")],
                    post: Vec::new(),
                },
            )
            .with_extracts(vec![ExtractStep::TarMember {
                archive,
                compression: TarCompression::Bzip2,
                member: format!("{release}/tsv/{SMILES_FILE}"),
                output: SMILES_FILE.to_string(),
            }]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_starts_at_release_126() {
        let catalog = Rhea::catalog_up_to(128);
        assert_eq!(
            catalog.versions().collect::<Vec<_>>(),
            vec!["v_release_126", "v_release_127", "v_release_128"]
        );
        assert!(Rhea::catalog_up_to(100).is_empty());
    }

    #[test]
    fn recipe_reads_the_smiles_member() {
        let recipe = Rhea.recipe("v_release_130").unwrap();
        assert_eq!(
            recipe.downloads[0].source,
            crate::recipe::UrlSource::Static(
                "https://ftp.expasy.org/databases/rhea/old_releases/130.tar.bz2".to_string()
            )
        );
        assert_matches::assert_matches!(
            &recipe.extracts[0],
            ExtractStep::TarMember { member, .. } if member == "130/tsv/rhea-reaction-smiles.tsv"
        );
    }
}
