use crate::domain::{DataSourceId, VersionCatalog};
use crate::error::DataSourceError;
use crate::recipe::{ExtractStep, Fetch, FormatSpec, Recipe};
use crate::transfer::Transfer;

use super::reaction_misc::{ORDERLY_VERSIONS, orderly_recipe};
use super::{DataSource, doi};

const CITATION: &str = "10.1021/jacs.1c09820";

/// (version, archive URL, directory inside the archive)
const RELEASES: [(&str, &str, &str); 2] = [
    (
        "v_release_0_1_0",
        "https://github.com/open-reaction-database/ord-data/archive/refs/tags/v0.1.0.zip",
        "ord-data-0.1.0",
    ),
    (
        "v_release_main",
        "https://github.com/open-reaction-database/ord-data/archive/refs/heads/main.zip",
        "ord-data-main",
    ),
];

/// Open Reaction Database snapshots and the ORDerly derivatives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ord;

impl DataSource for Ord {
    fn id(&self) -> DataSourceId {
        DataSourceId::OrdReaction
    }

    fn supported_versions(&self, _transfer: &dyn Transfer) -> Result<VersionCatalog, DataSourceError> {
        let mut catalog: VersionCatalog = RELEASES
            .iter()
            .map(|(version, ..)| (*version, doi(CITATION)))
            .collect();
        for (version, citation) in ORDERLY_VERSIONS {
            catalog.insert(version, doi(citation));
        }
        Ok(catalog)
    }

    fn recipe(&self, version: &str) -> Option<Recipe> {
        if let Some(recipe) = orderly_recipe(version) {
            return Some(recipe);
        }
        let (_, url, directory) = RELEASES.iter().find(|(name, ..)| *name == version)?;
        let archive = format!("{directory}.zip");
        let data = format!("{directory}/data");
        Some(
            Recipe::new(
                version,
                vec![Fetch::url(*url, archive.clone())],
                FormatSpec::OrdDatasets { root: data.clone() },
            )
            .with_extracts(vec![ExtractStep::ZipPrefix {
                archive,
                prefix: data,
            }]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::Transfer;

    struct Offline;

    impl Transfer for Offline {
        fn download_file(
            &self,
            _url: &str,
            _file_name: &str,
            _output_dir: &std::path::Path,
        ) -> Result<std::path::PathBuf, DataSourceError> {
            unreachable!()
        }

        fn fetch_text(&self, _url: &str) -> Result<String, DataSourceError> {
            unreachable!()
        }

        fn fetch_json(&self, _url: &str) -> Result<serde_json::Value, DataSourceError> {
            unreachable!()
        }
    }

    #[test]
    fn every_version_has_a_recipe() {
        let catalog = Ord.supported_versions(&Offline).unwrap();
        assert_eq!(catalog.len(), 5);
        for version in catalog.versions() {
            assert!(Ord.recipe(version).is_some(), "{version}");
        }
    }

    #[test]
    fn release_reads_the_data_directory() {
        let recipe = Ord.recipe("v_release_main").unwrap();
        assert_eq!(
            recipe.format,
            FormatSpec::OrdDatasets {
                root: "ord-data-main/data".to_string()
            }
        );
    }
}
