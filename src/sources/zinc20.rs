use crate::domain::{DataSourceId, VersionCatalog};
use crate::error::DataSourceError;
use crate::recipe::{ExtractStep, Fetch, FormatSpec, Recipe, TableInput};
use crate::table::ReadOptions;
use crate::transfer::Transfer;

use super::{DataSource, captures, doi};

const BUILDING_BLOCKS_URL: &str = "https://files.docking.org/bb/current";
const CATALOGS_URL: &str = "https://files.docking.org/catalogs/source";
const BUILDING_BLOCKS_PREFIX: &str = "v_building_blocks_";
const CATALOG_PREFIX: &str = "v_catalog_";
const CITATION: &str = "10.1021/acs.jcim.0c00675";

/// ZINC20 building-block and catalog subsets, listed from the file server.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zinc20;

impl Zinc20 {
    /// Versions named in the two directory listings.
    pub fn catalog_from_listings(building_blocks: &str, catalogs: &str) -> Result<VersionCatalog, DataSourceError> {
        let mut catalog = VersionCatalog::new();
        for name in captures(r#"href="([^\.]+)\.smi\.gz"#, building_blocks)? {
            catalog.insert(format!("{BUILDING_BLOCKS_PREFIX}{name}"), doi(CITATION));
        }
        for name in captures(r#"href="([^\.]+)\.src\.txt"#, catalogs)? {
            catalog.insert(format!("{CATALOG_PREFIX}{name}"), doi(CITATION));
        }
        Ok(catalog)
    }
}

impl DataSource for Zinc20 {
    fn id(&self) -> DataSourceId {
        DataSourceId::Zinc20Compound
    }

    fn supported_versions(&self, transfer: &dyn Transfer) -> Result<VersionCatalog, DataSourceError> {
        let building_blocks = transfer.fetch_text(&format!("{BUILDING_BLOCKS_URL}/"))?;
        let catalogs = transfer.fetch_text(&format!("{CATALOGS_URL}/"))?;
        Self::catalog_from_listings(&building_blocks, &catalogs)
    }

    fn recipe(&self, version: &str) -> Option<Recipe> {
        let smiles_table = |file: String| FormatSpec::Tables {
            inputs: vec![TableInput::new(file, ReadOptions::whitespace().no_header())],
            provenance: None,
            rename: vec![("0", "smiles"), ("1", "id")],
            post: Vec::new(),
        };
        let label = version.replace('-', "_");

        if let Some(name) = version.strip_prefix(BUILDING_BLOCKS_PREFIX).filter(|name| !name.is_empty()) {
            let archive = format!("{name}.smi.gz");
            let table = format!("{name}.smi");
            return Some(
                Recipe::new(
                    label,
                    vec![Fetch::url(format!("{BUILDING_BLOCKS_URL}/{archive}"), archive.clone())],
                    smiles_table(table.clone()),
                )
                .with_extracts(vec![ExtractStep::gunzip(archive, table)]),
            );
        }
        if let Some(name) = version.strip_prefix(CATALOG_PREFIX).filter(|name| !name.is_empty()) {
            let file = format!("{name}.src.txt");
            return Some(Recipe::new(
                label,
                vec![Fetch::url(format!("{CATALOGS_URL}/{file}"), file.clone())],
                smiles_table(file),
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listings_become_versions() {
        let bb = r#"<a href="in-stock.smi.gz">in-stock.smi.gz</a> <a href="for-sale.smi.gz">x</a>"#;
        let src = r#"<a href="chembl30.src.txt">chembl30.src.txt</a><a href="README">README</a>"#;
        let catalog = Zinc20::catalog_from_listings(bb, src).unwrap();
        let versions: Vec<&str> = catalog.versions().collect();
        assert_eq!(
            versions,
            vec!["v_building_blocks_for-sale", "v_building_blocks_in-stock", "v_catalog_chembl30"]
        );
    }

    #[test]
    fn output_label_replaces_hyphens() {
        let recipe = Zinc20.recipe("v_building_blocks_in-stock").unwrap();
        assert_eq!(recipe.output_label, "v_building_blocks_in_stock");
        assert_eq!(recipe.downloads[0].file_name, "in-stock.smi.gz");
        let recipe = Zinc20.recipe("v_catalog_chembl30").unwrap();
        assert!(recipe.extracts.is_empty());
        assert!(Zinc20.recipe("v_catalog_").is_none());
    }
}
