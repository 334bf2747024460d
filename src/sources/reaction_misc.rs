use crate::domain::{DataSourceId, VersionCatalog};
use crate::error::DataSourceError;
use crate::recipe::{ExtractStep, Fetch, FormatSpec, PROVENANCE_COLUMN, Recipe};
use crate::table::ReadOptions;
use crate::transfer::Transfer;

use super::reaction_rule_misc::{DINGOS, RETRO_TRANSFORM_DB, dingos_recipe, retro_transform_db_recipe};
use super::{DataSource, doi, figshare_file, zenodo_doi};

const KRAUT: &str = "v_20131008_kraut_h_et_al";
const WEI: &str = "v_20161014_wei_j_n_et_al";
const GRAMBOW: &str = "v_20200508_grambow_c_et_al";
const GRAMBOW_ADD_ON: &str = "v_add_on_by_20200508_grambow_c_et_al";
const GOLDEN_DATASET: &str = "v_golden_dataset_by_20211102_lin_a_et_al";
const RDB7: &str = "v_rdb7_by_20220718_spiekermann_k_et_al";

pub(crate) const ORDERLY_CONDITION: &str = "v_orderly_condition_by_20240422_wigh_d_s_et_al";
pub(crate) const ORDERLY_FORWARD: &str = "v_orderly_forward_by_20240422_wigh_d_s_et_al";
pub(crate) const ORDERLY_RETRO: &str = "v_orderly_retro_by_20240422_wigh_d_s_et_al";

const ORDERLY_CITATION: &str = "10.6084/m9.figshare.23298467.v4";

pub(crate) const ORDERLY_VERSIONS: [(&str, &str); 3] = [
    (ORDERLY_CONDITION, ORDERLY_CITATION),
    (ORDERLY_FORWARD, ORDERLY_CITATION),
    (ORDERLY_RETRO, ORDERLY_CITATION),
];

/// (figshare file id, file name)
const ORDERLY_FILES: [(&str, &str); 8] = [
    ("44413052", "orderly_condition_train.parquet"),
    ("44413040", "orderly_condition_test.parquet"),
    ("44413055", "orderly_condition_with_rare_train.parquet"),
    ("44413043", "orderly_condition_with_rare_test.parquet"),
    ("44413058", "orderly_forward_train.parquet"),
    ("44413046", "orderly_forward_test.parquet"),
    ("44413061", "orderly_retro_train.parquet"),
    ("44413049", "orderly_retro_test.parquet"),
];

const WEI_URL: &str =
    "https://raw.githubusercontent.com/jnwei/neural_reaction_fingerprint/master/data/test_questions";

/// Single-publication reaction datasets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactionMiscellaneous;

impl DataSource for ReactionMiscellaneous {
    fn id(&self) -> DataSourceId {
        DataSourceId::MiscellaneousReaction
    }

    fn supported_versions(&self, _transfer: &dyn Transfer) -> Result<VersionCatalog, DataSourceError> {
        let mut catalog: VersionCatalog = [
            (KRAUT, doi("10.1021/ci400442f")),
            (WEI, doi("10.1021/acscentsci.6b00219")),
            (RETRO_TRANSFORM_DB, zenodo_doi("1209312")),
            (DINGOS, doi("10.24433/CO.6930970.v1")),
            (GRAMBOW, zenodo_doi("3581266")),
            (GRAMBOW_ADD_ON, zenodo_doi("3731553")),
            (GOLDEN_DATASET, doi("10.1002/minf.202100138")),
            (RDB7, zenodo_doi("5652097")),
        ]
        .into_iter()
        .collect();
        for (version, citation) in ORDERLY_VERSIONS {
            catalog.insert(version, doi(citation));
        }
        Ok(catalog)
    }

    fn recipe(&self, version: &str) -> Option<Recipe> {
        let recipe = match version {
            KRAUT => Recipe::new(
                version,
                vec![Fetch::url("https://ndownloader.figstatic.com/files/3988891", "ci400442f_si_002.zip")],
                FormatSpec::ReactionBlocks {
                    files: [
                        "MapTestExamplesV1.0.rdf",
                        "MapTestExamplesV1_ICMapRctCpy.rdf",
                        "MapTestExamplesV1_ICMap.rdf",
                    ]
                    .map(String::from)
                    .to_vec(),
                    provenance: Some(PROVENANCE_COLUMN),
                },
            )
            .with_extracts(vec![ExtractStep::ZipAll {
                archive: "ci400442f_si_002.zip".to_string(),
            }]),
            WEI => {
                let files = ["Wade8_47.ans_smi.txt", "Wade8_48.ans_smi.txt"];
                Recipe::new(
                    version,
                    files
                        .iter()
                        .map(|file| Fetch::url(format!("{WEI_URL}/{file}"), *file))
                        .collect(),
                    FormatSpec::tagged(
                        files,
                        ReadOptions::csv().no_header(),
                        vec![("0", "reaction_smiles")],
                    ),
                )
            }
            RETRO_TRANSFORM_DB => retro_transform_db_recipe(),
            DINGOS => dingos_recipe(),
            GRAMBOW => zenodo_tables(version, "3715478", &["b97d3.csv", "wb97xd3.csv"]),
            GRAMBOW_ADD_ON => zenodo_tables(version, "3731554", &["b97d3_rad.csv", "wb97xd3_rad.csv"]),
            GOLDEN_DATASET => Recipe::new(
                version,
                vec![Fetch::named(
                    "https://github.com/Laboratoire-de-Chemoinformatique/Reaction_Data_Cleaning/raw/master/data/golden_dataset.zip",
                )],
                FormatSpec::ReactionBlocks {
                    files: vec!["golden_dataset.rdf".to_string()],
                    provenance: None,
                },
            )
            .with_extracts(vec![ExtractStep::ZipAll {
                archive: "golden_dataset.zip".to_string(),
            }]),
            RDB7 => zenodo_tables(
                version,
                "6618262",
                &["b97d3.csv", "wb97xd3.csv", "ccsdtf12_dz.csv", "ccsdtf12_tz.csv"],
            ),
            _ => return orderly_recipe(version),
        };
        Some(recipe)
    }
}

fn zenodo_tables(version: &str, record: &str, files: &[&str]) -> Recipe {
    Recipe::new(
        version,
        files
            .iter()
            .map(|file| Fetch::named(format!("https://zenodo.org/records/{record}/files/{file}")))
            .collect(),
        FormatSpec::tagged(files.iter().copied(), ReadOptions::csv(), Vec::new()),
    )
}

/// ORDerly parquet splits. Served by both the ORD and the miscellaneous
/// reaction sources.
pub(crate) fn orderly_recipe(version: &str) -> Option<Recipe> {
    let prefix = match version {
        ORDERLY_CONDITION => "orderly_condition_",
        ORDERLY_FORWARD => "orderly_forward_",
        ORDERLY_RETRO => "orderly_retro_",
        _ => return None,
    };
    let files: Vec<(&str, &str)> = ORDERLY_FILES
        .iter()
        .copied()
        .filter(|(_, name)| name.starts_with(prefix))
        .collect();
    Some(Recipe::new(
        version,
        files
            .iter()
            .map(|(id, name)| Fetch::url(figshare_file(id), *name))
            .collect(),
        FormatSpec::ParquetFiles {
            files: files.iter().map(|(_, name)| name.to_string()).collect(),
            provenance: Some(PROVENANCE_COLUMN),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orderly_splits_by_task() {
        let condition = orderly_recipe(ORDERLY_CONDITION).unwrap();
        assert_eq!(condition.downloads.len(), 4);
        let retro = orderly_recipe(ORDERLY_RETRO).unwrap();
        assert_eq!(
            retro.downloads,
            vec![
                Fetch::url("https://figshare.com/ndownloader/files/44413061", "orderly_retro_train.parquet"),
                Fetch::url("https://figshare.com/ndownloader/files/44413049", "orderly_retro_test.parquet"),
            ]
        );
        assert!(orderly_recipe("v_orderly").is_none());
    }

    #[test]
    fn kraut_reads_three_rdf_files() {
        let recipe = ReactionMiscellaneous.recipe(KRAUT).unwrap();
        assert_matches::assert_matches!(
            recipe.format,
            FormatSpec::ReactionBlocks { files, provenance: Some("file_name") } if files.len() == 3
        );
    }
}
