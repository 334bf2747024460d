use crate::domain::{DataSourceId, VersionCatalog};
use crate::error::DataSourceError;
use crate::recipe::{ExtractStep, Fetch, FormatSpec, Recipe, TableInput};
use crate::table::ReadOptions;
use crate::transfer::Transfer;

use super::{DataSource, doi, figshare_file};

const LOWE_2013_RSMI: &str = "v_1976_to_2013_rsmi_by_20121009_lowe_d_m";
const SCHNEIDER_2014: &str = "v_50k_by_20141226_schneider_n_et_al";
const SCHNEIDER_2016: &str = "v_50k_by_20161122_schneider_n_et_al";
const COLEY_15K: &str = "v_15k_by_20170418_coley_c_w_et_al";
const LOWE_2016_CML: &str = "v_1976_to_2016_cml_by_20121009_lowe_d_m";
const LOWE_2016_RSMI: &str = "v_1976_to_2016_rsmi_by_20121009_lowe_d_m";
const LIU_50K: &str = "v_50k_by_20170905_liu_b_et_al";
const COLEY_50K: &str = "v_50k_by_20171116_coley_c_w_et_al";
const JIN_480K: &str = "v_480k_or_mit_by_20171204_jin_w_et_al";
const SCHWALLER_480K: &str = "v_480k_or_mit_by_20180622_schwaller_p_et_al";
const SCHWALLER_STEREO: &str = "v_stereo_by_20180622_schwaller_p_et_al";
const BRADSHAW_LEF: &str = "v_lef_by_20181221_bradshaw_j_et_al";
const SCHWALLER_1K_TPL: &str = "v_1k_tpl_by_20210128_schwaller_p_et_al";
const SCHWALLER_REMAPPED: &str = "v_1976_to_2016_by_20210407_schwaller_p_et_al";
const CHEN_FULL: &str = "v_1976_to_2016_by_20240313_chen_s_et_al";
const CHEN_50K: &str = "v_50k_by_20240313_chen_s_et_al";
const CHEN_MECH_31K: &str = "v_mech_31k_by_20240810_chen_s_et_al";

const LOWE_2013_CITATION: &str = "10.6084/m9.figshare.12084729.v1";
const LOWE_2016_CITATION: &str = "10.6084/m9.figshare.5104873.v1";
const SCHWALLER_2018_CITATION: &str = "10.1039/C8SC02339E";
const CHEN_2024_CITATION: &str = "10.6084/m9.figshare.25046471.v1";

const SPLITS: [&str; 3] = ["train", "valid", "test"];

const REXGEN_URL: &str = "https://raw.githubusercontent.com/wengong-jin/nips17-rexgen/master";
const SEQ2SEQ_URL: &str =
    "https://raw.githubusercontent.com/pandegroup/reaction_prediction_seq2seq/master/processed_data";

/// Reactions text-mined from United States patents and their curated subsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uspto;

impl DataSource for Uspto {
    fn id(&self) -> DataSourceId {
        DataSourceId::UsptoReaction
    }

    fn supported_versions(&self, _transfer: &dyn Transfer) -> Result<VersionCatalog, DataSourceError> {
        Ok([
            (LOWE_2013_RSMI, doi(LOWE_2013_CITATION)),
            (SCHNEIDER_2014, doi("10.1021/ci5006614")),
            (SCHNEIDER_2016, doi("10.1021/acs.jcim.6b00564")),
            (COLEY_15K, doi("10.1021/acscentsci.7b00064")),
            (LOWE_2016_CML, doi(LOWE_2016_CITATION)),
            (LOWE_2016_RSMI, doi(LOWE_2016_CITATION)),
            (LIU_50K, doi("10.1021/acscentsci.7b00303")),
            (COLEY_50K, doi("10.1021/acscentsci.7b00355")),
            (JIN_480K, doi("10.48550/arXiv.1709.04555")),
            (SCHWALLER_480K, doi(SCHWALLER_2018_CITATION)),
            (SCHWALLER_STEREO, doi(SCHWALLER_2018_CITATION)),
            (BRADSHAW_LEF, "https://openreview.net/forum?id=r1x4BnCqKX".to_string()),
            (SCHWALLER_1K_TPL, doi("10.1038/s42256-020-00284-w")),
            (SCHWALLER_REMAPPED, doi("10.1126/sciadv.abe4166")),
            (CHEN_FULL, doi(CHEN_2024_CITATION)),
            (CHEN_50K, doi(CHEN_2024_CITATION)),
            (CHEN_MECH_31K, doi("10.6084/m9.figshare.24797220.v2")),
        ]
        .into_iter()
        .collect())
    }

    fn recipe(&self, version: &str) -> Option<Recipe> {
        let recipe = match version {
            LOWE_2013_RSMI => lowe_rsmi_2013(),
            SCHNEIDER_2014 => schneider_2014(),
            SCHNEIDER_2016 => {
                let archive = "ci6b00564_si_002.zip";
                Recipe::new(
                    version,
                    vec![Fetch::url("https://ndownloader.figstatic.com/files/7005749", archive)],
                    FormatSpec::tagged(["dataSetA.csv", "dataSetB.csv"], ReadOptions::csv(), Vec::new()),
                )
                .with_extracts(vec![
                    ExtractStep::zip_member(archive, "data/dataSetA.csv"),
                    ExtractStep::zip_member(archive, "data/dataSetB.csv"),
                ])
            }
            COLEY_15K => rexgen_splits(version, "USPTO-15K"),
            LOWE_2016_CML => {
                let archives = [
                    ("8664364", "1976_Sep2016_USPTOgrants_cml.7z"),
                    ("8664367", "2001_Sep2016_USPTOapplications_cml.7z"),
                ];
                Recipe::new(
                    version,
                    figshare_fetches(&archives),
                    FormatSpec::UsptoCml {
                        roots: vec!["grants".to_string(), "applications".to_string()],
                    },
                )
                .with_extracts(seven_zip_all(&archives))
            }
            LOWE_2016_RSMI => {
                let archives = [
                    ("8664379", "1976_Sep2016_USPTOgrants_smiles.7z"),
                    ("8664370", "2001_Sep2016_USPTOapplications_smiles.7z"),
                ];
                Recipe::new(
                    version,
                    figshare_fetches(&archives),
                    FormatSpec::Tables {
                        inputs: [
                            "1976_Sep2016_USPTOgrants_smiles.rsmi",
                            "2001_Sep2016_USPTOapplications_smiles.rsmi",
                        ]
                        .into_iter()
                        .map(|file| TableInput::new(file, ReadOptions::tsv()))
                        .collect(),
                        provenance: Some("FileName"),
                        rename: Vec::new(),
                        post: Vec::new(),
                    },
                )
                .with_extracts(seven_zip_all(&archives))
            }
            LIU_50K => Recipe::new(
                version,
                SPLITS
                    .iter()
                    .flat_map(|split| {
                        ["targets", "sources"].map(|side| Fetch::named(format!("{SEQ2SEQ_URL}/{split}_{side}")))
                    })
                    .collect(),
                FormatSpec::PairedColumns {
                    prefixes: SPLITS.to_vec(),
                    left: "targets",
                    right: "sources",
                    prefix_column: "file_name_prefix",
                },
            ),
            COLEY_50K => Recipe::new(
                version,
                vec![Fetch::named(
                    "https://raw.githubusercontent.com/connorcoley/retrosim/master/retrosim/data/data_processed.csv",
                )],
                FormatSpec::passthrough("data_processed.csv", ReadOptions::csv().drop_index_column()),
            ),
            JIN_480K => rexgen_splits(version, "USPTO"),
            SCHWALLER_480K => seq2seq_dataset(
                version,
                SPLITS.map(|split| format!("Jin_USPTO_1product_{split}.txt")),
                ReadOptions::tsv().no_header().skip_rows(1),
                vec![("0", "reaction_smiles")],
            ),
            SCHWALLER_STEREO => seq2seq_dataset(
                version,
                SPLITS.map(|split| format!("US_patents_1976-Sep2016_1product_reactions_{split}.csv")),
                ReadOptions::tsv().skip_rows(2),
                Vec::new(),
            ),
            BRADSHAW_LEF => {
                let archive = "lef_uspto.zip";
                let files = SPLITS.map(|split| format!("filtered_{split}.txt"));
                Recipe::new(
                    version,
                    vec![Fetch::named("https://raw.githubusercontent.com/john-bradshaw/electro/master/lef_uspto.zip")],
                    FormatSpec::tagged(
                        files.clone(),
                        ReadOptions::csv().no_header(),
                        vec![("0", "reaction_smiles")],
                    ),
                )
                .with_extracts(
                    files
                        .iter()
                        .map(|file| ExtractStep::zip_member(archive, format!("lef_uspto/{file}")))
                        .collect(),
                )
            }
            SCHWALLER_1K_TPL => {
                let archive = "MappingChemicalReactions.zip";
                let stems = ["uspto_1k_TPL_train_valid", "uspto_1k_TPL_test"];
                let mut extracts = Vec::with_capacity(stems.len() * 2);
                for stem in stems {
                    extracts.push(ExtractStep::ZipMember {
                        archive: archive.to_string(),
                        member: format!("data_set/{stem}.tsv.gzip"),
                        output: format!("{stem}.tsv.gzip"),
                    });
                }
                for stem in stems {
                    extracts.push(ExtractStep::gunzip_extracted(
                        format!("{stem}.tsv.gzip"),
                        format!("{stem}.tsv"),
                    ));
                }
                Recipe::new(
                    version,
                    vec![Fetch::box_folder("124192222443", "MappingChemicalReactions", archive)],
                    FormatSpec::tagged(
                        stems.map(|stem| format!("{stem}.tsv")),
                        ReadOptions::tsv().drop_index_column(),
                        Vec::new(),
                    ),
                )
                .with_extracts(extracts)
            }
            SCHWALLER_REMAPPED => {
                let archive = "USPTO_remapped.zip";
                let files = [
                    "1976_Sep2016_USPTOgrants_smiles_mapped.tsv",
                    "2001_Sep2016_USPTOapplications_smiles_mapped.tsv",
                ];
                Recipe::new(
                    version,
                    vec![Fetch::box_folder("112951098080", "RXNMapperData", archive)],
                    FormatSpec::tagged(files, ReadOptions::tsv().drop_index_column(), Vec::new()),
                )
                .with_extracts(
                    files
                        .iter()
                        .map(|file| ExtractStep::zip_member(archive, format!("USPTO_remapped/{file}")))
                        .collect(),
                )
            }
            CHEN_FULL => figshare_csv(version, "44192531", "remapped_USPTO_FULL.csv"),
            CHEN_50K => figshare_csv(version, "44192528", "remapped_USPTO_50K.csv"),
            CHEN_MECH_31K => figshare_csv(version, "44708185", "mech-USPTO-31k.csv"),
            _ => return None,
        };
        Some(recipe)
    }
}

fn figshare_fetches(files: &[(&str, &str)]) -> Vec<Fetch> {
    files
        .iter()
        .map(|(id, name)| Fetch::url(figshare_file(id), *name))
        .collect()
}

fn seven_zip_all(files: &[(&str, &str)]) -> Vec<ExtractStep> {
    files
        .iter()
        .map(|(_, name)| ExtractStep::SevenZipAll {
            archive: name.to_string(),
        })
        .collect()
}

fn figshare_csv(version: &str, file_id: &str, file_name: &str) -> Recipe {
    Recipe::new(
        version,
        vec![Fetch::url(figshare_file(file_id), file_name)],
        FormatSpec::passthrough(file_name, ReadOptions::csv()),
    )
}

fn lowe_rsmi_2013() -> Recipe {
    let stems = [
        ("22217829", "1976-2013_USPTOgrants_reactionSmiles_feb2014filters"),
        ("22217826", "2001-2013_USPTOapplications_reactionSmiles_feb2014filters"),
    ];
    let archives: Vec<(&str, String)> = stems
        .iter()
        .map(|(id, stem)| (*id, format!("{stem}.7z")))
        .collect();
    Recipe::new(
        LOWE_2013_RSMI,
        archives
            .iter()
            .map(|(id, name)| Fetch::url(figshare_file(id), name.clone()))
            .collect(),
        FormatSpec::Tables {
            inputs: stems
                .iter()
                .map(|(_, stem)| TableInput::new(format!("{stem}.rsmi"), ReadOptions::tsv().no_header()))
                .collect(),
            provenance: Some("FileName"),
            rename: vec![("0", "ReactionSmiles"), ("1", "PatentNumber"), ("2", "ParagraphNum")],
            post: Vec::new(),
        },
    )
    .with_extracts(
        archives
            .into_iter()
            .map(|(_, archive)| ExtractStep::SevenZipAll { archive })
            .collect(),
    )
}

fn schneider_2014() -> Recipe {
    let archive = "ci5006614_si_002.zip";
    let data = "ChemReactionClassification/data";
    let streams = ["training_test_set_patent_data", "unclassified_reactions_patent_data"];
    let class_names = "names_rTypes_classes_superclasses_training_test_set_patent_data.pkl";
    let mut extracts: Vec<ExtractStep> = streams
        .iter()
        .map(|stream| ExtractStep::zip_member(archive, format!("{data}/{stream}.pkl.gz")))
        .collect();
    extracts.push(ExtractStep::zip_member(archive, format!("{data}/{class_names}")));
    extracts.extend(
        streams
            .iter()
            .map(|stream| {
                ExtractStep::gunzip_extracted(format!("{stream}.pkl.gz"), format!("{stream}.pkl"))
            }),
    );
    Recipe::new(
        SCHNEIDER_2014,
        vec![Fetch::url("https://ndownloader.figstatic.com/files/3848755", archive)],
        FormatSpec::PickledReactions {
            streams: streams.iter().map(|stream| format!("{stream}.pkl")).collect(),
            class_names: class_names.to_string(),
        },
    )
    .with_extracts(extracts)
}

/// `data.zip` of the rexgen repository with tab separated splits.
fn rexgen_splits(version: &str, directory: &str) -> Recipe {
    let files = SPLITS.map(|split| format!("{split}.txt"));
    Recipe::new(
        version,
        vec![Fetch::named(format!("{REXGEN_URL}/{directory}/data.zip"))],
        FormatSpec::tagged(files.clone(), ReadOptions::tsv().no_header(), vec![("0", "reaction_smiles")]),
    )
    .with_extracts(
        files
            .iter()
            .map(|file| ExtractStep::zip_member("data.zip", format!("data/{file}")))
            .collect(),
    )
}

fn seq2seq_dataset(
    version: &str,
    files: [String; 3],
    options: ReadOptions,
    rename: Vec<(&'static str, &'static str)>,
) -> Recipe {
    let archive = "ReactionSeq2Seq_Dataset.zip";
    let extracts = files
        .iter()
        .map(|file| ExtractStep::zip_member(archive, format!("ReactionSeq2Seq_Dataset/{file}")))
        .collect();
    Recipe::new(
        version,
        vec![Fetch::box_folder("40552708120", "ReactionSeq2SeqDataset", archive)],
        FormatSpec::tagged(files, options, rename),
    )
    .with_extracts(extracts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{PROVENANCE_COLUMN, StepInput, UrlSource};
    use assert_matches::assert_matches;

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
        let catalog = Uspto.supported_versions(&Offline).unwrap();
        assert_eq!(catalog.len(), 17);
        for version in catalog.versions() {
            let recipe = Uspto.recipe(version).unwrap();
            assert_eq!(recipe.output_label, version);
            assert!(!recipe.downloads.is_empty(), "{version}");
        }
        assert!(Uspto.recipe("v_unknown").is_none());
    }

    #[test]
    fn bradshaw_cites_the_review_page() {
        let catalog = Uspto.supported_versions(&Offline).unwrap();
        assert_eq!(
            catalog.citation(BRADSHAW_LEF),
            Some("https://openreview.net/forum?id=r1x4BnCqKX")
        );
        assert_eq!(
            catalog.citation(CHEN_50K),
            Some("https://doi.org/10.6084/m9.figshare.25046471.v1")
        );
    }

    #[test]
    fn box_hosted_versions_resolve_at_download_time() {
        let recipe = Uspto.recipe(SCHWALLER_STEREO).unwrap();
        assert_eq!(
            recipe.downloads,
            vec![Fetch::box_folder("40552708120", "ReactionSeq2SeqDataset", "ReactionSeq2Seq_Dataset.zip")]
        );
        assert_matches!(
            &recipe.format,
            FormatSpec::Tables { inputs, provenance: Some(PROVENANCE_COLUMN), .. }
                if inputs[0].options == ReadOptions::tsv().skip_rows(2)
        );
    }

    #[test]
    fn schneider_2014_gunzips_before_unpickling() {
        let recipe = Uspto.recipe(SCHNEIDER_2014).unwrap();
        assert_eq!(recipe.extracts.len(), 5);
        assert_matches!(
            &recipe.extracts[4],
            ExtractStep::Gunzip { from: StepInput::Extracted, archive, output }
                if archive == "unclassified_reactions_patent_data.pkl.gz"
                    && output == "unclassified_reactions_patent_data.pkl"
        );
        assert_matches!(recipe.format, FormatSpec::PickledReactions { streams, .. } if streams.len() == 2);
    }

    #[test]
    fn liu_downloads_six_split_files() {
        let recipe = Uspto.recipe(LIU_50K).unwrap();
        let names: Vec<&str> = recipe.downloads.iter().map(|fetch| fetch.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "train_targets",
                "train_sources",
                "valid_targets",
                "valid_sources",
                "test_targets",
                "test_sources"
            ]
        );
        assert_matches!(&recipe.downloads[0].source, UrlSource::Static(url) if url.ends_with("/processed_data/train_targets"));
    }
}
