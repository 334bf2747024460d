use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use chem_data_source::config::{Config, ConfigLoader, RunEntry};
use chem_data_source::domain::DataSourceId;
use chem_data_source::error::DataSourceError;

#[test]
fn parse_config_mixed_entries() {
    let config: Config = serde_json::from_str(
        r#"{
            "schema_version": 1,
            "output_directory": "data",
            "workers": 4,
            "runs": [
                "compound:miscellaneous:v_moses_by_20201218_polykovskiy_d_et_al",
                { "category": "reaction", "source": "ord", "version": "v_release_main", "workers": 8 }
            ]
        }"#,
    )
    .unwrap();
    assert_matches!(config.runs[0], RunEntry::Shorthand(_));
    assert_matches!(config.runs[1], RunEntry::Detailed(_));

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.output_directory, Utf8PathBuf::from("data"));
    assert_eq!(resolved.workers, 4);
    assert_eq!(resolved.timeout_secs, None);
    assert_eq!(resolved.runs.len(), 2);
    assert_eq!(resolved.runs[0].id, DataSourceId::MiscellaneousCompound);
    assert_eq!(resolved.runs[1].id, DataSourceId::OrdReaction);
    assert_eq!(resolved.runs[1].version, "v_release_main");
    assert_eq!(resolved.runs[1].workers, Some(8));
}

#[test]
fn unknown_source_fails_eagerly() {
    let config: Config =
        serde_json::from_str(r#"{ "runs": ["reaction_rule:uspto:v_release_1"] }"#).unwrap();
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(DataSourceError::UnknownDataSource { .. })
    );
}

#[test]
fn explicit_path_is_read_and_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.json");
    std::fs::write(&path, r#"{ "runs": ["reaction:rhea:v_release_130"] }"#).unwrap();
    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.runs[0].id, DataSourceId::RheaReaction);

    std::fs::write(&path, "{ not json").unwrap();
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(DataSourceError::ConfigParse(_))
    );
    assert_matches!(
        ConfigLoader::resolve(dir.path().join("absent.json").to_str()),
        Err(DataSourceError::ConfigRead(_))
    );
}
