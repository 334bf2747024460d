use assert_matches::assert_matches;

use chem_data_source::domain::{Category, DataSourceId, Stage, VersionCatalog};
use chem_data_source::error::DataSourceError;

#[test]
fn parse_category_valid() {
    let category: Category = "Reaction_Rule".parse().unwrap();
    assert_eq!(category, Category::ReactionRule);
    assert_eq!(category.to_string(), "reaction_rule");
}

#[test]
fn parse_category_invalid() {
    let err = "enzyme".parse::<Category>().unwrap_err();
    assert_matches!(err, DataSourceError::InvalidCategory(_));
}

#[test]
fn unknown_pair_is_rejected() {
    let err = DataSourceId::resolve(Category::Compound, "uspto").unwrap_err();
    assert_matches!(
        err,
        DataSourceError::UnknownDataSource { ref category, ref name }
            if category == "compound" && name == "uspto"
    );
}

#[test]
fn miscellaneous_exists_in_every_category() {
    let ids: Vec<DataSourceId> = Category::ALL
        .into_iter()
        .map(|category| DataSourceId::resolve(category, "miscellaneous").unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            DataSourceId::MiscellaneousCompound,
            DataSourceId::MiscellaneousReaction,
            DataSourceId::MiscellaneousReactionRule,
        ]
    );
}

#[test]
fn reaction_sources_are_listed_in_order() {
    assert_eq!(
        DataSourceId::names_in(Category::Reaction),
        vec!["crd", "miscellaneous", "ord", "rhea", "uspto"]
    );
}

#[test]
fn identifier_display_and_slug() {
    let id = DataSourceId::RetroRulesReactionRule;
    assert_eq!(id.to_string(), "reaction_rule:retro_rules");
    assert_eq!(id.slug(), "retro_rules");
    assert_eq!(id.label(), "RetroRules chemical reaction rule database");
}

#[test]
fn stage_nouns_match_log_wording() {
    assert_eq!(Stage::Download.noun(), "download");
    assert_eq!(Stage::Extract.noun(), "extraction");
    assert_eq!(Stage::Format.noun(), "formatting");
}

#[test]
fn catalog_membership_and_citations() {
    let mut catalog: VersionCatalog = [("v_b", "https://doi.org/b")].into_iter().collect();
    catalog.insert("v_a", "https://doi.org/a");
    assert!(catalog.contains("v_a"));
    assert!(!catalog.contains("v_c"));
    assert_eq!(catalog.citation("v_b"), Some("https://doi.org/b"));
    assert_eq!(catalog.versions().collect::<Vec<_>>(), vec!["v_a", "v_b"]);
}
