use crate::archive::TarCompression;
use crate::domain::{DataSourceId, VersionCatalog};
use crate::error::DataSourceError;
use crate::recipe::{ExtractStep, Fetch, FormatSpec, Recipe};
use crate::table::ReadOptions;
use crate::transfer::Transfer;

use super::{DataSource, doi};

/// (version, zenodo record, archive, flat member)
const RELEASES: [(&str, &str, &str, &str); 4] = [
    (
        "v_release_rr01_rp2_hs",
        "5827427",
        "retrorules_rr01_rp2.tar.gz",
        "retrorules_rr01_rp2/retrorules_rr01_rp2_flat_all.csv",
    ),
    (
        "v_release_rr02_rp2_hs",
        "5828017",
        "retrorules_rr02_rp2_hs.tar.gz",
        "retrorules_rr02_rp2_hs/retrorules_rr02_rp2_flat_all.csv",
    ),
    (
        "v_release_rr02_rp3_hs",
        "5827977",
        "retrorules_rr02_rp3_hs.tar.gz",
        "retrorules_rr02_rp3_hs/retrorules_rr02_flat_all.tsv",
    ),
    (
        "v_release_rr02_rp3_nohs",
        "5827969",
        "retrorules_rr02_rp3_nohs.tar.gz",
        "retrorules_rr02_rp3_nohs/retrorules_rr02_flat_all.tsv",
    ),
];

/// RetroRules flat rule tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetroRules;

impl DataSource for RetroRules {
    fn id(&self) -> DataSourceId {
        DataSourceId::RetroRulesReactionRule
    }

    fn supported_versions(&self, _transfer: &dyn Transfer) -> Result<VersionCatalog, DataSourceError> {
        Ok(RELEASES
            .iter()
            .map(|(version, record, ..)| (*version, doi(&format!("10.5281/zenodo.{record}"))))
            .collect())
    }

    fn recipe(&self, version: &str) -> Option<Recipe> {
        let &(_, record, archive, member) = RELEASES.iter().find(|(name, ..)| *name == version)?;
        let flat = member.rsplit('/').next().unwrap_or(member);
        let options = if flat.ends_with(".tsv") {
            ReadOptions::tsv()
        } else {
            ReadOptions::csv()
        };
        Some(
            Recipe::new(
                version,
                vec![Fetch::named(format!("https://zenodo.org/records/{record}/files/{archive}"))],
                FormatSpec::passthrough(flat, options),
            )
            .with_extracts(vec![ExtractStep::TarMember {
                archive: archive.to_string(),
                compression: TarCompression::Gzip,
                member: member.to_string(),
                output: flat.to_string(),
            }]),
        )
    }
}
