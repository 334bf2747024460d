//! Open Reaction Database `Dataset` messages.
//!
//! Only the fields needed to recover reaction SMILES are declared; prost
//! skips every other tag while decoding.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use prost::Message;
use tracing::warn;

use crate::chem::{molecule_smiles, parse_molfile};
use crate::error::DataSourceError;
use crate::formats::map_files;
use crate::fs_util::{open_file, walk_files};
use crate::table::Table;

pub const REACTION_SMILES: i32 = 2;
pub const REACTION_CXSMILES: i32 = 6;

pub const COMPOUND_SMILES: i32 = 2;
pub const COMPOUND_MOLBLOCK: i32 = 4;

pub const ROLE_UNSPECIFIED: i32 = 0;
pub const ROLE_REAGENT: i32 = 2;
pub const ROLE_SOLVENT: i32 = 3;
pub const ROLE_CATALYST: i32 = 4;
pub const ROLE_INTERNAL_STANDARD: i32 = 6;
pub const ROLE_PRODUCT: i32 = 8;

pub const COLUMNS: [&str; 3] = ["dataset_id", "reaction_id", "reaction_smiles"];

#[derive(Clone, PartialEq, Message)]
pub struct Dataset {
    #[prost(message, repeated, tag = "3")]
    pub reactions: Vec<Reaction>,
    #[prost(string, tag = "5")]
    pub dataset_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Reaction {
    #[prost(message, repeated, tag = "1")]
    pub identifiers: Vec<ReactionIdentifier>,
    #[prost(map = "string, message", tag = "2")]
    pub inputs: HashMap<String, ReactionInput>,
    #[prost(message, repeated, tag = "8")]
    pub outcomes: Vec<ReactionOutcome>,
    #[prost(string, tag = "10")]
    pub reaction_id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ReactionIdentifier {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(string, tag = "3")]
    pub value: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ReactionInput {
    #[prost(message, repeated, tag = "1")]
    pub components: Vec<Compound>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Compound {
    #[prost(message, repeated, tag = "1")]
    pub identifiers: Vec<CompoundIdentifier>,
    #[prost(int32, tag = "3")]
    pub reaction_role: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ReactionOutcome {
    #[prost(message, repeated, tag = "3")]
    pub products: Vec<ProductCompound>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProductCompound {
    #[prost(message, repeated, tag = "1")]
    pub identifiers: Vec<CompoundIdentifier>,
    #[prost(int32, tag = "7")]
    pub reaction_role: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct CompoundIdentifier {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(string, tag = "3")]
    pub value: String,
}

/// Rows of one dataset file and the reactions that yielded no SMILES.
#[derive(Debug, Default)]
pub struct DatasetRows {
    pub rows: Vec<Vec<String>>,
    pub skipped: usize,
}

/// Reads a gzip-compressed binary `Dataset` message (`*.pb.gz`).
pub fn read_dataset(path: &Path) -> Result<Dataset, DataSourceError> {
    let mut bytes = Vec::new();
    GzDecoder::new(open_file(path)?)
        .read_to_end(&mut bytes)
        .map_err(|err| DataSourceError::Protobuf(format!("{}: {err}", path.display())))?;
    Dataset::decode(bytes.as_slice())
        .map_err(|err| DataSourceError::Protobuf(format!("{}: {err}", path.display())))
}

/// The reaction SMILES of a reaction. A reaction SMILES (or CXSMILES)
/// identifier wins; otherwise one is assembled from the input components and
/// outcome products. Returns `None` when no reactant or product has a
/// structure.
pub fn reaction_smiles(reaction: &Reaction) -> Option<String> {
    if let Some(identifier) = reaction
        .identifiers
        .iter()
        .find(|identifier| matches!(identifier.r#type, REACTION_SMILES | REACTION_CXSMILES))
    {
        return identifier.value.split_whitespace().next().map(str::to_owned);
    }

    let mut reactants = BTreeSet::new();
    let mut agents = BTreeSet::new();
    let mut products = BTreeSet::new();

    let mut keys: Vec<&String> = reaction.inputs.keys().collect();
    keys.sort();
    for key in keys {
        for component in &reaction.inputs[key].components {
            let Some(smiles) = compound_smiles(&component.identifiers) else {
                continue;
            };
            match component.reaction_role {
                ROLE_REAGENT | ROLE_SOLVENT | ROLE_CATALYST => {
                    agents.insert(smiles);
                }
                ROLE_INTERNAL_STANDARD => {}
                _ => {
                    reactants.insert(smiles);
                }
            }
        }
    }
    for outcome in &reaction.outcomes {
        for product in &outcome.products {
            if !matches!(product.reaction_role, ROLE_PRODUCT | ROLE_UNSPECIFIED) {
                continue;
            }
            if let Some(smiles) = compound_smiles(&product.identifiers) {
                products.insert(smiles);
            }
        }
    }

    if reactants.is_empty() && products.is_empty() {
        return None;
    }
    let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(".");
    Some(format!("{}>{}>{}", join(&reactants), join(&agents), join(&products)))
}

fn compound_smiles(identifiers: &[CompoundIdentifier]) -> Option<String> {
    if let Some(identifier) = identifiers
        .iter()
        .find(|identifier| identifier.r#type == COMPOUND_SMILES)
    {
        return identifier
            .value
            .split_whitespace()
            .next()
            .map(str::to_owned);
    }
    identifiers
        .iter()
        .find(|identifier| identifier.r#type == COMPOUND_MOLBLOCK)
        .and_then(|identifier| parse_molfile(&identifier.value).ok())
        .map(|molecule| molecule_smiles(&molecule))
        .filter(|smiles| !smiles.is_empty())
}

pub fn dataset_rows(dataset: &Dataset) -> DatasetRows {
    let mut rows = DatasetRows::default();
    for reaction in &dataset.reactions {
        match reaction_smiles(reaction) {
            Some(smiles) => rows.rows.push(vec![
                dataset.dataset_id.clone(),
                reaction.reaction_id.clone(),
                smiles,
            ]),
            None => rows.skipped += 1,
        }
    }
    rows
}

/// Decodes every `*.pb.gz` under `root` on `workers` threads. A file that
/// does not decode is logged and counted as one skipped record.
pub fn read_datasets(root: &Path, workers: usize) -> Result<(Table, usize), DataSourceError> {
    let files: Vec<PathBuf> = walk_files(root, ".pb.gz")?;
    let results = map_files(&files, workers, |path| {
        read_dataset(path).map(|dataset| dataset_rows(&dataset))
    })?;

    let mut table = Table::new(COLUMNS);
    let mut skipped = 0;
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(rows) => {
                skipped += rows.skipped;
                for row in rows.rows {
                    table.push_row(row);
                }
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping undecodable dataset");
                skipped += 1;
            }
        }
    }
    Ok((table, skipped))
}
