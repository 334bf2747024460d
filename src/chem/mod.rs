//! Reaction block parsing.

pub mod elements;
pub mod molfile;
pub mod smiles;

pub use molfile::{Atom, Bond, BondOrder, Molecule, Reaction, parse_molfile, parse_rxn_block};
pub use smiles::{molecule_smiles, reaction_smiles};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ChemError(String);

impl ChemError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Turns one `$RXN` record into a reaction string.
pub trait ReactionBlockParser: Send + Sync {
    fn reaction_smiles(&self, block: &str) -> Result<String, ChemError>;
}

/// MDL V2000 `$RXN` blocks written out as reaction SMILES.
#[derive(Debug, Clone, Copy, Default)]
pub struct MdlReactionParser;

impl ReactionBlockParser for MdlReactionParser {
    fn reaction_smiles(&self, block: &str) -> Result<String, ChemError> {
        let reaction = parse_rxn_block(block)?;
        if reaction.reactants.is_empty() && reaction.products.is_empty() {
            return Err(ChemError::new("reaction without reactants or products"));
        }
        Ok(reaction_smiles(&reaction))
    }
}
